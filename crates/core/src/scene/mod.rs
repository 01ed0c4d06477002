use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::VisualiserError;

/// Whether a style draws flat shapes or camera-projected geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Flat,
    Spatial,
}

/// Closed set of visual styles the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleId {
    Bars,
    Wave,
    Circular,
    Particles,
    Spectrum,
    Galaxy,
    Dna,
    Pulse,
    Grid,
    Radial,
    Bars3d,
    Terrain,
    Sphere,
    WaveformRings,
    Particles3d,
    Nebula,
    Spiral,
    Vortex,
    CubeGrid,
    Equalizer,
    Tunnel,
    Audioscape,
    Galaxy3d,
}

impl StyleId {
    pub const ALL: &'static [StyleId] = &[
        StyleId::Bars,
        StyleId::Wave,
        StyleId::Circular,
        StyleId::Particles,
        StyleId::Spectrum,
        StyleId::Galaxy,
        StyleId::Dna,
        StyleId::Pulse,
        StyleId::Grid,
        StyleId::Radial,
        StyleId::Bars3d,
        StyleId::Terrain,
        StyleId::Sphere,
        StyleId::WaveformRings,
        StyleId::Particles3d,
        StyleId::Nebula,
        StyleId::Spiral,
        StyleId::Vortex,
        StyleId::CubeGrid,
        StyleId::Equalizer,
        StyleId::Tunnel,
        StyleId::Audioscape,
        StyleId::Galaxy3d,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleId::Bars => "bars",
            StyleId::Wave => "wave",
            StyleId::Circular => "circular",
            StyleId::Particles => "particles",
            StyleId::Spectrum => "spectrum",
            StyleId::Galaxy => "galaxy",
            StyleId::Dna => "dna",
            StyleId::Pulse => "pulse",
            StyleId::Grid => "grid",
            StyleId::Radial => "radial",
            StyleId::Bars3d => "bars3d",
            StyleId::Terrain => "terrain",
            StyleId::Sphere => "sphere",
            StyleId::WaveformRings => "waveform-rings",
            StyleId::Particles3d => "particles3d",
            StyleId::Nebula => "nebula",
            StyleId::Spiral => "spiral",
            StyleId::Vortex => "vortex",
            StyleId::CubeGrid => "cube-grid",
            StyleId::Equalizer => "equalizer",
            StyleId::Tunnel => "tunnel",
            StyleId::Audioscape => "audioscape",
            StyleId::Galaxy3d => "galaxy3d",
        }
    }

    pub fn dimension(self) -> Dimension {
        match self {
            StyleId::Bars
            | StyleId::Wave
            | StyleId::Circular
            | StyleId::Particles
            | StyleId::Spectrum
            | StyleId::Galaxy
            | StyleId::Dna
            | StyleId::Pulse
            | StyleId::Grid
            | StyleId::Radial => Dimension::Flat,
            _ => Dimension::Spatial,
        }
    }

    pub fn is_spatial(self) -> bool {
        self.dimension() == Dimension::Spatial
    }

    /// Looks `name` up, falling back to the default style of the dimension
    /// the name suggests when it is unknown.
    pub fn resolve(name: &str) -> (StyleId, Option<VisualiserError>) {
        match name.parse() {
            Ok(style) => (style, None),
            Err(err) => {
                let lowered = name.to_ascii_lowercase();
                let fallback = if lowered.contains("3d") {
                    StyleId::Bars3d
                } else {
                    StyleId::Bars
                };
                (fallback, Some(err))
            }
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleId {
    type Err = VisualiserError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('_', "-");
        StyleId::ALL
            .iter()
            .copied()
            .find(|style| style.name() == wanted || style.name().replace('-', "") == wanted)
            .ok_or_else(|| VisualiserError::StyleNotFound(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for style in StyleId::ALL {
            assert_eq!(style.name().parse::<StyleId>().unwrap(), *style);
        }
        assert_eq!("cubegrid".parse::<StyleId>().unwrap(), StyleId::CubeGrid);
        assert_eq!("Waveform_Rings".parse::<StyleId>().unwrap(), StyleId::WaveformRings);
    }

    #[test]
    fn unknown_styles_fall_back_by_dimension() {
        let (style, err) = StyleId::resolve("lasers");
        assert_eq!(style, StyleId::Bars);
        assert!(matches!(err, Some(VisualiserError::StyleNotFound(name)) if name == "lasers"));

        let (style, err) = StyleId::resolve("lasers3d");
        assert_eq!(style, StyleId::Bars3d);
        assert!(err.is_some());
    }

    #[test]
    fn family_sizes() {
        let flat = StyleId::ALL.iter().filter(|s| !s.is_spatial()).count();
        assert_eq!(flat, 10);
        assert_eq!(StyleId::ALL.len() - flat, 13);
    }
}
