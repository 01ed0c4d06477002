//! Flat, style-scoped visualizer settings.
//!
//! Each style publishes a default table; host overrides are overlaid on it and
//! keys the style does not declare are dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Result, StyleId, VisualiserError};

/// Upper bound for any smoothing coefficient.
pub const MAX_SMOOTHING: f32 = 0.95;

/// One setting value. Numbers cover both counts and factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    fn same_kind(&self, other: &SettingValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn kind(&self) -> &'static str {
        match self {
            SettingValue::Flag(_) => "flag",
            SettingValue::Number(_) => "number",
            SettingValue::Text(_) => "text",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for SettingValue {
    fn from(value: f32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualizerSettings {
    values: BTreeMap<String, SettingValue>,
}

impl VisualizerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            SettingValue::Number(value) => Some(*value),
            SettingValue::Flag(value) => Some(if *value { 1.0 } else { 0.0 }),
            SettingValue::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            SettingValue::Flag(value) => Some(*value),
            SettingValue::Number(value) => Some(*value != 0.0),
            SettingValue::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            SettingValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn float(&self, key: &str, fallback: f32) -> f32 {
        self.number(key)
            .filter(|value| value.is_finite())
            .map(|value| value as f32)
            .unwrap_or(fallback)
    }

    /// A count setting; never below one.
    pub fn count(&self, key: &str, fallback: usize) -> usize {
        self.number(key)
            .filter(|value| value.is_finite())
            .map(|value| value.round().max(1.0) as usize)
            .unwrap_or(fallback)
            .max(1)
    }

    pub fn boolean(&self, key: &str, fallback: bool) -> bool {
        self.flag(key).unwrap_or(fallback)
    }

    pub fn string<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.text(key).unwrap_or(fallback)
    }

    /// The smoothing coefficient, clamped to `[0, MAX_SMOOTHING]`.
    pub fn smoothing(&self) -> f32 {
        self.float("smoothing", 0.8).clamp(0.0, MAX_SMOOTHING)
    }

    pub fn amplification(&self) -> f32 {
        self.float("amplification", 1.0).max(0.0)
    }

    /// Overlays `overrides` on `defaults`, keeping only keys the defaults
    /// declare with a value of the same kind.
    pub fn overlay(defaults: &VisualizerSettings, overrides: &VisualizerSettings) -> Self {
        let mut merged = defaults.clone();
        for (key, value) in &overrides.values {
            match defaults.values.get(key) {
                Some(default) if default.same_kind(value) => {
                    merged.values.insert(key.clone(), value.clone());
                }
                Some(default) => {
                    tracing::warn!(
                        key = key.as_str(),
                        expected = default.kind(),
                        found = value.kind(),
                        "setting has the wrong kind; keeping default"
                    );
                }
                None => tracing::debug!(key = key.as_str(), "ignoring setting unknown to style"),
            }
        }
        merged
    }

    /// Applies a single override against the style's defaults.
    ///
    /// Returns `Ok(false)` for keys the style does not declare.
    pub fn update(
        &mut self,
        defaults: &VisualizerSettings,
        key: &str,
        value: SettingValue,
    ) -> Result<bool> {
        let Some(default) = defaults.values.get(key) else {
            tracing::debug!(key, "ignoring setting unknown to style");
            return Ok(false);
        };
        if !default.same_kind(&value) {
            return Err(VisualiserError::InvalidSetting {
                key: key.to_string(),
                reason: format!("expected {}, found {}", default.kind(), value.kind()),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(true)
    }
}

fn common() -> VisualizerSettings {
    VisualizerSettings::new()
        .with("smoothing", 0.8)
        .with("amplification", 1.0)
}

fn spatial_common() -> VisualizerSettings {
    common()
        .with("fov", 60)
        .with("cameraDistance", 600)
        .with("autoRotate", true)
        .with("rotationSpeed", 0.3)
        .with("interactiveMode", false)
        .with("cameraTilt", 0.35)
}

/// The full default table for `style`, common keys included.
pub fn defaults_for(style: StyleId) -> VisualizerSettings {
    use StyleId::*;

    match style {
        Bars => common()
            .with("barCount", 64)
            .with("barGap", 2)
            .with("mirror", false)
            .with("cap", true)
            .with("capHeight", 3)
            .with("capDropSpeed", 0.005)
            .with("glow", false),
        Wave => common()
            .with("pointCount", 256)
            .with("lineWidth", 2)
            .with("trailLength", 5)
            .with("fill", false)
            .with("mirror", false),
        Circular => common()
            .with("segments", 128)
            .with("layers", 3)
            .with("radius", 0.25)
            .with("rotate", true)
            .with("rotationSpeed", 0.005)
            .with("reactiveRotation", true)
            .with("lineWidth", 2),
        Particles => common()
            .with("particleCount", 150)
            .with("particleSize", 2)
            .with("speed", 1)
            .with("turbulence", true)
            .with("turbulenceStrength", 0.5)
            .with("gravity", 0)
            .with("attraction", 0.02)
            .with("friction", 0.98)
            .with("connections", true)
            .with("connectionDistance", 100),
        Spectrum => common()
            .with("bands", 32)
            .with("logScale", true)
            .with("peakHold", true)
            .with("peakHoldTime", 500)
            .with("peakDecay", 0.01)
            .with("barGap", 2),
        Galaxy => common()
            .with("arms", 4)
            .with("starCount", 600)
            .with("twist", 1.5)
            .with("rotationSpeed", 0.002)
            .with("starSize", 1.5),
        Dna => common()
            .with("points", 40)
            .with("frequency", 2)
            .with("crossLinkEvery", 4)
            .with("speed", 0.02)
            .with("strandWidth", 3),
        Pulse => common()
            .with("sensitivity", 0.6)
            .with("beatThreshold", 1.3)
            .with("minInterval", 100)
            .with("maxRings", 10)
            .with("ringSpeed", 5)
            .with("fadeSpeed", 0.02)
            .with("historySize", 30)
            .with("coreSize", 0.08),
        Grid => common()
            .with("gridSize", 20)
            .with("rotationSpeed", 0.003)
            .with("tilt", 0.9)
            .with("heightScale", 60),
        Radial => common()
            .with("segments", 64)
            .with("innerRadius", 0.15)
            .with("mirror", false)
            .with("spiral", false)
            .with("spiralFactor", 0.5)
            .with("gapRatio", 0.1),
        Bars3d => spatial_common()
            .with("gridSize", 8)
            .with("barSize", 30)
            .with("spacing", 45)
            .with("heightScale", 200),
        Terrain => spatial_common()
            .with("rows", 32)
            .with("columns", 48)
            .with("cellSize", 14)
            .with("heightScale", 120),
        Sphere => spatial_common()
            .with("pointCount", 400)
            .with("radius", 150)
            .with("displacement", 80)
            .with("pointSize", 2.5),
        WaveformRings => spatial_common()
            .with("ringCount", 12)
            .with("segments", 96)
            .with("ringSpacing", 18)
            .with("waveHeight", 60),
        Particles3d => spatial_common()
            .with("particleCount", 300)
            .with("bounds", 250)
            .with("burst", 4),
        Nebula => spatial_common()
            .with("cloudCount", 6)
            .with("particlesPerCloud", 80)
            .with("cloudRadius", 90)
            .with("glowRadius", 3),
        Spiral => spatial_common()
            .with("arms", 3)
            .with("pointsPerArm", 80)
            .with("height", 300)
            .with("radius", 120),
        Vortex => spatial_common()
            .with("layers", 20)
            .with("segments", 32)
            .with("depth", 900)
            .with("twist", 0.15),
        CubeGrid => spatial_common()
            .with("gridSize", 5)
            .with("spacing", 70)
            .with("cubeSize", 30),
        Equalizer => spatial_common()
            .with("layout", "circular")
            .with("bandCount", 32)
            .with("barSize", 18)
            .with("heightScale", 220)
            .with("radius", 220),
        Tunnel => spatial_common()
            .with("segments", 24)
            .with("sides", 16)
            .with("spacing", 60)
            .with("radius", 150)
            .with("speed", 4),
        Audioscape => spatial_common()
            .with("rows", 24)
            .with("columns", 40)
            .with("cellSize", 18)
            .with("heightScale", 160),
        Galaxy3d => spatial_common()
            .with("arms", 4)
            .with("starCount", 800)
            .with("radius", 320)
            .with("thickness", 20)
            .with("twist", 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_drops_unknown_and_mismatched_keys() {
        let defaults = defaults_for(StyleId::Bars);
        let host = VisualizerSettings::new()
            .with("barCount", 4)
            .with("beatThreshold", 2.0)
            .with("mirror", "yes");

        let merged = VisualizerSettings::overlay(&defaults, &host);

        assert_eq!(merged.count("barCount", 0), 4);
        assert!(!merged.contains("beatThreshold"));
        assert_eq!(merged.flag("mirror"), Some(false));
    }

    #[test]
    fn smoothing_is_clamped() {
        let settings = VisualizerSettings::new().with("smoothing", 1.5);
        assert_eq!(settings.smoothing(), MAX_SMOOTHING);

        let settings = VisualizerSettings::new().with("smoothing", -1.0);
        assert_eq!(settings.smoothing(), 0.0);
    }

    #[test]
    fn update_reports_unknown_keys_and_kind_errors() {
        let defaults = defaults_for(StyleId::Pulse);
        let mut settings = defaults.clone();

        assert!(!settings.update(&defaults, "barCount", 4.into()).unwrap());
        assert!(settings.update(&defaults, "maxRings", 3.into()).unwrap());
        assert_eq!(settings.count("maxRings", 0), 3);
        assert!(settings.update(&defaults, "maxRings", true.into()).is_err());
    }

    #[test]
    fn every_style_declares_common_keys() {
        for style in StyleId::ALL {
            let defaults = defaults_for(*style);
            assert!(defaults.contains("smoothing"), "{style}");
            assert!(defaults.contains("amplification"), "{style}");
            if style.is_spatial() {
                assert!(defaults.contains("interactiveMode"), "{style}");
            }
        }
    }

    #[test]
    fn counts_never_drop_below_one() {
        let settings = VisualizerSettings::new().with("barCount", 0);
        assert_eq!(settings.count("barCount", 64), 1);
    }

    #[test]
    fn deserializes_mixed_values() {
        let settings: VisualizerSettings =
            serde_json::from_str(r#"{"a": 1, "b": true, "c": "grid"}"#).unwrap();
        assert_eq!(settings.number("a"), Some(1.0));
        assert_eq!(settings.flag("b"), Some(true));
        assert_eq!(settings.text("c"), Some("grid"));
    }
}
