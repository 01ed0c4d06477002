//! The 2D style family. Each style owns its state and implements the shared
//! [`Style`] contract; [`FlatStyle`] is the closed set the visualizer
//! dispatches over.

pub mod bars;
pub mod circular;
pub mod dna;
pub mod galaxy;
pub mod grid;
pub mod particles;
pub mod pulse;
pub mod radial;
pub mod spectrum;
pub mod wave;

use crate::{
    visualizer::{FrameInput, Style},
    ColorPalette, InputEvent, StyleId, Surface, SurfaceSize, VisualizerSettings,
};

pub use bars::Bars;
pub use circular::Circular;
pub use dna::Dna;
pub use galaxy::Galaxy;
pub use grid::Grid;
pub use particles::ParticleField;
pub use pulse::{BeatPhase, Pulse, Ring};
pub use radial::Radial;
pub use spectrum::Spectrum;
pub use wave::Wave;

pub enum FlatStyle {
    Bars(Bars),
    Wave(Wave),
    Circular(Circular),
    Particles(ParticleField),
    Spectrum(Spectrum),
    Galaxy(Galaxy),
    Dna(Dna),
    Pulse(Pulse),
    Grid(Grid),
    Radial(Radial),
}

macro_rules! dispatch {
    ($self:expr, $style:ident => $body:expr) => {
        match $self {
            FlatStyle::Bars($style) => $body,
            FlatStyle::Wave($style) => $body,
            FlatStyle::Circular($style) => $body,
            FlatStyle::Particles($style) => $body,
            FlatStyle::Spectrum($style) => $body,
            FlatStyle::Galaxy($style) => $body,
            FlatStyle::Dna($style) => $body,
            FlatStyle::Pulse($style) => $body,
            FlatStyle::Grid($style) => $body,
            FlatStyle::Radial($style) => $body,
        }
    };
}

impl FlatStyle {
    /// Builds the state for a 2D style. Spatial ids fall back to bars.
    pub fn new(style: StyleId, settings: &VisualizerSettings, size: SurfaceSize) -> Self {
        match style {
            StyleId::Wave => FlatStyle::Wave(Wave::new(settings)),
            StyleId::Circular => FlatStyle::Circular(Circular::new(settings)),
            StyleId::Particles => FlatStyle::Particles(ParticleField::new(settings, size)),
            StyleId::Spectrum => FlatStyle::Spectrum(Spectrum::new(settings)),
            StyleId::Galaxy => FlatStyle::Galaxy(Galaxy::new(settings)),
            StyleId::Dna => FlatStyle::Dna(Dna::new(settings)),
            StyleId::Pulse => FlatStyle::Pulse(Pulse::new(settings, size)),
            StyleId::Grid => FlatStyle::Grid(Grid::new(settings)),
            StyleId::Radial => FlatStyle::Radial(Radial::new(settings)),
            _ => FlatStyle::Bars(Bars::new(settings)),
        }
    }
}

impl Style for FlatStyle {
    fn configure(&mut self, settings: &VisualizerSettings) {
        dispatch!(self, style => style.configure(settings))
    }

    fn resize(&mut self, old: SurfaceSize, new: SurfaceSize) {
        dispatch!(self, style => style.resize(old, new))
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        dispatch!(self, style => style.update(input))
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        dispatch!(self, style => style.draw(surface, palette))
    }

    fn tracked_values(&self) -> Vec<f32> {
        dispatch!(self, style => style.tracked_values())
    }

    fn handle_input(&mut self, event: &InputEvent, now_ms: f64) {
        dispatch!(self, style => style.handle_input(event, now_ms))
    }
}

/// Width of each of `count` bars across `extent` with `gap` between them.
pub(crate) fn bar_width(extent: f32, count: usize, gap: f32) -> f32 {
    let gaps = gap * count.saturating_sub(1) as f32;
    ((extent - gaps) / count.max(1) as f32).max(1.0)
}

/// Fraction `i / (count - 1)`, zero for a single element.
pub(crate) fn fraction(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}
