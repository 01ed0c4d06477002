use std::f32::consts::{PI, TAU};

use crate::{
    flat::fraction,
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Point, Surface, VisualizerSettings,
};

/// Fraction of the shorter side the longest wedge may reach.
const REACH: f32 = 0.48;
/// Arc points per wedge edge.
const ARC_STEPS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
struct RadialParams {
    segments: usize,
    inner_radius: f32,
    mirror: bool,
    spiral: bool,
    spiral_factor: f32,
    gap_ratio: f32,
    smoothing: f32,
    amplification: f32,
}

impl RadialParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            segments: settings.count("segments", 64),
            inner_radius: settings.float("innerRadius", 0.15).clamp(0.0, REACH),
            mirror: settings.boolean("mirror", false),
            spiral: settings.boolean("spiral", false),
            spiral_factor: settings.float("spiralFactor", 0.5),
            gap_ratio: settings.float("gapRatio", 0.1).clamp(0.0, 0.95),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Filled wedges around a hole; the outer edge of wedge `i` tracks bin `i`.
///
/// Mirrored, the wedges cover one half turn and are reflected onto the
/// other. With `spiral` on, later wedges reach further out.
#[derive(Debug, Clone)]
pub struct Radial {
    params: RadialParams,
    values: Vec<f32>,
}

impl Radial {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = RadialParams::from_settings(settings);
        Self {
            values: vec![0.0; params.segments],
            params,
        }
    }

    /// Angular span shared by the wedges.
    fn span(&self) -> f32 {
        if self.params.mirror {
            PI
        } else {
            TAU
        }
    }

    /// Outer radius of wedge `index` as a fraction of the shorter side.
    pub fn outer_radius(&self, index: usize) -> f32 {
        let inner = self.params.inner_radius;
        let mut reach = self.values[index].clamp(0.0, 1.0) * (REACH - inner);
        if self.params.spiral {
            reach *= 1.0 + self.params.spiral_factor * fraction(index, self.values.len());
        }
        inner + reach
    }

    fn wedge(&self, center: Point, scale: f32, index: usize, flip: bool) -> Vec<Point> {
        let slot = self.span() / self.values.len() as f32;
        let width = slot * (1.0 - self.params.gap_ratio);
        let start = index as f32 * slot - PI / 2.0;
        let inner = self.params.inner_radius * scale;
        let outer = self.outer_radius(index) * scale;
        let at = |radius: f32, angle: f32| {
            let angle = if flip { PI - angle } else { angle };
            center.polar(radius, angle)
        };

        let step = |k: usize| start + width * k as f32 / ARC_STEPS as f32;
        let outer_arc = (0..=ARC_STEPS).map(|k| at(outer, step(k)));
        let inner_arc = (0..=ARC_STEPS).rev().map(|k| at(inner, step(k)));
        outer_arc.chain(inner_arc).collect()
    }
}

impl Style for Radial {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = RadialParams::from_settings(settings);
        self.values.resize(self.params.segments, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let center = size.center();
        let scale = size.min_dim();
        let count = self.values.len();

        for (i, value) in self.values.iter().enumerate() {
            let color = palette
                .gradient(fraction(i, count))
                .with_alpha(0.5 + value.clamp(0.0, 1.0) * 0.5);
            surface.fill_path(&self.wedge(center, scale, i, false), color);
            if self.params.mirror {
                surface.fill_path(&self.wedge(center, scale, i, true), color);
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}
