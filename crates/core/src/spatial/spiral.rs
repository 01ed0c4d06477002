use std::f32::consts::TAU;

use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{geometry::ring_point, DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const TURNS: f32 = 2.0;
const TWIST_SPEED: f32 = 0.01;
const FLARE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
struct SpiralParams {
    arms: usize,
    points: usize,
    height: f32,
    radius: f32,
    smoothing: f32,
    amplification: f32,
}

impl SpiralParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            arms: settings.count("arms", 3),
            points: settings.count("pointsPerArm", 80).max(2),
            height: settings.float("height", 300.0),
            radius: settings.float("radius", 120.0).max(1.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Helical arms climbing a cone; point `j` on every arm flares with the
/// bin at the same height.
#[derive(Debug, Clone)]
pub struct Spiral {
    params: SpiralParams,
    values: Vec<f32>,
    phase: f32,
}

impl Spiral {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = SpiralParams::from_settings(settings);
        Self {
            values: vec![0.0; params.points],
            phase: 0.0,
            params,
        }
    }

    pub fn arm(&self, arm: usize) -> Vec<Vec3> {
        let offset = arm as f32 / self.params.arms as f32 * TAU;
        let count = self.values.len();
        self.values
            .iter()
            .enumerate()
            .map(|(j, value)| {
                let t = fraction(j, count);
                let angle = offset + t * TURNS * TAU + self.phase;
                let radius = self.params.radius * (0.3 + 0.7 * t) * (1.0 + value * FLARE);
                ring_point(radius, angle, (t - 0.5) * self.params.height)
            })
            .collect()
    }
}

impl Shape for Spiral {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = SpiralParams::from_settings(settings);
        self.values.resize(self.params.points, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (j, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(j, count)) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
        self.phase = (self.phase + TWIST_SPEED * (1.0 + input.average) * input.step()) % TAU;
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        for arm in 0..self.params.arms {
            let points = self.arm(arm);
            for (j, pair) in points.windows(2).enumerate() {
                let lit = self.values[j].clamp(0.0, 1.0);
                batch.line(view, pair[0], pair[1], 1.5 + lit * 2.0, palette.color_alpha(arm, 0.5 + lit * 0.5));
            }
            for (point, value) in points.iter().zip(&self.values) {
                batch.point(view, *point, 1.5 + value.clamp(0.0, 1.0) * 3.0, palette.color(arm));
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}
