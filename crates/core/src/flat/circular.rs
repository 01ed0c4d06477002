use std::f32::consts::{PI, TAU};

use crate::{
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Surface, VisualizerSettings,
};

const LAYER_SPREAD: f32 = 0.2;
const REACH: f32 = 0.6;
const REACTIVE_GAIN: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
struct CircularParams {
    segments: usize,
    layers: usize,
    radius: f32,
    rotate: bool,
    rotation_speed: f32,
    reactive_rotation: bool,
    line_width: f32,
    smoothing: f32,
    amplification: f32,
}

impl CircularParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            segments: settings.count("segments", 128).max(3),
            layers: settings.count("layers", 3),
            radius: settings.float("radius", 0.25).max(0.0),
            rotate: settings.boolean("rotate", true),
            rotation_speed: settings.float("rotationSpeed", 0.005),
            reactive_rotation: settings.boolean("reactiveRotation", true),
            line_width: settings.float("lineWidth", 2.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Concentric closed rings displaced outward by the spectrum.
#[derive(Debug, Clone)]
pub struct Circular {
    params: CircularParams,
    values: Vec<f32>,
    rotation: f32,
}

impl Circular {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = CircularParams::from_settings(settings);
        Self {
            values: vec![0.0; params.segments],
            rotation: 0.0,
            params,
        }
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }
}

impl Style for Circular {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = CircularParams::from_settings(settings);
        self.values.resize(self.params.segments, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let segments = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, segments) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }

        if self.params.rotate {
            let boost = if self.params.reactive_rotation {
                1.0 + input.average * REACTIVE_GAIN
            } else {
                1.0
            };
            self.rotation = (self.rotation + self.params.rotation_speed * boost * input.step()) % TAU;
        }
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let center = size.center();
        let base = self.params.radius * size.min_dim();
        let segments = self.values.len();

        for layer in 0..self.params.layers {
            let layer_radius = base * (1.0 + layer as f32 * LAYER_SPREAD);
            let phase = layer as f32 * PI / self.params.layers as f32;
            let points: Vec<_> = self
                .values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let angle = i as f32 / segments as f32 * TAU + self.rotation + phase;
                    center.polar(layer_radius + value * base * REACH, angle)
                })
                .collect();
            let alpha = (1.0 - layer as f32 * 0.25).max(0.2);
            surface.stroke_path(&points, true, self.params.line_width, palette.color_alpha(layer, alpha));
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}
