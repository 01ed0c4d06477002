use std::f32::consts::TAU;

use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const BASE_RADIUS: f32 = 60.0;
const RADIUS_GROWTH: f32 = 140.0;
const SPIN: f32 = 0.02;

#[derive(Debug, Clone, PartialEq)]
struct VortexParams {
    layers: usize,
    segments: usize,
    depth: f32,
    twist: f32,
    smoothing: f32,
    amplification: f32,
}

impl VortexParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            layers: settings.count("layers", 20),
            segments: settings.count("segments", 32).max(3),
            depth: settings.float("depth", 900.0).max(1.0),
            twist: settings.float("twist", 0.15),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Stacked twisted rings receding along z like a whirlpool; the radius of
/// each layer swells with its slice of the spectrum.
#[derive(Debug, Clone)]
pub struct Vortex {
    params: VortexParams,
    values: Vec<f32>,
    spin: f32,
}

impl Vortex {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = VortexParams::from_settings(settings);
        Self {
            values: vec![0.0; params.layers],
            spin: 0.0,
            params,
        }
    }

    pub fn layer(&self, layer: usize) -> Vec<Vec3> {
        let layers = self.values.len();
        let t = fraction(layer, layers);
        let radius = (BASE_RADIUS + t * RADIUS_GROWTH) * (1.0 + self.values[layer] * 0.5);
        let z = (t - 0.5) * self.params.depth;
        let twist = layer as f32 * self.params.twist + self.spin;
        (0..self.params.segments)
            .map(|s| {
                let angle = s as f32 / self.params.segments as f32 * TAU + twist;
                Vec3::new(radius * angle.cos(), radius * angle.sin(), z)
            })
            .collect()
    }
}

impl Shape for Vortex {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = VortexParams::from_settings(settings);
        self.values.resize(self.params.layers, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(i, count)) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
        self.spin = (self.spin + SPIN * (1.0 + input.average * 2.0) * input.step()) % TAU;
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let layers = self.values.len();
        for layer in 0..layers {
            let lit = self.values[layer].clamp(0.0, 1.0);
            let color = palette.gradient(fraction(layer, layers)).with_alpha(0.3 + lit * 0.7);
            batch.polygon(view, &self.layer(layer), None, Some((1.0 + lit * 2.0, color)));
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::tests::tick_shape;

    #[test]
    fn layers_widen_with_depth_and_energy() {
        let settings = VisualizerSettings::new().with("layers", 3).with("smoothing", 0.0);
        let mut vortex = Vortex::new(&settings);
        let radius = |v: &Vortex, layer: usize| v.layer(layer)[0].truncate().length();

        assert!((radius(&vortex, 0) - BASE_RADIUS).abs() < 1e-3);
        assert!((radius(&vortex, 2) - (BASE_RADIUS + RADIUS_GROWTH)).abs() < 1e-3);

        tick_shape(&mut vortex, 255, 0.0);
        assert!((radius(&vortex, 0) - BASE_RADIUS * 1.5).abs() < 1e-3);
    }

    #[test]
    fn layer_count_follows_settings() {
        let mut vortex = Vortex::new(&VisualizerSettings::new());
        vortex.configure(&VisualizerSettings::new().with("layers", 7).with("segments", 5));
        assert_eq!(vortex.tracked_values().len(), 7);
        assert_eq!(vortex.layer(6).len(), 5);
    }
}
