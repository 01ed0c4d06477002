use std::f32::consts::TAU;

use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const SEED: u64 = 0x0e_b01a;
const FIELD: f32 = 220.0;
const SWELL: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
struct NebulaParams {
    clouds: usize,
    per_cloud: usize,
    cloud_radius: f32,
    glow_radius: f32,
    smoothing: f32,
    amplification: f32,
}

impl NebulaParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            clouds: settings.count("cloudCount", 6),
            per_cloud: settings.count("particlesPerCloud", 80),
            cloud_radius: settings.float("cloudRadius", 90.0).max(1.0),
            glow_radius: settings.float("glowRadius", 3.0).max(0.1),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Cloud {
    center: Vec3,
    /// Offsets within the unit cube, scaled by the cloud radius.
    offsets: Vec<Vec3>,
}

/// Glowing gas clouds; each breathes with one slice of the spectrum.
#[derive(Debug, Clone)]
pub struct Nebula {
    params: NebulaParams,
    clouds: Vec<Cloud>,
    intensity: Vec<f32>,
}

impl Nebula {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = NebulaParams::from_settings(settings);
        let clouds = generate(&params);
        Self {
            intensity: vec![0.0; clouds.len()],
            clouds,
            params,
        }
    }

    pub fn intensity(&self) -> &[f32] {
        &self.intensity
    }
}

fn generate(params: &NebulaParams) -> Vec<Cloud> {
    let mut rng = fastrand::Rng::with_seed(SEED);
    (0..params.clouds)
        .map(|i| {
            let angle = i as f32 / params.clouds as f32 * TAU;
            let center = Vec3::new(
                angle.cos() * FIELD * (0.4 + rng.f32() * 0.6),
                (rng.f32() - 0.5) * FIELD * 0.5,
                angle.sin() * FIELD * (0.4 + rng.f32() * 0.6),
            );
            let offsets = (0..params.per_cloud)
                .map(|_| {
                    // sum of uniforms clusters points toward the middle
                    let mut axis = || (rng.f32() + rng.f32() + rng.f32()) / 1.5 - 1.0;
                    Vec3::new(axis(), axis(), axis())
                })
                .collect();
            Cloud { center, offsets }
        })
        .collect()
}

impl Shape for Nebula {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = NebulaParams::from_settings(settings);
        if params.clouds != self.params.clouds || params.per_cloud != self.params.per_cloud {
            self.clouds = generate(&params);
            self.intensity = vec![0.0; self.clouds.len()];
        }
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.intensity.len();
        for (i, value) in self.intensity.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(i, count)) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        for (index, (cloud, intensity)) in self.clouds.iter().zip(&self.intensity).enumerate() {
            let lit = intensity.clamp(0.0, 1.0);
            let radius = self.params.cloud_radius * (1.0 + lit * SWELL);
            let color = palette.color_alpha(index, 0.2 + lit * 0.8);
            for offset in &cloud.offsets {
                batch.point(view, cloud.center + *offset * radius, self.params.glow_radius * (1.0 + lit * 2.0), color);
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.intensity.clone()
    }
}
