use std::f32::consts::TAU;

use glam::{Mat3, Vec3};

use crate::{
    flat::fraction,
    spatial::{DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const SEED: u64 = 0x6a1a_3d00;
/// Radial bands the disc is lit by.
const BANDS: usize = 24;
const SPIN: f32 = 0.002;
const STAR_SIZE: f32 = 1.2;

#[derive(Debug, Clone, PartialEq)]
struct Galaxy3dParams {
    arms: usize,
    stars: usize,
    radius: f32,
    thickness: f32,
    twist: f32,
    smoothing: f32,
    amplification: f32,
}

impl Galaxy3dParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            arms: settings.count("arms", 4),
            stars: settings.count("starCount", 800),
            radius: settings.float("radius", 320.0).max(1.0),
            thickness: settings.float("thickness", 20.0).max(0.0),
            twist: settings.float("twist", 2.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Star {
    position: Vec3,
    arm: usize,
    band: usize,
}

/// A flattened spiral disc of stars. Stars are lit by the radial band they
/// sit in, inner bands following the low bins.
#[derive(Debug, Clone)]
pub struct Galaxy3d {
    params: Galaxy3dParams,
    stars: Vec<Star>,
    bands: Vec<f32>,
    spin: f32,
}

impl Galaxy3d {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = Galaxy3dParams::from_settings(settings);
        Self {
            stars: generate(&params),
            bands: vec![0.0; BANDS],
            spin: 0.0,
            params,
        }
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let rotation = Mat3::from_rotation_y(self.spin);
        self.stars.iter().map(move |star| rotation * star.position)
    }
}

fn generate(params: &Galaxy3dParams) -> Vec<Star> {
    let mut rng = fastrand::Rng::with_seed(SEED);
    (0..params.stars)
        .map(|i| {
            let arm = i % params.arms;
            let t = rng.f32().sqrt();
            let angle = arm as f32 / params.arms as f32 * TAU + t * params.twist * TAU / 2.0
                + (rng.f32() - 0.5) * 0.4;
            let radius = t * params.radius;
            // the disc thins toward the rim
            let height = (rng.f32() - 0.5) * 2.0 * params.thickness * (1.0 - t * 0.7);
            Star {
                position: Vec3::new(radius * angle.cos(), height, radius * angle.sin()),
                arm,
                band: ((t * BANDS as f32) as usize).min(BANDS - 1),
            }
        })
        .collect()
}

impl Shape for Galaxy3d {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = Galaxy3dParams::from_settings(settings);
        if params != self.params {
            self.stars = generate(&params);
        }
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        for (i, band) in self.bands.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(i, BANDS)) * self.params.amplification;
            *band = smooth(*band, target, self.params.smoothing);
        }
        self.spin = (self.spin + SPIN * (1.0 + input.average * 3.0) * input.step()) % TAU;
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        for (star, position) in self.stars.iter().zip(self.positions()) {
            let lit = self.bands[star.band].clamp(0.0, 1.0);
            batch.point(
                view,
                position,
                STAR_SIZE * (1.0 + lit * 1.5),
                palette.color_alpha(star.arm, 0.2 + lit * 0.8),
            );
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.bands.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::tests::tick_shape;

    #[test]
    fn stars_stay_within_the_disc() {
        let settings = VisualizerSettings::new()
            .with("starCount", 200)
            .with("radius", 100)
            .with("thickness", 10);
        let galaxy = Galaxy3d::new(&settings);
        assert_eq!(galaxy.star_count(), 200);
        assert!(galaxy.positions().all(|p| {
            Vec3::new(p.x, 0.0, p.z).length() <= 100.0 + 1e-3 && p.y.abs() <= 10.0
        }));
    }

    #[test]
    fn generation_is_seeded_and_regenerates_on_change() {
        let settings = VisualizerSettings::new().with("starCount", 50);
        let a = Galaxy3d::new(&settings);
        let mut b = Galaxy3d::new(&settings);
        assert_eq!(a.stars, b.stars);

        b.configure(&settings.clone().with("starCount", 60));
        assert_eq!(b.star_count(), 60);
    }

    #[test]
    fn spin_speeds_up_with_energy() {
        let mut quiet = Galaxy3d::new(&VisualizerSettings::new());
        let mut loud = Galaxy3d::new(&VisualizerSettings::new());
        tick_shape(&mut quiet, 0, 0.0);
        tick_shape(&mut loud, 255, 0.0);
        assert!((quiet.spin - SPIN).abs() < 1e-6);
        assert!((loud.spin - SPIN * 4.0).abs() < 1e-6);
    }
}
