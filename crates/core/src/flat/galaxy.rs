use std::f32::consts::TAU;

use crate::{
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Surface, VisualizerSettings,
};

const SEED: u64 = 0x9a1a_c7e5;
const REACTIVE_GAIN: f32 = 3.0;
const EXTENT: f32 = 0.45;
const BASE_ALPHA: f32 = 0.15;

#[derive(Debug, Clone, PartialEq)]
struct GalaxyParams {
    arms: usize,
    stars: usize,
    twist: f32,
    rotation_speed: f32,
    star_size: f32,
    smoothing: f32,
    amplification: f32,
}

impl GalaxyParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            arms: settings.count("arms", 4),
            stars: settings.count("starCount", 600),
            twist: settings.float("twist", 1.5),
            rotation_speed: settings.float("rotationSpeed", 0.002),
            star_size: settings.float("starSize", 1.5).max(0.1),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// A star in normalised galaxy coordinates. `t` is the distance along the
/// arm in `[0, 1]` and also picks the frequency bin driving the star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub arm: usize,
    pub t: f32,
    pub angle_offset: f32,
    pub spread: f32,
    pub size: f32,
}

/// Stars scattered along spiral arms, lit by the bin nearest their distance.
#[derive(Debug, Clone)]
pub struct Galaxy {
    params: GalaxyParams,
    stars: Vec<Star>,
    brightness: Vec<f32>,
    rotation: f32,
}

impl Galaxy {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = GalaxyParams::from_settings(settings);
        let stars = generate(&params);
        Self {
            brightness: vec![0.0; stars.len()],
            stars,
            rotation: 0.0,
            params,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }
}

fn generate(params: &GalaxyParams) -> Vec<Star> {
    let mut rng = fastrand::Rng::with_seed(SEED);
    (0..params.stars)
        .map(|i| {
            let t = rng.f32().sqrt();
            Star {
                arm: i % params.arms,
                t,
                angle_offset: (rng.f32() - 0.5) * 0.5,
                spread: (rng.f32() - 0.5) * 0.08 * (1.0 - t * 0.5),
                size: 0.5 + rng.f32(),
            }
        })
        .collect()
}

impl Style for Galaxy {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = GalaxyParams::from_settings(settings);
        if params.arms != self.params.arms || params.stars != self.params.stars {
            self.stars = generate(&params);
            self.brightness = vec![0.0; self.stars.len()];
        }
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        for (star, brightness) in self.stars.iter().zip(self.brightness.iter_mut()) {
            let target = input.frequency.at_fraction(star.t) * self.params.amplification;
            *brightness = smooth(*brightness, target, self.params.smoothing);
        }
        let boost = 1.0 + input.average * REACTIVE_GAIN;
        self.rotation = (self.rotation + self.params.rotation_speed * boost * input.step()) % TAU;
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let center = size.center();
        let extent = size.min_dim() * EXTENT;
        let arms = self.params.arms as f32;

        for (star, brightness) in self.stars.iter().zip(&self.brightness) {
            let arm_angle = star.arm as f32 / arms * TAU;
            let angle = arm_angle + star.t * self.params.twist * TAU + star.angle_offset * star.t + self.rotation;
            let radius = (star.t + star.spread) * extent;
            let lit = brightness.clamp(0.0, 1.0);
            surface.fill_circle(
                center.polar(radius, angle),
                self.params.star_size * star.size * (1.0 + lit),
                palette.color_alpha(star.arm, BASE_ALPHA + lit * (1.0 - BASE_ALPHA)),
            );
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.brightness.clone()
    }
}
