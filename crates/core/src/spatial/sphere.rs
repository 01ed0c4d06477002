use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{geometry::fibonacci_sphere, DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

#[derive(Debug, Clone, PartialEq)]
struct SphereParams {
    points: usize,
    radius: f32,
    displacement: f32,
    point_size: f32,
    smoothing: f32,
    amplification: f32,
}

impl SphereParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            points: settings.count("pointCount", 400),
            radius: settings.float("radius", 150.0).max(1.0),
            displacement: settings.float("displacement", 80.0),
            point_size: settings.float("pointSize", 2.5).max(0.1),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Evenly spread points on a sphere pushed outward by their frequency bin.
#[derive(Debug, Clone)]
pub struct Sphere {
    params: SphereParams,
    directions: Vec<Vec3>,
    values: Vec<f32>,
}

impl Sphere {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = SphereParams::from_settings(settings);
        Self {
            directions: fibonacci_sphere(params.points),
            values: vec![0.0; params.points],
            params,
        }
    }

    /// World position of point `index`.
    pub fn position(&self, index: usize) -> Vec3 {
        let value = self.values[index];
        self.directions[index] * (self.params.radius + value * self.params.displacement)
    }
}

impl Shape for Sphere {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = SphereParams::from_settings(settings);
        if params.points != self.params.points {
            self.directions = fibonacci_sphere(params.points);
            self.values = vec![0.0; params.points];
        }
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(i, count)) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        for (i, value) in self.values.iter().enumerate() {
            let lit = value.clamp(0.0, 1.0);
            batch.point(
                view,
                self.position(i),
                self.params.point_size * (1.0 + lit),
                palette.gradient(lit).with_alpha(0.5 + lit * 0.5),
            );
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}
