use glam::Vec3;

use crate::{
    spatial::{DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const SEED: u64 = 0x3d_9a27;
const DRIFT: f32 = 0.5;
const DAMPING: f32 = 0.96;
const POINT_SIZE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
struct Particles3dParams {
    count: usize,
    bounds: f32,
    burst: f32,
    smoothing: f32,
    amplification: f32,
}

impl Particles3dParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            count: settings.count("particleCount", 300),
            bounds: settings.float("bounds", 250.0).max(1.0),
            burst: settings.float("burst", 4.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle3d {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// A cloud of drifting particles inside a cube, blown outward by bass.
#[derive(Debug, Clone)]
pub struct Particles3d {
    params: Particles3dParams,
    particles: Vec<Particle3d>,
    energy: f32,
    rng: fastrand::Rng,
}

impl Particles3d {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = Particles3dParams::from_settings(settings);
        let mut cloud = Self {
            particles: Vec::with_capacity(params.count),
            energy: 0.0,
            rng: fastrand::Rng::with_seed(SEED),
            params,
        };
        cloud.spawn_to(cloud.params.count);
        cloud
    }

    pub fn particles(&self) -> &[Particle3d] {
        &self.particles
    }

    fn random_unit(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.f32() * 2.0 - 1.0,
            self.rng.f32() * 2.0 - 1.0,
            self.rng.f32() * 2.0 - 1.0,
        )
    }

    fn spawn_to(&mut self, count: usize) {
        while self.particles.len() < count {
            let position = self.random_unit() * self.params.bounds;
            let velocity = self.random_unit() * DRIFT;
            self.particles.push(Particle3d { position, velocity });
        }
        self.particles.truncate(count);
    }
}

impl Shape for Particles3d {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = Particles3dParams::from_settings(settings);
        self.spawn_to(self.params.count);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let bass = input.bands.bass * self.params.amplification;
        self.energy = smooth(self.energy, bass, self.params.smoothing);
        let step = input.step();
        let bounds = self.params.bounds;
        let push = self.params.burst * self.energy * 0.05 * step;
        let damping = DAMPING.powf(step);

        for particle in &mut self.particles {
            let outward = particle.position.normalize_or_zero();
            particle.velocity = (particle.velocity + outward * push) * damping;
            // stalled particles drift back inward
            if particle.velocity.length_squared() < DRIFT * DRIFT * 0.01 {
                particle.velocity += -outward * DRIFT * 0.1;
            }
            particle.position += particle.velocity * step;

            for axis in 0..3 {
                if particle.position[axis].abs() > bounds {
                    particle.position[axis] = particle.position[axis].clamp(-bounds, bounds);
                    particle.velocity[axis] = -particle.velocity[axis];
                }
            }
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let glow = self.energy.clamp(0.0, 1.0);
        for (i, particle) in self.particles.iter().enumerate() {
            batch.point(
                view,
                particle.position,
                POINT_SIZE * (1.0 + glow),
                palette.color_alpha(i, 0.4 + glow * 0.6),
            );
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        vec![self.energy]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::tests::tick_shape;

    #[test]
    fn particles_stay_inside_the_cube() {
        let settings = VisualizerSettings::new()
            .with("particleCount", 50)
            .with("bounds", 100.0)
            .with("burst", 40.0);
        let mut cloud = Particles3d::new(&settings);
        for i in 0..300 {
            tick_shape(&mut cloud, 255, i as f64 * 16.0);
        }
        assert_eq!(cloud.particles().len(), 50);
        assert!(cloud
            .particles()
            .iter()
            .all(|p| p.position.abs().max_element() <= 100.0));
    }

    #[test]
    fn bass_pushes_particles_outward() {
        let settings = VisualizerSettings::new().with("particleCount", 1).with("smoothing", 0.0);
        let mut cloud = Particles3d::new(&settings);
        cloud.particles[0] = Particle3d {
            position: Vec3::new(10.0, 0.0, 0.0),
            velocity: Vec3::ZERO,
        };
        tick_shape(&mut cloud, 255, 0.0);
        assert!(cloud.particles()[0].velocity.x > 0.0);
    }
}
