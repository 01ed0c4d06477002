use crate::{
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Point, Surface, SurfaceSize, VisualizerSettings,
};

const SEED: u64 = 0x5eed_0001;
const INITIAL_SPEED: f32 = 1.0;
const CONNECTION_ALPHA: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
struct ParticleParams {
    count: usize,
    size: f32,
    speed: f32,
    turbulence: bool,
    turbulence_strength: f32,
    gravity: f32,
    attraction: f32,
    friction: f32,
    connections: bool,
    connection_distance: f32,
    smoothing: f32,
    amplification: f32,
}

impl ParticleParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            count: settings.count("particleCount", 150),
            size: settings.float("particleSize", 2.0).max(0.5),
            speed: settings.float("speed", 1.0),
            turbulence: settings.boolean("turbulence", true),
            turbulence_strength: settings.float("turbulenceStrength", 0.5),
            gravity: settings.float("gravity", 0.0),
            attraction: settings.float("attraction", 0.02),
            friction: settings.float("friction", 0.98).clamp(0.0, 1.0),
            connections: settings.boolean("connections", true),
            connection_distance: settings.float("connectionDistance", 100.0).max(0.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: usize,
}

/// Fixed-size particle field pushed around by energy-scaled forces.
#[derive(Debug, Clone)]
pub struct ParticleField {
    params: ParticleParams,
    particles: Vec<Particle>,
    energy: f32,
    bounds: SurfaceSize,
    rng: fastrand::Rng,
}

impl ParticleField {
    pub fn new(settings: &VisualizerSettings, bounds: SurfaceSize) -> Self {
        let params = ParticleParams::from_settings(settings);
        let mut field = Self {
            particles: Vec::with_capacity(params.count),
            energy: 0.0,
            bounds,
            rng: fastrand::Rng::with_seed(SEED),
            params,
        };
        field.spawn_to(field.params.count);
        field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn spawn_to(&mut self, count: usize) {
        while self.particles.len() < count {
            let particle = Particle {
                x: self.rng.f32() * self.bounds.width,
                y: self.rng.f32() * self.bounds.height,
                vx: (self.rng.f32() - 0.5) * 2.0 * INITIAL_SPEED,
                vy: (self.rng.f32() - 0.5) * 2.0 * INITIAL_SPEED,
                size: self.params.size * (0.5 + self.rng.f32()),
                color: self.particles.len(),
            };
            self.particles.push(particle);
        }
        self.particles.truncate(count);
    }
}

impl Style for ParticleField {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = ParticleParams::from_settings(settings);
        self.spawn_to(self.params.count);
    }

    fn resize(&mut self, old: SurfaceSize, new: SurfaceSize) {
        let sx = new.width / old.width.max(1.0);
        let sy = new.height / old.height.max(1.0);
        for particle in &mut self.particles {
            particle.x *= sx;
            particle.y *= sy;
        }
        self.bounds = new;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let params = &self.params;
        self.energy = smooth(self.energy, input.average * params.amplification, params.smoothing);
        let energy = self.energy;
        let step = input.step();
        let center = self.bounds.center();
        let damping = params.friction.powf(step);
        let (width, height) = (self.bounds.width, self.bounds.height);

        for particle in &mut self.particles {
            if params.turbulence {
                particle.vx += (self.rng.f32() - 0.5) * params.turbulence_strength * energy * step;
                particle.vy += (self.rng.f32() - 0.5) * params.turbulence_strength * energy * step;
            }
            particle.vy += params.gravity * step;

            let dx = center.x - particle.x;
            let dy = center.y - particle.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > 1.0 {
                let pull = params.attraction * energy * step / distance;
                particle.vx += dx * pull;
                particle.vy += dy * pull;
            }

            particle.vx *= damping;
            particle.vy *= damping;
            particle.x += particle.vx * params.speed * step;
            particle.y += particle.vy * params.speed * step;

            if particle.x < 0.0 || particle.x > width {
                particle.x = particle.x.clamp(0.0, width);
                particle.vx = -particle.vx;
            }
            if particle.y < 0.0 || particle.y > height {
                particle.y = particle.y.clamp(0.0, height);
                particle.vy = -particle.vy;
            }
        }
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let glow = 0.3 + self.energy.min(1.0) * 0.7;

        if self.params.connections && self.params.connection_distance > 0.0 {
            let max = self.params.connection_distance;
            for (i, a) in self.particles.iter().enumerate() {
                let pa = Point::new(a.x, a.y);
                for b in &self.particles[i + 1..] {
                    let pb = Point::new(b.x, b.y);
                    let distance = pa.distance(pb);
                    if distance < max {
                        let alpha = (1.0 - distance / max) * CONNECTION_ALPHA * glow;
                        surface.stroke_line(pa, pb, 1.0, palette.color_alpha(a.color, alpha));
                    }
                }
            }
        }

        for particle in &self.particles {
            surface.fill_circle(
                Point::new(particle.x, particle.y),
                particle.size * (1.0 + self.energy.min(2.0)),
                palette.color_alpha(particle.color, glow),
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
    use crate::{BandEnergies, FrequencyFrame, TimeFrame};

    const BOUNDS: SurfaceSize = SurfaceSize::new(300.0, 200.0);

    fn tick(field: &mut ParticleField, level: u8) {
        let frequency = FrequencyFrame::new(vec![level; 16]);
        let time = TimeFrame::silent(4);
        field.update(&FrameInput {
            frequency: &frequency,
            time: &time,
            bands: BandEnergies::from_frame(&frequency),
            average: frequency.average(),
            now_ms: 0.0,
            dt: 1.0 / 60.0,
            size: BOUNDS,
        });
    }

    #[test]
    fn particles_stay_inside_bounds() {
        let settings = VisualizerSettings::new()
            .with("particleCount", 40)
            .with("speed", 8)
            .with("gravity", 0.5);
        let mut field = ParticleField::new(&settings, BOUNDS);
        for _ in 0..500 {
            tick(&mut field, 255);
        }

        assert_eq!(field.particles().len(), 40);
        for particle in field.particles() {
            assert!((0.0..=BOUNDS.width).contains(&particle.x));
            assert!((0.0..=BOUNDS.height).contains(&particle.y));
        }
    }

    #[test]
    fn resize_rescales_positions_without_respawning() {
        let mut field = ParticleField::new(&VisualizerSettings::new().with("particleCount", 10), BOUNDS);
        let before: Vec<Particle> = field.particles().to_vec();
        field.resize(BOUNDS, SurfaceSize::new(600.0, 100.0));

        for (old, new) in before.iter().zip(field.particles()) {
            assert!((new.x - old.x * 2.0).abs() < 1e-3);
            assert!((new.y - old.y * 0.5).abs() < 1e-3);
            assert_eq!(new.size, old.size);
        }
    }

    #[test]
    fn count_changes_keep_existing_particles() {
        let mut field = ParticleField::new(&VisualizerSettings::new().with("particleCount", 10), BOUNDS);
        let first = field.particles()[0];
        field.configure(&VisualizerSettings::new().with("particleCount", 25));
        assert_eq!(field.particles().len(), 25);
        assert_eq!(field.particles()[0], first);

        field.configure(&VisualizerSettings::new().with("particleCount", 5));
        assert_eq!(field.particles().len(), 5);
    }

    #[test]
    fn attraction_pulls_toward_center_with_energy() {
        let settings = VisualizerSettings::new()
            .with("particleCount", 1)
            .with("turbulence", false)
            .with("attraction", 1.0)
            .with("smoothing", 0.0)
            .with("friction", 1.0);
        let mut field = ParticleField::new(&settings, BOUNDS);
        field.particles[0] = Particle { x: 10.0, y: 100.0, vx: 0.0, vy: 0.0, size: 1.0, color: 0 };
        tick(&mut field, 255);

        assert!(field.particles()[0].vx > 0.0);
        assert!(field.particles()[0].x > 10.0);
    }
}
