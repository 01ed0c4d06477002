//! Beat-driven pulse: a bass-energy beat detector emitting expanding rings
//! around a core that swells on every beat.
//!
//! The detector keeps a bounded history of recent bass energies. A sample is
//! a beat when it exceeds `average(history) * beatThreshold`, exceeds the
//! absolute `sensitivity` floor and at least `minInterval` ms have passed
//! since the previous beat.

use std::collections::VecDeque;

use crate::{
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Glow, Surface, SurfaceSize, VisualizerSettings,
};

const CORE_BUMP: f32 = 1.5;
const CORE_FOLLOW: f32 = 0.5;
const CORE_RETURN: f32 = 0.9;
const RING_WIDTH: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
struct PulseParams {
    sensitivity: f32,
    threshold: f32,
    min_interval_ms: f64,
    max_rings: usize,
    ring_speed: f32,
    fade_speed: f32,
    history_size: usize,
    core_size: f32,
    smoothing: f32,
    amplification: f32,
}

impl PulseParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            sensitivity: settings.float("sensitivity", 0.6),
            threshold: settings.float("beatThreshold", 1.3),
            min_interval_ms: settings.float("minInterval", 100.0).max(0.0) as f64,
            max_rings: settings.count("maxRings", 10),
            ring_speed: settings.float("ringSpeed", 5.0),
            fade_speed: settings.float("fadeSpeed", 0.02).max(0.0),
            history_size: settings.count("historySize", 30),
            core_size: settings.float("coreSize", 0.08).max(0.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub radius: f32,
    pub opacity: f32,
    pub color: usize,
}

/// Where the pulse automaton sits after the latest tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatPhase {
    /// No rings alive.
    Idle,
    /// A beat was detected and a ring emitted this tick.
    Emitting,
    /// Rings are expanding and fading.
    Decaying,
}

#[derive(Debug, Clone)]
pub struct Pulse {
    params: PulseParams,
    history: VecDeque<f32>,
    last_beat_ms: Option<f64>,
    rings: Vec<Ring>,
    beats: usize,
    energy: f32,
    base_core: f32,
    core_size: f32,
    core_target: f32,
    bounds: SurfaceSize,
    phase: BeatPhase,
}

impl Pulse {
    pub fn new(settings: &VisualizerSettings, bounds: SurfaceSize) -> Self {
        let params = PulseParams::from_settings(settings);
        let base_core = params.core_size * bounds.min_dim();
        Self {
            history: VecDeque::with_capacity(params.history_size),
            last_beat_ms: None,
            rings: Vec::new(),
            beats: 0,
            energy: 0.0,
            base_core,
            core_size: base_core,
            core_target: base_core,
            bounds,
            phase: BeatPhase::Idle,
            params,
        }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn phase(&self) -> BeatPhase {
        self.phase
    }

    pub fn core_size(&self) -> f32 {
        self.core_size
    }

    pub fn core_target(&self) -> f32 {
        self.core_target
    }

    /// Tests `energy` against the history and records it.
    pub fn detect_beat(&mut self, energy: f32, now_ms: f64) -> bool {
        let average = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f32>() / self.history.len() as f32
        };
        let cooled = self
            .last_beat_ms
            .map_or(true, |last| now_ms - last >= self.params.min_interval_ms);
        let beat = energy > average * self.params.threshold && energy > self.params.sensitivity && cooled;

        self.history.push_back(energy);
        while self.history.len() > self.params.history_size {
            self.history.pop_front();
        }
        if beat {
            self.last_beat_ms = Some(now_ms);
        }
        beat
    }

    /// Feeds one energy sample; on a beat emits a ring at the current core
    /// size and bumps the core target.
    pub fn on_energy(&mut self, energy: f32, now_ms: f64) -> bool {
        if !self.detect_beat(energy, now_ms) {
            return false;
        }

        self.rings.push(Ring {
            radius: self.core_size,
            opacity: 1.0,
            color: self.beats,
        });
        if self.rings.len() > self.params.max_rings {
            let excess = self.rings.len() - self.params.max_rings;
            self.rings.drain(..excess);
        }
        self.beats += 1;
        self.core_target = self.base_core * (1.0 + energy * CORE_BUMP);
        tracing::trace!(energy, rings = self.rings.len(), "beat");
        true
    }

    fn advance_rings(&mut self, step: f32) {
        let reach = self.bounds.half_diagonal();
        for ring in &mut self.rings {
            ring.radius += self.params.ring_speed * step;
            ring.opacity -= self.params.fade_speed * step;
        }
        self.rings.retain(|ring| ring.opacity > 0.0 && ring.radius <= reach);
    }
}

impl Style for Pulse {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = PulseParams::from_settings(settings);
        while self.history.len() > params.history_size {
            self.history.pop_front();
        }
        if self.rings.len() > params.max_rings {
            let excess = self.rings.len() - params.max_rings;
            self.rings.drain(..excess);
        }
        let base_core = params.core_size * self.bounds.min_dim();
        self.core_target += base_core - self.base_core;
        self.core_size += base_core - self.base_core;
        self.base_core = base_core;
        self.params = params;
    }

    fn resize(&mut self, old: SurfaceSize, new: SurfaceSize) {
        let scale = new.min_dim() / old.min_dim().max(1.0);
        for ring in &mut self.rings {
            ring.radius *= scale;
        }
        self.base_core *= scale;
        self.core_size *= scale;
        self.core_target *= scale;
        self.bounds = new;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let step = input.step();
        self.advance_rings(step);

        let energy = input.bands.bass * self.params.amplification;
        self.energy = smooth(self.energy, energy, self.params.smoothing);
        let emitted = self.on_energy(energy, input.now_ms);

        self.core_target = smooth(self.core_target, self.base_core, CORE_RETURN);
        self.core_size = smooth(self.core_size, self.core_target, CORE_FOLLOW);

        self.phase = if emitted {
            BeatPhase::Emitting
        } else if self.rings.is_empty() {
            BeatPhase::Idle
        } else {
            BeatPhase::Decaying
        };
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let center = surface.size().center();

        for ring in &self.rings {
            surface.stroke_circle(
                center,
                ring.radius,
                RING_WIDTH * ring.opacity.max(0.2),
                palette.color_alpha(ring.color, ring.opacity),
            );
        }

        surface.set_glow(Some(Glow {
            blur: 10.0 + self.energy.min(2.0) * 20.0,
            color: palette.color(0),
        }));
        surface.fill_circle(center, self.core_size, palette.color_alpha(0, 0.6 + self.energy.min(1.0) * 0.4));
        surface.set_glow(None);
    }

    fn tracked_values(&self) -> Vec<f32> {
        vec![self.energy, self.core_target - self.base_core]
    }
}
