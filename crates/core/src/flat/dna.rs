use std::f32::consts::{PI, TAU};

use crate::{
    flat::fraction,
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Point, Surface, VisualizerSettings,
};

const MARGIN: f32 = 0.05;
const AMPLITUDE: f32 = 0.3;
const REST_AMPLITUDE: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
struct DnaParams {
    points: usize,
    frequency: f32,
    cross_link_every: usize,
    speed: f32,
    strand_width: f32,
    smoothing: f32,
    amplification: f32,
}

impl DnaParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            points: settings.count("points", 40).max(2),
            frequency: settings.float("frequency", 2.0),
            cross_link_every: settings.count("crossLinkEvery", 4),
            speed: settings.float("speed", 0.02),
            strand_width: settings.float("strandWidth", 3.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Two phase-opposed sine strands whose amplitude follows the spectrum.
#[derive(Debug, Clone)]
pub struct Dna {
    params: DnaParams,
    values: Vec<f32>,
    phase: f32,
}

impl Dna {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = DnaParams::from_settings(settings);
        Self {
            values: vec![0.0; params.points],
            phase: 0.0,
            params,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Screen positions of both strands at every sample point.
    pub fn strands(&self, width: f32, height: f32) -> (Vec<Point>, Vec<Point>) {
        let mid = height / 2.0;
        let span = width * (1.0 - 2.0 * MARGIN);
        let count = self.values.len();
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let t = fraction(i, count);
                let x = width * MARGIN + t * span;
                let angle = t * self.params.frequency * TAU + self.phase;
                let amplitude = height * (REST_AMPLITUDE + value.clamp(0.0, 1.5) * AMPLITUDE) / 2.0;
                (
                    Point::new(x, mid + angle.sin() * amplitude),
                    Point::new(x, mid + (angle + PI).sin() * amplitude),
                )
            })
            .unzip()
    }
}

impl Style for Dna {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = DnaParams::from_settings(settings);
        self.values.resize(self.params.points, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
        self.phase = (self.phase + self.params.speed * (1.0 + input.average) * input.step()) % TAU;
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let (upper, lower) = self.strands(size.width, size.height);

        for (i, (a, b)) in upper.iter().zip(&lower).enumerate() {
            if i % self.params.cross_link_every == 0 {
                let alpha = 0.3 + self.values[i].clamp(0.0, 1.0) * 0.7;
                surface.stroke_line(*a, *b, 1.0, palette.color_alpha(2, alpha));
            }
        }

        surface.stroke_path(&upper, false, self.params.strand_width, palette.color(0));
        surface.stroke_path(&lower, false, self.params.strand_width, palette.color(1));

        for (i, (a, b)) in upper.iter().zip(&lower).enumerate() {
            let radius = self.params.strand_width * (1.0 + self.values[i].clamp(0.0, 1.0));
            surface.fill_circle(*a, radius, palette.color(0));
            surface.fill_circle(*b, radius, palette.color(1));
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}
