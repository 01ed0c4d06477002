use std::collections::VecDeque;

use crate::{
    flat::fraction,
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Point, Surface, VisualizerSettings,
};

const AMPLITUDE_FILL: f32 = 0.4;
const FILL_ALPHA: f32 = 0.2;
const MIRROR_ALPHA: f32 = 0.4;

#[derive(Debug, Clone, PartialEq)]
struct WaveParams {
    points: usize,
    line_width: f32,
    trail: usize,
    fill: bool,
    mirror: bool,
    smoothing: f32,
    amplification: f32,
}

impl WaveParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            points: settings.count("pointCount", 256).max(2),
            line_width: settings.float("lineWidth", 2.0),
            trail: settings.count("trailLength", 5),
            fill: settings.boolean("fill", false),
            mirror: settings.boolean("mirror", false),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Time-domain polyline with a fading trail of previous frames.
#[derive(Debug, Clone)]
pub struct Wave {
    params: WaveParams,
    samples: Vec<f32>,
    history: VecDeque<Vec<f32>>,
}

impl Wave {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = WaveParams::from_settings(settings);
        Self {
            samples: vec![0.0; params.points],
            history: VecDeque::with_capacity(params.trail),
            params,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn polyline(&self, frame: &[f32], width: f32, height: f32, flip: f32) -> Vec<Point> {
        let mid = height / 2.0;
        let scale = height * AMPLITUDE_FILL;
        frame
            .iter()
            .enumerate()
            .map(|(i, value)| {
                Point::new(
                    fraction(i, frame.len()) * width,
                    mid - flip * value.clamp(-1.25, 1.25) * scale,
                )
            })
            .collect()
    }
}

impl Style for Wave {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = WaveParams::from_settings(settings);
        if params.points != self.params.points {
            self.samples = vec![0.0; params.points];
            self.history.clear();
        }
        while self.history.len() > params.trail {
            self.history.pop_front();
        }
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.samples.len();
        for (i, sample) in self.samples.iter_mut().enumerate() {
            let target = input.time.at_fraction(fraction(i, count)) * self.params.amplification;
            *sample = smooth(*sample, target, self.params.smoothing);
        }

        if self.history.len() == self.params.trail {
            self.history.pop_front();
        }
        self.history.push_back(self.samples.clone());
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let frames = self.history.len();

        for (k, frame) in self.history.iter().enumerate() {
            let alpha = (k + 1) as f32 / frames as f32;
            let newest = k + 1 == frames;
            let color = palette.color_alpha(0, alpha);
            let points = self.polyline(frame, size.width, size.height, 1.0);

            if newest && self.params.fill {
                let mut area = points.clone();
                area.push(Point::new(size.width, size.height / 2.0));
                area.push(Point::new(0.0, size.height / 2.0));
                surface.fill_path(&area, palette.color_alpha(1, FILL_ALPHA));
            }
            surface.stroke_path(&points, false, self.params.line_width, color);

            if newest && self.params.mirror {
                let reflected = self.polyline(frame, size.width, size.height, -1.0);
                surface.stroke_path(
                    &reflected,
                    false,
                    self.params.line_width,
                    palette.color_alpha(1, MIRROR_ALPHA),
                );
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.samples.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BandEnergies, DrawCommand, FrequencyFrame, RecordingSurface, SurfaceSize, TimeFrame};

    fn tick(wave: &mut Wave, time: &TimeFrame) {
        let frequency = FrequencyFrame::silent(4);
        wave.update(&FrameInput {
            frequency: &frequency,
            time,
            bands: BandEnergies::default(),
            average: 0.0,
            now_ms: 0.0,
            dt: 1.0 / 60.0,
            size: SurfaceSize::new(200.0, 100.0),
        });
    }

    #[test]
    fn trail_is_bounded_and_fades() {
        let settings = VisualizerSettings::new()
            .with("pointCount", 8)
            .with("trailLength", 3);
        let mut wave = Wave::new(&settings);
        let time = TimeFrame::new(vec![0.5; 16]);
        for _ in 0..6 {
            tick(&mut wave, &time);
        }
        assert_eq!(wave.history_len(), 3);

        let mut surface = RecordingSurface::new(200.0, 100.0);
        wave.draw(&mut surface, &ColorPalette::default());
        let alphas: Vec<f32> = surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Path { color, .. } => Some(color.a),
                _ => None,
            })
            .collect();
        assert_eq!(alphas.len(), 3);
        assert!(alphas.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn fill_and_mirror_add_shapes() {
        let settings = VisualizerSettings::new()
            .with("pointCount", 8)
            .with("trailLength", 1)
            .with("fill", true)
            .with("mirror", true);
        let mut wave = Wave::new(&settings);
        tick(&mut wave, &TimeFrame::new(vec![0.2; 8]));

        let mut surface = RecordingSurface::new(200.0, 100.0);
        wave.draw(&mut surface, &ColorPalette::default());
        let commands = surface.commands();

        assert!(matches!(commands[0], DrawCommand::FillPath { .. }));
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn changing_point_count_resets_history() {
        let mut wave = Wave::new(&VisualizerSettings::new().with("pointCount", 8));
        tick(&mut wave, &TimeFrame::new(vec![0.5; 8]));
        wave.configure(&VisualizerSettings::new().with("pointCount", 16));

        assert_eq!(wave.history_len(), 0);
        assert_eq!(wave.tracked_values().len(), 16);
    }
}
