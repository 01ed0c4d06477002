use std::f32::consts::TAU;

use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{geometry::centred, CameraPose, DepthBatch, Projector, View},
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Surface, VisualizerSettings,
};

/// World-space width of the plane.
const PLANE: f32 = 400.0;
const CAMERA_DISTANCE: f32 = 600.0;

#[derive(Debug, Clone, PartialEq)]
struct GridParams {
    size: usize,
    rotation_speed: f32,
    tilt: f32,
    height_scale: f32,
    smoothing: f32,
    amplification: f32,
}

impl GridParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            size: settings.count("gridSize", 20).max(2),
            rotation_speed: settings.float("rotationSpeed", 0.003),
            tilt: settings.float("tilt", 0.9),
            height_scale: settings.float("heightScale", 60.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// A rotating wireframe plane seen in perspective. The centre of the plane
/// follows the low bins and the rim the high ones.
#[derive(Debug, Clone)]
pub struct Grid {
    params: GridParams,
    heights: Vec<f32>,
    rotation: f32,
}

impl Grid {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = GridParams::from_settings(settings);
        Self {
            heights: vec![0.0; params.size * params.size],
            rotation: 0.0,
            params,
        }
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Distance of grid point `index` from the centre, in `[0, 1]`.
    fn radial(&self, index: usize) -> f32 {
        let n = self.params.size;
        let x = centred(index % n, n, 1.0);
        let z = centred(index / n, n, 1.0);
        let max = centred(n - 1, n, 1.0) * std::f32::consts::SQRT_2;
        (x.hypot(z) / max).clamp(0.0, 1.0)
    }

    fn vertex(&self, index: usize) -> Vec3 {
        let n = self.params.size;
        let cell = PLANE / (n - 1) as f32;
        Vec3::new(
            centred(index % n, n, cell),
            self.heights[index] * self.params.height_scale,
            centred(index / n, n, cell),
        )
    }

    fn view(&self, surface: &dyn Surface) -> View {
        let mut pose = CameraPose::new(CAMERA_DISTANCE);
        pose.rotation = Vec3::new(self.params.tilt, self.rotation, 0.0);
        View::new(Projector::default(), pose, surface.size())
    }
}

impl Style for Grid {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = GridParams::from_settings(settings);
        let points = self.params.size * self.params.size;
        if points != self.heights.len() {
            self.heights = vec![0.0; points];
        }
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        for i in 0..self.heights.len() {
            let target = input.frequency.at_fraction(self.radial(i)) * self.params.amplification;
            self.heights[i] = smooth(self.heights[i], target, self.params.smoothing);
        }
        self.rotation = (self.rotation + self.params.rotation_speed * input.step()) % TAU;
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let view = self.view(surface);
        let n = self.params.size;
        let mut batch = DepthBatch::new();
        for i in 0..self.heights.len() {
            let (row, column) = (i / n, i % n);
            let from = self.vertex(i);
            let mut edge = |j: usize| {
                let lit = ((self.heights[i] + self.heights[j]) / 2.0).clamp(0.0, 1.0);
                let color = palette.gradient(fraction(row, n)).with_alpha(0.3 + lit * 0.7);
                batch.line(&view, from, self.vertex(j), 1.0 + lit, color);
            };
            if column + 1 < n {
                edge(i + 1);
            }
            if row + 1 < n {
                edge(i + n);
            }
        }
        batch.flush(surface);
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.heights.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BandEnergies, DrawCommand, FrequencyFrame, RecordingSurface, SurfaceSize, TimeFrame};

    fn tick(grid: &mut Grid, bins: Vec<u8>) {
        let frequency = FrequencyFrame::new(bins);
        let time = TimeFrame::silent(4);
        grid.update(&FrameInput {
            frequency: &frequency,
            time: &time,
            bands: BandEnergies::from_frame(&frequency),
            average: frequency.average(),
            now_ms: 0.0,
            dt: 1.0 / 60.0,
            size: SurfaceSize::new(400.0, 300.0),
        });
    }

    #[test]
    fn centre_follows_low_bins_and_rim_high_bins() {
        let settings = VisualizerSettings::new().with("gridSize", 3).with("smoothing", 0.0);
        let mut grid = Grid::new(&settings);
        let mut bins = vec![0; 16];
        bins[0] = 255;
        tick(&mut grid, bins);

        assert_eq!(grid.heights()[4], 1.0);
        assert_eq!(grid.heights()[0], 0.0);
        assert_eq!(grid.heights()[8], 0.0);
    }

    #[test]
    fn edges_are_painted_back_to_front() {
        let mut grid = Grid::new(&VisualizerSettings::new().with("gridSize", 4));
        tick(&mut grid, vec![200; 16]);

        let mut surface = RecordingSurface::new(400.0, 300.0);
        grid.draw(&mut surface, &ColorPalette::default());
        let lines: Vec<f32> = surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Line { width, .. } => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2 * 4 * 3);
        // nearer edges are wider after perspective scaling
        assert!(lines.first() < lines.last());
    }

    #[test]
    fn rotation_advances_per_tick() {
        let mut grid = Grid::new(&VisualizerSettings::new());
        tick(&mut grid, vec![0; 16]);
        assert!((grid.rotation() - 0.003).abs() < 1e-6);
    }
}
