use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{
        geometry::{centred, cube_faces},
        DepthBatch, Shape, View,
    },
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const MIN_SCALE: f32 = 0.4;

#[derive(Debug, Clone, PartialEq)]
struct CubeGridParams {
    grid: usize,
    spacing: f32,
    cube_size: f32,
    smoothing: f32,
    amplification: f32,
}

impl CubeGridParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            grid: settings.count("gridSize", 5),
            spacing: settings.float("spacing", 70.0).max(1.0),
            cube_size: settings.float("cubeSize", 30.0).max(1.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// A lattice of `gridSize³` cubes; each one pulses with its own bin.
#[derive(Debug, Clone)]
pub struct CubeGrid {
    params: CubeGridParams,
    values: Vec<f32>,
}

impl CubeGrid {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = CubeGridParams::from_settings(settings);
        Self {
            values: vec![0.0; params.grid.pow(3)],
            params,
        }
    }

    pub fn center(&self, index: usize) -> Vec3 {
        let grid = self.params.grid;
        let spacing = self.params.spacing;
        Vec3::new(
            centred(index % grid, grid, spacing),
            centred(index / grid % grid, grid, spacing),
            centred(index / (grid * grid), grid, spacing),
        )
    }

    pub fn cube_size(&self, index: usize) -> f32 {
        self.params.cube_size * (MIN_SCALE + self.values[index].clamp(0.0, 1.5))
    }
}

impl Shape for CubeGrid {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = CubeGridParams::from_settings(settings);
        self.values.resize(self.params.grid.pow(3), 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let count = self.values.len();
        for (i, value) in self.values.iter().enumerate() {
            let lit = value.clamp(0.0, 1.0);
            let color = palette.gradient(fraction(i, count)).with_alpha(0.35 + lit * 0.65);
            let edge = color.with_alpha(0.8);
            for (quad, shade) in cube_faces(self.center(i), self.cube_size(i)).iter() {
                batch.polygon(view, quad, Some(color.shade(*shade)), Some((1.0, edge)));
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::tests::{default_view, tick_shape};

    #[test]
    fn lattice_is_centred_on_the_origin() {
        let grid = CubeGrid::new(&VisualizerSettings::new().with("gridSize", 3).with("spacing", 10));
        assert_eq!(grid.tracked_values().len(), 27);
        assert_eq!(grid.center(0), Vec3::splat(-10.0));
        assert_eq!(grid.center(13), Vec3::ZERO);
        assert_eq!(grid.center(26), Vec3::splat(10.0));
    }

    #[test]
    fn cubes_grow_with_their_bin() {
        let settings = VisualizerSettings::new().with("gridSize", 2).with("smoothing", 0.0);
        let mut grid = CubeGrid::new(&settings);
        assert!((grid.cube_size(0) - 30.0 * MIN_SCALE).abs() < 1e-4);

        tick_shape(&mut grid, 255, 0.0);
        assert!((grid.cube_size(0) - 30.0 * 1.4).abs() < 1e-4);

        let mut batch = DepthBatch::new();
        grid.build(&default_view(), &mut batch, &ColorPalette::default());
        assert_eq!(batch.len(), 8 * 6);
    }
}
