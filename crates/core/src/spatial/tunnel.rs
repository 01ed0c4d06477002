use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{geometry::angles, DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const BULGE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
struct TunnelParams {
    segments: usize,
    sides: usize,
    spacing: f32,
    radius: f32,
    speed: f32,
    smoothing: f32,
    amplification: f32,
}

impl TunnelParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            segments: settings.count("segments", 24),
            sides: settings.count("sides", 16).max(3),
            spacing: settings.float("spacing", 60.0).max(1.0),
            radius: settings.float("radius", 150.0).max(1.0),
            speed: settings.float("speed", 4.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Polygonal rings flying toward the camera. Side `s` of every ring bulges
/// with its slice of the spectrum; louder audio flies faster.
#[derive(Debug, Clone)]
pub struct Tunnel {
    params: TunnelParams,
    values: Vec<f32>,
    offset: f32,
}

impl Tunnel {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = TunnelParams::from_settings(settings);
        Self {
            values: vec![0.0; params.sides],
            offset: 0.0,
            params,
        }
    }

    /// Scroll position within one ring spacing.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Depth of ring `segment`; the first quarter starts behind the origin.
    pub fn ring_z(&self, segment: usize) -> f32 {
        let start = -(self.params.segments as f32 * self.params.spacing) / 4.0;
        start + segment as f32 * self.params.spacing - self.offset
    }

    pub fn ring(&self, segment: usize) -> Vec<Vec3> {
        let z = self.ring_z(segment);
        angles(self.values.len())
            .zip(&self.values)
            .map(|(angle, value)| {
                let radius = self.params.radius * (1.0 + value * BULGE);
                Vec3::new(radius * angle.cos(), radius * angle.sin(), z)
            })
            .collect()
    }
}

impl Shape for Tunnel {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = TunnelParams::from_settings(settings);
        self.values.resize(self.params.sides, 0.0);
        self.offset %= self.params.spacing;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.values.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(i, count)) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
        let advance = self.params.speed * (1.0 + input.average) * input.step();
        self.offset = (self.offset + advance).rem_euclid(self.params.spacing);
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let segments = self.params.segments;
        let energy = self.values.iter().sum::<f32>() / self.values.len().max(1) as f32;
        for segment in 0..segments {
            let alpha = 1.0 - fraction(segment, segments) * 0.8;
            let color = palette.color_alpha(segment, alpha);
            // rings behind the camera fail visibility and are dropped
            batch.polygon(view, &self.ring(segment), None, Some((1.0 + energy * 2.0, color)));
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
    fn scroll_wraps_within_one_spacing() {
        let mut tunnel = Tunnel::new(&VisualizerSettings::new().with("spacing", 60).with("speed", 4));
        tick_shape(&mut tunnel, 0, 0.0);
        assert!((tunnel.offset() - 4.0).abs() < 1e-4);
        for i in 1..100 {
            tick_shape(&mut tunnel, 0, i as f64 * 16.0);
        }
        assert!(tunnel.offset() < 60.0);
    }

    #[test]
    fn sides_bulge_with_energy() {
        let settings = VisualizerSettings::new().with("sides", 6).with("smoothing", 0.0);
        let mut tunnel = Tunnel::new(&settings);
        let radius = |t: &Tunnel| t.ring(0)[0].truncate().length();
        assert!((radius(&tunnel) - 150.0).abs() < 1e-3);

        tick_shape(&mut tunnel, 255, 0.0);
        assert!((radius(&tunnel) - 225.0).abs() < 1e-3);
        assert_eq!(tunnel.ring(3).len(), 6);
    }

    #[test]
    fn rings_behind_the_camera_are_dropped() {
        let settings = VisualizerSettings::new().with("segments", 4).with("spacing", 800);
        let tunnel = Tunnel::new(&settings);
        assert_eq!(tunnel.ring_z(0), -800.0);

        let mut batch = DepthBatch::new();
        tunnel.build(&default_view(), &mut batch, &ColorPalette::default());
        assert_eq!(batch.len(), 3);
    }
}
