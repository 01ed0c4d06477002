use std::collections::VecDeque;

use crate::{
    flat::fraction,
    spatial::{
        geometry::{angles, ring_point},
        DepthBatch, Shape, View,
    },
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const INNER_RADIUS: f32 = 40.0;

#[derive(Debug, Clone, PartialEq)]
struct RingsParams {
    rings: usize,
    segments: usize,
    spacing: f32,
    wave_height: f32,
    smoothing: f32,
    amplification: f32,
}

impl RingsParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            rings: settings.count("ringCount", 12),
            segments: settings.count("segments", 96).max(3),
            spacing: settings.float("ringSpacing", 18.0).max(1.0),
            wave_height: settings.float("waveHeight", 60.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Concentric rings on the floor plane. The innermost ring carries the live
/// waveform; each tick it ripples one ring outward.
#[derive(Debug, Clone)]
pub struct WaveformRings {
    params: RingsParams,
    wave: Vec<f32>,
    history: VecDeque<Vec<f32>>,
}

impl WaveformRings {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = RingsParams::from_settings(settings);
        Self {
            wave: vec![0.0; params.segments],
            history: VecDeque::with_capacity(params.rings),
            params,
        }
    }

    pub fn ring_count(&self) -> usize {
        self.history.len()
    }
}

impl Shape for WaveformRings {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = RingsParams::from_settings(settings);
        if params.segments != self.params.segments {
            self.wave = vec![0.0; params.segments];
            self.history.clear();
        }
        self.history.truncate(params.rings);
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.wave.len();
        for (i, sample) in self.wave.iter_mut().enumerate() {
            let target = input.time.at_fraction(fraction(i, count)) * self.params.amplification;
            *sample = smooth(*sample, target, self.params.smoothing);
        }
        self.history.push_front(self.wave.clone());
        self.history.truncate(self.params.rings);
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        for (ring, wave) in self.history.iter().enumerate() {
            let radius = INNER_RADIUS + ring as f32 * self.params.spacing;
            let alpha = 1.0 - ring as f32 / (self.params.rings as f32 + 1.0);
            let color = palette.color_alpha(ring, alpha);
            let points: Vec<_> = angles(wave.len())
                .zip(wave)
                .map(|(angle, sample)| ring_point(radius, angle, sample * self.params.wave_height))
                .collect();
            for (i, from) in points.iter().enumerate() {
                let to = points[(i + 1) % points.len()];
                batch.line(view, *from, to, 1.5, color);
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.wave.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::tests::{default_view, tick_shape};

    #[test]
    fn rings_ripple_outward_up_to_the_limit() {
        let settings = VisualizerSettings::new().with("ringCount", 4).with("segments", 8);
        let mut rings = WaveformRings::new(&settings);
        for i in 0..10 {
            tick_shape(&mut rings, 200, i as f64 * 16.0);
        }
        assert_eq!(rings.ring_count(), 4);

        let mut batch = DepthBatch::new();
        rings.build(&default_view(), &mut batch, &ColorPalette::default());
        assert_eq!(batch.len(), 32);
    }

    #[test]
    fn newest_ring_follows_the_waveform() {
        let settings = VisualizerSettings::new().with("segments", 8).with("smoothing", 0.0);
        let mut rings = WaveformRings::new(&settings);
        tick_shape(&mut rings, 255, 0.0);

        assert_eq!(rings.history[0], rings.tracked_values());
        assert!(rings.tracked_values().iter().any(|sample| sample.abs() > 0.1));
    }
}
