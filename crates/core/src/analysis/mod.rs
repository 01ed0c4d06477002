use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

/// Number of frequency bins a source reports when nothing else is known.
pub const DEFAULT_BIN_COUNT: usize = 1024;

const BASS_END: f32 = 0.1;
const MID_END: f32 = 0.5;
const FPS_WINDOW_MS: f64 = 1000.0;

/// One tick of spectral magnitudes, low to high frequency, each in `[0, 255]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyFrame {
    bins: Vec<u8>,
}

impl FrequencyFrame {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// An all-zero frame of the given length.
    pub fn silent(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn raw(&self) -> &[u8] {
        &self.bins
    }

    /// Magnitude of `index` normalised to `[0, 1]`. Out-of-range reads are silent.
    pub fn normalized(&self, index: usize) -> f32 {
        self.bins
            .get(index)
            .map(|value| *value as f32 / 255.0)
            .unwrap_or(0.0)
    }

    /// Normalised magnitude of the bin that element `index` of `count` maps to
    /// when the spectrum is spread linearly across `count` elements.
    pub fn linear_sample(&self, index: usize, count: usize) -> f32 {
        if self.bins.is_empty() || count == 0 {
            return 0.0;
        }
        let bin = (index * self.bins.len()) / count;
        self.normalized(bin.min(self.bins.len() - 1))
    }

    /// Normalised magnitude at a fractional position `t` in `[0, 1]`.
    pub fn at_fraction(&self, t: f32) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let last = self.bins.len() - 1;
        let bin = (t.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.normalized(bin.min(last))
    }

    /// Mean magnitude of `[start, end)` normalised to `[0, 1]`.
    pub fn mean(&self, start: usize, end: usize) -> f32 {
        let end = end.min(self.bins.len());
        if start >= end {
            return 0.0;
        }
        let sum: u32 = self.bins[start..end].iter().map(|v| *v as u32).sum();
        sum as f32 / (end - start) as f32 / 255.0
    }

    pub fn average(&self) -> f32 {
        self.mean(0, self.bins.len())
    }

    pub fn peak(&self) -> f32 {
        self.bins.iter().copied().max().unwrap_or(0) as f32 / 255.0
    }
}

/// One tick of raw waveform samples in `[-1, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeFrame {
    samples: Vec<f32>,
}

impl TimeFrame {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at a fractional position `t` in `[0, 1]`, nearest neighbour.
    pub fn at_fraction(&self, t: f32) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let last = self.samples.len() - 1;
        let index = (t.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.samples[index.min(last)]
    }
}

/// Live audio analysis as seen by the engine.
///
/// Both reads are synchronous and must not block. A source with no audio
/// returns silence of the usual length instead of failing.
pub trait AnalysisSource {
    fn frequency_frame(&self) -> FrequencyFrame;

    fn time_frame(&self) -> TimeFrame;

    /// Length of every frequency frame for the lifetime of the session.
    fn bin_count(&self) -> usize;
}

/// Source that never produces sound. Used for idle scenes.
#[derive(Debug, Clone, Copy)]
pub struct SilentSource {
    bins: usize,
}

impl SilentSource {
    pub fn new(bins: usize) -> Self {
        Self { bins }
    }
}

impl Default for SilentSource {
    fn default() -> Self {
        Self::new(DEFAULT_BIN_COUNT)
    }
}

impl AnalysisSource for SilentSource {
    fn frequency_frame(&self) -> FrequencyFrame {
        FrequencyFrame::silent(self.bins)
    }

    fn time_frame(&self) -> TimeFrame {
        TimeFrame::silent(self.bins * 2)
    }

    fn bin_count(&self) -> usize {
        self.bins
    }
}

#[derive(Debug, Default)]
struct ManualFrames {
    frequency: FrequencyFrame,
    time: TimeFrame,
}

/// Host-fed frames behind a cheap, cloneable handle.
///
/// Hosts that already run their own spectrum analysis push each frame here;
/// every clone observes the latest pushed values.
#[derive(Debug, Clone)]
pub struct ManualSource {
    bins: usize,
    frames: Rc<RefCell<ManualFrames>>,
}

impl ManualSource {
    pub fn new(bins: usize) -> Self {
        let frames = ManualFrames {
            frequency: FrequencyFrame::silent(bins),
            time: TimeFrame::silent(bins * 2),
        };
        Self {
            bins,
            frames: Rc::new(RefCell::new(frames)),
        }
    }

    pub fn set_frequency(&self, bins: Vec<u8>) {
        self.frames.borrow_mut().frequency = FrequencyFrame::new(bins);
    }

    pub fn set_time(&self, samples: Vec<f32>) {
        self.frames.borrow_mut().time = TimeFrame::new(samples);
    }

    /// Fills every bin with the same magnitude.
    pub fn set_level(&self, value: u8) {
        self.set_frequency(vec![value; self.bins]);
    }
}

impl AnalysisSource for ManualSource {
    fn frequency_frame(&self) -> FrequencyFrame {
        self.frames.borrow().frequency.clone()
    }

    fn time_frame(&self) -> TimeFrame {
        self.frames.borrow().time.clone()
    }

    fn bin_count(&self) -> usize {
        self.bins
    }
}

/// Mean energy of the bass `[0, 0.1N)`, mid `[0.1N, 0.5N)` and treble
/// `[0.5N, N)` bands, each normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandEnergies {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl BandEnergies {
    pub fn from_frame(frame: &FrequencyFrame) -> Self {
        let n = frame.len();
        let bass_end = (n as f32 * BASS_END) as usize;
        let mid_end = (n as f32 * MID_END) as usize;
        Self {
            bass: frame.mean(0, bass_end),
            mid: frame.mean(bass_end, mid_end),
            treble: frame.mean(mid_end, n),
        }
    }

    /// Energy of band `index % 3`, in bass, mid, treble order.
    pub fn band(&self, index: usize) -> f32 {
        match index % 3 {
            0 => self.bass,
            1 => self.mid,
            _ => self.treble,
        }
    }
}

/// Per-frame analysis summary handed back to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub average: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub peak: f32,
    pub fps: f32,
}

impl AnalysisSummary {
    pub fn from_frame(frame: &FrequencyFrame, bands: BandEnergies, fps: f32) -> Self {
        Self {
            average: frame.average(),
            bass: bands.bass,
            mid: bands.mid,
            treble: bands.treble,
            peak: frame.peak(),
            fps,
        }
    }
}

/// Counts drawn frames and reports the rate over one-second windows.
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    window_start: Option<f64>,
    frames: u32,
    fps: f32,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a frame drawn at `now_ms` and returns the latest measurement.
    /// The frame that opens a window only marks its start; each later frame
    /// counts one interval.
    pub fn record(&mut self, now_ms: f64) -> f32 {
        let Some(start) = self.window_start else {
            self.window_start = Some(now_ms);
            return self.fps;
        };
        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed >= FPS_WINDOW_MS {
            self.fps = (self.frames as f64 * 1000.0 / elapsed) as f32;
            self.frames = 0;
            self.window_start = Some(now_ms);
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bands_at_tenth_and_half() {
        let mut bins = vec![0u8; 100];
        bins[..10].fill(255);
        bins[10..50].fill(51);
        let bands = BandEnergies::from_frame(&FrequencyFrame::new(bins));

        assert!((bands.bass - 1.0).abs() < 1e-6);
        assert!((bands.mid - 0.2).abs() < 1e-6);
        assert_eq!(bands.treble, 0.0);
    }

    #[test]
    fn empty_frames_have_no_energy() {
        let frame = FrequencyFrame::default();
        let bands = BandEnergies::from_frame(&frame);

        assert_eq!(bands, BandEnergies::default());
        assert_eq!(frame.average(), 0.0);
        assert_eq!(frame.linear_sample(3, 8), 0.0);
    }

    #[test]
    fn linear_sampling_spreads_bins_over_elements() {
        let frame = FrequencyFrame::new(vec![0, 128, 255, 64]);

        assert_eq!(frame.linear_sample(2, 4), 1.0);
        assert!((frame.linear_sample(1, 2) - 1.0).abs() < 1e-6);
        assert!((frame.peak() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn manual_source_clones_share_frames() {
        let source = ManualSource::new(4);
        let view = source.clone();
        source.set_frequency(vec![1, 2, 3, 4]);

        assert_eq!(view.frequency_frame().raw(), &[1, 2, 3, 4]);
        assert_eq!(view.bin_count(), 4);
    }

    #[test]
    fn silent_source_reports_zeroes() {
        let source = SilentSource::new(16);
        let frame = source.frequency_frame();

        assert_eq!(frame.len(), 16);
        assert!(frame.raw().iter().all(|v| *v == 0));
        assert!(source.time_frame().samples().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn fps_meter_measures_over_a_second() {
        let mut meter = FpsMeter::new();
        let mut windows = Vec::new();
        for tick in 0..=180 {
            let before = meter.fps();
            let fps = meter.record(tick as f64 * 1000.0 / 60.0);
            if tick > 0 && tick % 60 == 0 {
                windows.push(fps);
            } else {
                assert_eq!(fps, before);
            }
        }

        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|fps| (fps - 60.0).abs() < 0.5), "{windows:?}");
    }
}
