use std::{
    collections::VecDeque,
    f32::consts::PI,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{
    AnalyserConfig, AnalysisSource, FrequencyFrame, Result, TimeFrame, VisualiserError,
};

/// FFT analyser over the most recent `fft_size` PCM samples.
///
/// Output follows the familiar browser analyser node: Blackman window,
/// magnitudes scaled by `1 / fft_size`, temporal smoothing per bin, then a dB
/// range mapped linearly onto `[0, 255]`.
pub struct AnalyserNode {
    config: AnalyserConfig,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
    window: Vec<f32>,
    fft: FftResources,
}

impl AnalyserNode {
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        let size = config.fft_size;
        if size < 32 || !size.is_power_of_two() {
            return Err(VisualiserError::InvalidSetting {
                key: "fftSize".to_string(),
                reason: format!("{size} is not a power of two >= 32"),
            });
        }

        let fft = FftResources::new(size);
        Ok(Self {
            history: VecDeque::from(vec![0.0; size]),
            smoothed: vec![0.0; size / 2],
            window: blackman_window(size),
            config,
            fft,
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Appends PCM samples, keeping only the newest `fft_size` of them.
    pub fn process_block(&mut self, samples: &[f32]) {
        let size = self.config.fft_size;
        let skip = samples.len().saturating_sub(size);
        for sample in &samples[skip..] {
            if self.history.len() == size {
                self.history.pop_front();
            }
            self.history.push_back(sample.clamp(-1.0, 1.0));
        }
    }

    /// Clears the sample history and the smoothing state.
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|sample| *sample = 0.0);
        self.smoothed.iter_mut().for_each(|value| *value = 0.0);
    }

    pub fn frequency_frame(&mut self) -> Result<FrequencyFrame> {
        let size = self.config.fft_size;
        for (index, (slot, sample)) in self.fft.input.iter_mut().zip(&self.history).enumerate() {
            *slot = *sample * self.window[index];
        }

        self.fft
            .plan
            .process_with_scratch(&mut self.fft.input, &mut self.fft.spectrum, &mut self.fft.scratch)
            .map_err(|err| VisualiserError::msg(format!("fft failed: {err}")))?;

        let tau = self.config.smoothing_time_constant.clamp(0.0, 1.0);
        let range = (self.config.max_decibels - self.config.min_decibels).max(f32::EPSILON);
        let bins = self
            .smoothed
            .iter_mut()
            .zip(&self.fft.spectrum)
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() / size as f32;
                *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
                let db = 20.0 * smoothed.max(1e-12).log10();
                let scaled = 255.0 * (db - self.config.min_decibels) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect();

        Ok(FrequencyFrame::new(bins))
    }

    pub fn time_frame(&self) -> TimeFrame {
        TimeFrame::new(self.history.iter().copied().collect())
    }
}

impl fmt::Debug for AnalyserNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyserNode")
            .field("config", &self.config)
            .field("history", &self.history.len())
            .finish()
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);
        Self {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

/// High level audio façade: owns the analyser that capture code feeds.
#[derive(Debug, Clone)]
pub struct AudioEngine {
    analyser: Arc<Mutex<AnalyserNode>>,
}

impl AudioEngine {
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        let analyser = AnalyserNode::new(config)?;
        Ok(Self {
            analyser: Arc::new(Mutex::new(analyser)),
        })
    }

    /// Resets the analyser and returns a handle the engine can read from.
    pub fn start(&self) -> Result<AnalysisHandle> {
        self.lock()?.reset();
        Ok(AnalysisHandle {
            shared: self.analyser.clone(),
        })
    }

    /// Feeds a block of mono samples. Capture callbacks call this repeatedly.
    pub fn push_samples(&self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        self.lock()?.process_block(samples);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, AnalyserNode>> {
        self.analyser
            .lock()
            .map_err(|_| VisualiserError::msg("analyser has been poisoned"))
    }
}

/// Shared view over the analyser managed by [`AudioEngine`].
#[derive(Clone)]
pub struct AnalysisHandle {
    shared: Arc<Mutex<AnalyserNode>>,
}

impl AnalysisHandle {
    fn with_analyser<T>(&self, silent: impl FnOnce(usize) -> T, read: impl FnOnce(&mut AnalyserNode) -> Result<T>) -> T {
        let Ok(mut analyser) = self.shared.lock() else {
            tracing::warn!("analyser lock poisoned; returning silence");
            return silent(crate::analysis::DEFAULT_BIN_COUNT);
        };
        let bins = analyser.bin_count();
        match read(&mut analyser) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "analyser read failed; returning silence");
                silent(bins)
            }
        }
    }
}

impl AnalysisSource for AnalysisHandle {
    fn frequency_frame(&self) -> FrequencyFrame {
        self.with_analyser(FrequencyFrame::silent, |analyser| analyser.frequency_frame())
    }

    fn time_frame(&self) -> TimeFrame {
        self.with_analyser(|bins| TimeFrame::silent(bins * 2), |analyser| Ok(analyser.time_frame()))
    }

    fn bin_count(&self) -> usize {
        self.shared
            .lock()
            .map(|analyser| analyser.bin_count())
            .unwrap_or(crate::analysis::DEFAULT_BIN_COUNT)
    }
}

impl fmt::Debug for AnalysisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisHandle").finish()
    }
}

fn blackman_window(len: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    (0..len)
        .map(|i| {
            let x = i as f32 / len as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fft_size: usize) -> AnalyserConfig {
        AnalyserConfig {
            fft_size,
            smoothing_time_constant: 0.0,
            ..AnalyserConfig::default()
        }
    }

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn silence_maps_to_zero_bins() {
        let audio = AudioEngine::new(config(256)).unwrap();
        let handle = audio.start().unwrap();
        let frame = handle.frequency_frame();

        assert_eq!(frame.len(), 128);
        assert!(frame.raw().iter().all(|v| *v == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let cfg = AnalyserConfig {
            max_decibels: 0.0,
            ..config(1024)
        };
        let sample_rate = cfg.sample_rate as f32;
        let audio = AudioEngine::new(cfg).unwrap();
        let handle = audio.start().unwrap();

        let bin_hz = sample_rate / 1024.0;
        audio.push_samples(&sine(bin_hz * 40.0, sample_rate, 1024)).unwrap();
        let frame = handle.frequency_frame();

        let loudest = frame
            .raw()
            .iter()
            .enumerate()
            .max_by_key(|(_, value)| **value)
            .map(|(index, _)| index)
            .unwrap();
        assert_eq!(loudest, 40);
        assert!(frame.raw()[40] > 200);
    }

    #[test]
    fn time_frame_keeps_newest_samples() {
        let audio = AudioEngine::new(config(64)).unwrap();
        let handle = audio.start().unwrap();
        audio.push_samples(&vec![0.25; 100]).unwrap();
        audio.push_samples(&[2.0]).unwrap();

        let frame = handle.time_frame();
        assert_eq!(frame.len(), 64);
        assert_eq!(frame.samples()[63], 1.0);
        assert_eq!(frame.samples()[0], 0.25);
    }

    #[test]
    fn rejects_invalid_fft_sizes() {
        assert!(AnalyserNode::new(config(1000)).is_err());
        assert!(AnalyserNode::new(config(16)).is_err());
    }
}
