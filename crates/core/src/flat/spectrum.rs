use crate::{
    flat::bar_width,
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, FrequencyFrame, Surface, VisualizerSettings,
};

const HEIGHT_FILL: f32 = 0.85;
const PEAK_THICKNESS: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
struct SpectrumParams {
    bands: usize,
    log_scale: bool,
    peak_hold: bool,
    peak_hold_ms: f64,
    peak_decay: f32,
    gap: f32,
    smoothing: f32,
    amplification: f32,
}

impl SpectrumParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            bands: settings.count("bands", 32),
            log_scale: settings.boolean("logScale", true),
            peak_hold: settings.boolean("peakHold", true),
            peak_hold_ms: settings.float("peakHoldTime", 500.0).max(0.0) as f64,
            peak_decay: settings.float("peakDecay", 0.01).max(0.0),
            gap: settings.float("barGap", 2.0).max(0.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Per-band peak marker that holds for a while before it falls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Peak {
    pub value: f32,
    pub hold_until_ms: f64,
}

/// Banded bars with optional log-frequency mapping and peak hold.
#[derive(Debug, Clone)]
pub struct Spectrum {
    params: SpectrumParams,
    values: Vec<f32>,
    peaks: Vec<Peak>,
}

impl Spectrum {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = SpectrumParams::from_settings(settings);
        Self {
            values: vec![0.0; params.bands],
            peaks: vec![Peak::default(); params.bands],
            params,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    fn band_magnitude(&self, frame: &FrequencyFrame, band: usize) -> f32 {
        let bands = self.params.bands;
        if !self.params.log_scale {
            return frame.linear_sample(band, bands);
        }
        let n = frame.len();
        if n == 0 {
            return 0.0;
        }
        let start = ((band as f32 / bands as f32).powi(2) * n as f32) as usize;
        let end = (((band + 1) as f32 / bands as f32).powi(2) * n as f32) as usize;
        frame.mean(start.min(n - 1), end.max(start + 1))
    }
}

impl Style for Spectrum {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = SpectrumParams::from_settings(settings);
        self.values.resize(self.params.bands, 0.0);
        self.peaks.resize(self.params.bands, Peak::default());
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let decay = self.params.peak_decay * input.step();
        for band in 0..self.params.bands {
            let target = self.band_magnitude(input.frequency, band) * self.params.amplification;
            let value = smooth(self.values[band], target, self.params.smoothing);
            self.values[band] = value;

            let peak = &mut self.peaks[band];
            if value >= peak.value {
                peak.value = value;
                peak.hold_until_ms = input.now_ms + self.params.peak_hold_ms;
            } else if input.now_ms >= peak.hold_until_ms {
                peak.value = (peak.value - decay).max(value).max(0.0);
            }
        }
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let bands = self.params.bands;
        let bar = bar_width(size.width, bands, self.params.gap);
        let full = size.height * HEIGHT_FILL;

        for (band, value) in self.values.iter().enumerate() {
            let x = band as f32 * (bar + self.params.gap);
            let color = palette.gradient(band as f32 / bands as f32);
            let height = value.clamp(0.0, 1.0) * full;
            surface.fill_rect(x, size.height - height, bar, height, color);

            if self.params.peak_hold {
                let peak = self.peaks[band].value.clamp(0.0, 1.0) * full;
                if peak > 0.0 {
                    surface.fill_rect(
                        x,
                        size.height - peak - PEAK_THICKNESS,
                        bar,
                        PEAK_THICKNESS,
                        color.shade(1.4),
                    );
                }
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.values
            .iter()
            .copied()
            .chain(self.peaks.iter().map(|peak| peak.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BandEnergies, SurfaceSize, TimeFrame};

    fn tick(spectrum: &mut Spectrum, frequency: &FrequencyFrame, now_ms: f64) {
        let time = TimeFrame::silent(4);
        spectrum.update(&FrameInput {
            frequency,
            time: &time,
            bands: BandEnergies::from_frame(frequency),
            average: frequency.average(),
            now_ms,
            dt: 1.0 / 60.0,
            size: SurfaceSize::new(320.0, 200.0),
        });
    }

    fn settings() -> VisualizerSettings {
        VisualizerSettings::new()
            .with("bands", 4)
            .with("smoothing", 0.0)
            .with("peakDecay", 0.1)
    }

    #[test]
    fn peak_holds_until_timer_expires() {
        let mut spectrum = Spectrum::new(&settings());
        tick(&mut spectrum, &FrequencyFrame::new(vec![255; 16]), 0.0);
        assert_eq!(spectrum.peaks()[0].value, 1.0);

        let silence = FrequencyFrame::silent(16);
        tick(&mut spectrum, &silence, 400.0);
        assert_eq!(spectrum.values()[0], 0.0);
        assert_eq!(spectrum.peaks()[0].value, 1.0);

        tick(&mut spectrum, &silence, 600.0);
        assert!((spectrum.peaks()[0].value - 0.9).abs() < 1e-5);
    }

    #[test]
    fn log_mapping_favours_low_bins() {
        let mut bins = vec![0u8; 64];
        bins[..4].fill(255);
        let frame = FrequencyFrame::new(bins);

        let mut log = Spectrum::new(&settings());
        tick(&mut log, &frame, 0.0);
        let mut linear = Spectrum::new(&settings().with("logScale", false));
        tick(&mut linear, &frame, 0.0);

        // log: band 0 covers bins [0, 4), linear: band 0 samples bin 0 only
        assert_eq!(log.values()[0], 1.0);
        assert_eq!(log.values()[1], 0.0);
        assert_eq!(linear.values()[0], 1.0);
        assert_eq!(linear.values()[1], 0.0);
    }

    #[test]
    fn band_count_change_resizes_peaks() {
        let mut spectrum = Spectrum::new(&settings());
        spectrum.configure(&settings().with("bands", 10));
        assert_eq!(spectrum.tracked_values().len(), 20);
    }
}
