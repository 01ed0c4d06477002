use crate::{
    flat::bar_width,
    visualizer::{smooth, FrameInput, Style},
    ColorPalette, Glow, Surface, VisualizerSettings,
};

const HEIGHT_FILL: f32 = 0.9;
const GLOW_BLUR: f32 = 15.0;

#[derive(Debug, Clone, PartialEq)]
struct BarsParams {
    count: usize,
    gap: f32,
    mirror: bool,
    cap: bool,
    cap_height: f32,
    cap_drop_speed: f32,
    glow: bool,
    smoothing: f32,
    amplification: f32,
}

impl BarsParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            count: settings.count("barCount", 64),
            gap: settings.float("barGap", 2.0).max(0.0),
            mirror: settings.boolean("mirror", false),
            cap: settings.boolean("cap", true),
            cap_height: settings.float("capHeight", 3.0).max(0.0),
            cap_drop_speed: settings.float("capDropSpeed", 0.005).max(0.0),
            glow: settings.boolean("glow", false),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Linear or mirrored frequency bars with falling peak caps.
#[derive(Debug, Clone)]
pub struct Bars {
    params: BarsParams,
    heights: Vec<f32>,
    caps: Vec<f32>,
}

impl Bars {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = BarsParams::from_settings(settings);
        Self {
            heights: vec![0.0; params.count],
            caps: vec![0.0; params.count],
            params,
        }
    }

    /// Smoothed, amplified bar heights; 1.0 is full scale.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn caps(&self) -> &[f32] {
        &self.caps
    }

    fn bar_rects(&self, width: f32) -> Vec<(f32, f32)> {
        let count = self.params.count;
        let gap = self.params.gap;
        if self.params.mirror {
            let half = width / 2.0;
            let bar = bar_width(half, count, gap);
            (0..count)
                .flat_map(|i| {
                    let offset = i as f32 * (bar + gap);
                    [(half + offset, bar), (half - offset - bar, bar)]
                })
                .collect()
        } else {
            let bar = bar_width(width, count, gap);
            (0..count).map(|i| (i as f32 * (bar + gap), bar)).collect()
        }
    }
}

impl Style for Bars {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = BarsParams::from_settings(settings);
        self.heights.resize(self.params.count, 0.0);
        self.caps.resize(self.params.count, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.params.count;
        let drop = self.params.cap_drop_speed * input.step();
        for i in 0..count {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            let height = smooth(self.heights[i], target, self.params.smoothing);
            self.heights[i] = height;

            let cap = &mut self.caps[i];
            if height >= *cap {
                *cap = height;
            } else {
                *cap = (*cap - drop).max(height).max(0.0);
            }
        }
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let size = surface.size();
        let rects = self.bar_rects(size.width);
        let per_bar = if self.params.mirror { 2 } else { 1 };

        if self.params.glow {
            surface.set_glow(Some(Glow {
                blur: GLOW_BLUR,
                color: palette.color(0),
            }));
        }

        for (index, (x, bar)) in rects.into_iter().enumerate() {
            let i = index / per_bar;
            let color = palette.gradient(i as f32 / self.params.count as f32);
            let height = self.heights[i].clamp(0.0, 1.0) * size.height * HEIGHT_FILL;
            surface.fill_rect(x, size.height - height, bar, height, color);

            if self.params.cap && self.caps[i] > 0.0 {
                let cap_y = size.height - self.caps[i].clamp(0.0, 1.0) * size.height * HEIGHT_FILL;
                surface.fill_rect(
                    x,
                    cap_y - self.params.cap_height - 1.0,
                    bar,
                    self.params.cap_height,
                    color.shade(1.3),
                );
            }
        }

        if self.params.glow {
            surface.set_glow(None);
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.heights.iter().chain(&self.caps).copied().collect()
    }
}
