use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, SurfaceSize, VisualizerSettings};

/// Host input contract: which style to run, with what colors and settings,
/// on a surface of what size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub style: String,
    pub colors: Vec<String>,
    pub settings: VisualizerSettings,
    pub width: u32,
    pub height: u32,
    pub interactive_mode: bool,
    pub analyser: AnalyserConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            style: "bars".to_string(),
            colors: Vec::new(),
            settings: VisualizerSettings::new(),
            width: 1280,
            height: 720,
            interactive_mode: false,
            analyser: AnalyserConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width as f32, self.height as f32)
    }

    /// Settings with `interactiveMode` folded in, as a visualizer sees them.
    pub fn effective_settings(&self) -> VisualizerSettings {
        let mut settings = self.settings.clone();
        if self.interactive_mode {
            settings.set("interactiveMode", true);
        }
        settings
    }
}

/// Configuration of the FFT analyser node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyserConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}
