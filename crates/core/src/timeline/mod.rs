//! Frame pacing and the scheduler that owns the running visualizer.
//!
//! The host calls [`FrameScheduler::tick`] once per display refresh. The
//! scheduler never lets a per-tick failure escape: errors are logged and the
//! next tick simply tries again.

use std::{rc::Rc, time::Instant};

use crate::{
    AnalysisSource, AnalysisSummary, ColorPalette, EngineConfig, EventHub, InputEvent, Lifecycle,
    SettingValue, StyleId, Surface, SurfaceSize, Visualizer, VisualizerSettings,
};

const DEFAULT_DT: f32 = 1.0 / 60.0;
const MAX_DT: f32 = 0.1;

/// Per-tick delta tracker. The first tick assumes one 60 Hz frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    dt: f32,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_ms: None,
            dt: DEFAULT_DT,
            frames: 0,
        }
    }

    /// Records a tick at `now_ms` and returns its delta in seconds, clamped
    /// to `[0, MAX_DT]`.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        self.dt = match self.last_ms {
            Some(last) => ((now_ms - last) as f32 / 1000.0).clamp(0.0, MAX_DT),
            None => DEFAULT_DT,
        };
        self.last_ms = Some(now_ms);
        self.frames += 1;
        self.dt
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Drives one visualizer at a time and owns its teardown and recreation.
pub struct FrameScheduler {
    hub: EventHub,
    epoch: Instant,
    ticks: u64,
    source: Option<Rc<dyn AnalysisSource>>,
    colors: Vec<String>,
    settings: VisualizerSettings,
    size: SurfaceSize,
    visualizer: Option<Visualizer>,
    running: bool,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            hub: EventHub::new(),
            epoch: Instant::now(),
            ticks: 0,
            source: None,
            colors: Vec::new(),
            settings: VisualizerSettings::new(),
            size: SurfaceSize::new(0.0, 0.0),
            visualizer: None,
            running: false,
        }
    }

    /// Starts the style named in `config`. Unknown names fall back to the
    /// default style; an initialisation failure is retried on the next tick.
    pub fn start(&mut self, config: &EngineConfig, source: Option<Rc<dyn AnalysisSource>>) -> StyleId {
        self.stop();
        self.source = source;
        self.colors = config.colors.clone();
        self.settings = config.effective_settings();
        self.size = config.surface_size();
        self.ticks = 0;
        self.running = true;
        self.launch(&config.style)
    }

    /// Replaces the running style. The old visualizer is destroyed first.
    pub fn set_style(&mut self, name: &str) -> StyleId {
        if let Some(mut old) = self.visualizer.take() {
            old.destroy();
        }
        self.launch(name)
    }

    fn launch(&mut self, name: &str) -> StyleId {
        let (style, err) = StyleId::resolve(name);
        if let Some(err) = err {
            tracing::warn!(%err, fallback = %style, "style not found; using fallback");
        }
        self.visualizer = Some(Visualizer::new(style));
        tracing::info!(style = %style, "style selected");
        if self.running {
            self.try_initialize(self.size);
        }
        style
    }

    fn try_initialize(&mut self, size: SurfaceSize) -> bool {
        let Some(visualizer) = self.visualizer.as_mut() else {
            return false;
        };
        if visualizer.lifecycle() == Lifecycle::Running {
            return true;
        }
        if visualizer.lifecycle() == Lifecycle::Destroyed {
            *visualizer = Visualizer::new(visualizer.style());
        }
        let palette = ColorPalette::new(self.colors.as_slice());
        match visualizer.initialize(&self.hub, size, self.source.clone(), palette, &self.settings) {
            Ok(()) => {
                self.size = size;
                true
            }
            Err(err) => {
                tracing::warn!(style = %visualizer.style(), %err, "visualizer initialisation failed; will retry");
                false
            }
        }
    }

    /// Draws one frame. Returns `None` when stopped or when the tick failed.
    pub fn tick(&mut self, surface: &mut dyn Surface, now_ms: f64) -> Option<AnalysisSummary> {
        if !self.running {
            return None;
        }
        self.ticks += 1;
        if !self.try_initialize(surface.size()) {
            return None;
        }
        let visualizer = self.visualizer.as_mut()?;
        match visualizer.draw(surface, now_ms) {
            Ok(summary) => Some(summary),
            Err(err) => {
                tracing::warn!(style = %visualizer.style(), %err, "frame failed");
                None
            }
        }
    }

    /// [`tick`](Self::tick) stamped with milliseconds since the scheduler
    /// was created.
    pub fn tick_now(&mut self, surface: &mut dyn Surface) -> Option<AnalysisSummary> {
        let now = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.tick(surface, now)
    }

    /// Updates one setting live. The value is kept for later restarts of
    /// the same session.
    pub fn update_setting(&mut self, key: &str, value: impl Into<SettingValue>) -> bool {
        let value = value.into();
        self.settings.set(key, value.clone());
        let Some(visualizer) = self.visualizer.as_mut() else {
            return false;
        };
        match visualizer.update_setting(key, value) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(key, %err, "setting rejected");
                false
            }
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = SurfaceSize::new(width, height);
        if let Some(visualizer) = self.visualizer.as_mut() {
            if visualizer.lifecycle() == Lifecycle::Running {
                if let Err(err) = visualizer.resize(width, height) {
                    tracing::warn!(width, height, %err, "resize failed");
                }
            }
        }
    }

    /// Forwards a host event; returns whether a listener consumed it.
    pub fn handle_event(&mut self, event: &InputEvent, now_ms: f64) -> bool {
        if let InputEvent::Resize { width, height } = *event {
            self.size = SurfaceSize::new(width, height);
        }
        let Some(visualizer) = self.visualizer.as_mut() else {
            return false;
        };
        match visualizer.handle_event(event, now_ms) {
            Ok(handled) => handled,
            Err(err) => {
                tracing::warn!(?event, %err, "event handling failed");
                false
            }
        }
    }

    /// Stops ticking and destroys the visualizer before returning.
    pub fn stop(&mut self) {
        if let Some(mut visualizer) = self.visualizer.take() {
            visualizer.destroy();
        }
        if self.running {
            tracing::info!(ticks = self.ticks, "scheduler stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn style(&self) -> Option<StyleId> {
        self.visualizer.as_ref().map(Visualizer::style)
    }

    pub fn visualizer(&self) -> Option<&Visualizer> {
        self.visualizer.as_ref()
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Ticks issued since the last `start`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("running", &self.running)
            .field("size", &self.size)
            .field("visualizer", &self.visualizer)
            .finish()
    }
}
