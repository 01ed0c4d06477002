//! Per-style lifecycle shared by every 2D and 3D style.
//!
//! A [`Visualizer`] moves `Created → Running → Destroyed`. While running it
//! pulls one frequency and one time frame per `draw`, hands them to the
//! active style's update step and then lets the style paint.

use std::rc::Rc;

use crate::{
    defaults_for, flat::FlatStyle, settings::MAX_SMOOTHING, spatial::SpatialScene,
    AnalysisSource, AnalysisSummary, BandEnergies, Color, ColorPalette, EventHub, EventKind,
    FpsMeter, FrequencyFrame, InputEvent, Result, SettingValue, StyleId, Subscription, Surface,
    SurfaceSize, TimeFrame, VisualiserError, VisualizerSettings,
};
use crate::timeline::FrameClock;

/// Exponential smoothing step: `s + (v - s) * (1 - smoothing)`.
///
/// `smoothing` is clamped to `[0, 0.95]`; zero follows the input exactly.
pub fn smooth(current: f32, target: f32, smoothing: f32) -> f32 {
    let smoothing = smoothing.clamp(0.0, MAX_SMOOTHING);
    current + (target - current) * (1.0 - smoothing)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    Destroyed,
}

/// Everything a style sees for one tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub frequency: &'a FrequencyFrame,
    pub time: &'a TimeFrame,
    pub bands: BandEnergies,
    pub average: f32,
    pub now_ms: f64,
    /// Seconds since the previous tick, clamped to 100 ms.
    pub dt: f32,
    pub size: SurfaceSize,
}

impl<'a> FrameInput<'a> {
    /// Elapsed time in 60 Hz ticks; per-tick speeds are multiplied by this.
    pub fn step(&self) -> f32 {
        self.dt * 60.0
    }
}

/// The update/draw contract every style implements.
pub(crate) trait Style {
    /// Re-reads parameters. Count changes re-derive per-element arrays.
    fn configure(&mut self, settings: &VisualizerSettings);

    /// Rescales resolution-dependent state without changing topology.
    fn resize(&mut self, _old: SurfaceSize, _new: SurfaceSize) {}

    fn update(&mut self, input: &FrameInput<'_>);

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette);

    /// Every smoothed scalar the style tracks.
    fn tracked_values(&self) -> Vec<f32>;

    fn handle_input(&mut self, _event: &InputEvent, _now_ms: f64) {}
}

pub(crate) enum StyleState {
    Flat(FlatStyle),
    Spatial(Box<SpatialScene>),
}

impl StyleState {
    fn new(style: StyleId, settings: &VisualizerSettings, size: SurfaceSize) -> Self {
        if style.is_spatial() {
            StyleState::Spatial(Box::new(SpatialScene::new(style, settings, size)))
        } else {
            StyleState::Flat(FlatStyle::new(style, settings, size))
        }
    }

    fn as_style(&self) -> &dyn Style {
        match self {
            StyleState::Flat(style) => style,
            StyleState::Spatial(scene) => scene.as_ref(),
        }
    }

    fn as_style_mut(&mut self) -> &mut dyn Style {
        match self {
            StyleState::Flat(style) => style,
            StyleState::Spatial(scene) => scene.as_mut(),
        }
    }
}

pub struct Visualizer {
    style: StyleId,
    lifecycle: Lifecycle,
    defaults: VisualizerSettings,
    settings: VisualizerSettings,
    palette: ColorPalette,
    size: SurfaceSize,
    source: Option<Rc<dyn AnalysisSource>>,
    bin_count: usize,
    time_len: usize,
    state: Option<StyleState>,
    subscriptions: Vec<Subscription>,
    fps: FpsMeter,
    clock: FrameClock,
    summary: AnalysisSummary,
}

impl Visualizer {
    pub fn new(style: StyleId) -> Self {
        let defaults = defaults_for(style);
        Self {
            style,
            lifecycle: Lifecycle::Created,
            settings: defaults.clone(),
            defaults,
            palette: ColorPalette::default(),
            size: SurfaceSize::new(0.0, 0.0),
            source: None,
            bin_count: 0,
            time_len: 0,
            state: None,
            subscriptions: Vec::new(),
            fps: FpsMeter::new(),
            clock: FrameClock::new(),
            summary: AnalysisSummary::default(),
        }
    }

    pub fn style(&self) -> StyleId {
        self.style
    }

    /// Pacing of the draws issued since the last `initialize`.
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn settings(&self) -> &VisualizerSettings {
        &self.settings
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn summary(&self) -> AnalysisSummary {
        self.summary
    }

    /// Moves `Created → Running`. On failure the visualizer stays `Created`
    /// and any listener registered along the way is released.
    pub fn initialize(
        &mut self,
        hub: &EventHub,
        size: SurfaceSize,
        source: Option<Rc<dyn AnalysisSource>>,
        palette: ColorPalette,
        settings: &VisualizerSettings,
    ) -> Result<()> {
        if self.lifecycle != Lifecycle::Created {
            return Err(VisualiserError::InvalidState(
                "initialize requires a freshly created visualizer",
            ));
        }

        let merged = VisualizerSettings::overlay(&self.defaults, settings);
        let mut subscriptions = vec![hub.subscribe(EventKind::Resize)];
        if self.style.is_spatial() && merged.boolean("interactiveMode", false) {
            subscriptions.push(hub.subscribe(EventKind::Pointer));
            subscriptions.push(hub.subscribe(EventKind::Wheel));
            subscriptions.push(hub.subscribe(EventKind::Touch));
        }

        if !size.is_drawable() {
            return Err(VisualiserError::init(format!(
                "drawing surface is unavailable ({}x{})",
                size.width, size.height
            )));
        }
        let source = source.ok_or_else(|| VisualiserError::init("no analysis source attached"))?;
        let bin_count = source.bin_count();
        if bin_count == 0 {
            return Err(VisualiserError::init("analysis source reports zero bins"));
        }

        self.time_len = match source.time_frame().len() {
            0 => bin_count * 2,
            len => len,
        };
        self.bin_count = bin_count;
        self.source = Some(source);
        self.state = Some(StyleState::new(self.style, &merged, size));
        self.settings = merged;
        self.palette = palette;
        self.size = size;
        self.subscriptions = subscriptions;
        self.fps.reset();
        self.clock.reset();
        self.lifecycle = Lifecycle::Running;

        tracing::info!(style = %self.style, bins = bin_count, "visualizer running");
        Ok(())
    }

    /// Rescales resolution-dependent state; topology is untouched.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<()> {
        if self.lifecycle != Lifecycle::Running {
            return Err(VisualiserError::InvalidState("resize requires a running visualizer"));
        }
        let new = SurfaceSize::new(width, height);
        if !new.is_drawable() {
            return Err(VisualiserError::msg(format!("cannot resize to {width}x{height}")));
        }
        if new == self.size {
            return Ok(());
        }

        let old = self.size;
        self.size = new;
        if let Some(state) = self.state.as_mut() {
            state.as_style_mut().resize(old, new);
        }
        tracing::debug!(style = %self.style, width, height, "visualizer resized");
        Ok(())
    }

    /// Changes one setting. Keys the style does not declare are ignored and
    /// reported as `Ok(false)`.
    pub fn update_setting(&mut self, key: &str, value: impl Into<SettingValue>) -> Result<bool> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(VisualiserError::InvalidState("visualizer has been destroyed"));
        }
        let changed = self.settings.update(&self.defaults, key, value.into())?;
        if changed {
            if let Some(state) = self.state.as_mut() {
                state.as_style_mut().configure(&self.settings);
            }
        }
        Ok(changed)
    }

    /// Draws one frame. Only valid while running.
    pub fn draw(&mut self, surface: &mut dyn Surface, now_ms: f64) -> Result<AnalysisSummary> {
        if self.lifecycle != Lifecycle::Running {
            return Err(VisualiserError::InvalidState("draw requires a running visualizer"));
        }

        let surface_size = surface.size();
        if surface_size != self.size {
            self.resize(surface_size.width, surface_size.height)?;
        }

        let (frequency, time) = self.pull_frames()?;
        let dt = self.clock.advance(now_ms);

        let bands = BandEnergies::from_frame(&frequency);
        let input = FrameInput {
            frequency: &frequency,
            time: &time,
            bands,
            average: frequency.average(),
            now_ms,
            dt,
            size: self.size,
        };

        let state = self
            .state
            .as_mut()
            .ok_or(VisualiserError::InvalidState("running visualizer has no style state"))?;
        let style = state.as_style_mut();
        style.update(&input);
        surface.clear(Color::BLACK);
        style.draw(surface, &self.palette);

        let fps = self.fps.record(now_ms);
        self.summary = AnalysisSummary::from_frame(&frequency, bands, fps);
        Ok(self.summary)
    }

    /// Routes a host event to the style if a matching listener is registered.
    pub fn handle_event(&mut self, event: &InputEvent, now_ms: f64) -> Result<bool> {
        if self.lifecycle != Lifecycle::Running {
            return Ok(false);
        }
        let kind = event.kind();
        let subscribed = self
            .subscriptions
            .iter()
            .any(|subscription| subscription.kind() == kind && subscription.is_active());
        if !subscribed {
            return Ok(false);
        }

        match event {
            InputEvent::Resize { width, height } => self.resize(*width, *height)?,
            _ => {
                if let Some(state) = self.state.as_mut() {
                    state.as_style_mut().handle_input(event, now_ms);
                }
            }
        }
        Ok(true)
    }

    /// Moves to `Destroyed`, releasing listeners and state. Idempotent.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.subscriptions.clear();
        self.state = None;
        self.source = None;
        self.lifecycle = Lifecycle::Destroyed;
        tracing::info!(style = %self.style, "visualizer destroyed");
    }

    /// Smoothed values tracked by the active style.
    pub fn tracked_values(&self) -> Vec<f32> {
        self.state
            .as_ref()
            .map(|state| state.as_style().tracked_values())
            .unwrap_or_default()
    }

    pub(crate) fn state(&self) -> Option<&StyleState> {
        self.state.as_ref()
    }

    fn pull_frames(&self) -> Result<(FrequencyFrame, TimeFrame)> {
        let source = self
            .source
            .as_ref()
            .ok_or(VisualiserError::InvalidState("running visualizer has no source"))?;

        let mut frequency = source.frequency_frame();
        if frequency.len() != self.bin_count {
            tracing::debug!(
                len = frequency.len(),
                expected = self.bin_count,
                "frequency frame gap; drawing silence"
            );
            frequency = FrequencyFrame::silent(self.bin_count);
        }

        let mut time = source.time_frame();
        if time.len() != self.time_len {
            tracing::debug!(
                len = time.len(),
                expected = self.time_len,
                "time frame gap; drawing silence"
            );
            time = TimeFrame::silent(self.time_len);
        }
        Ok((frequency, time))
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Visualizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visualizer")
            .field("style", &self.style)
            .field("lifecycle", &self.lifecycle)
            .field("size", &self.size)
            .field("bin_count", &self.bin_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualSource, RecordingSurface, SilentSource};

    const WIDTH: f32 = 320.0;
    const HEIGHT: f32 = 240.0;

    fn running(style: StyleId, source: Rc<dyn AnalysisSource>, settings: &VisualizerSettings) -> (Visualizer, EventHub) {
        let hub = EventHub::new();
        let mut visualizer = Visualizer::new(style);
        visualizer
            .initialize(
                &hub,
                SurfaceSize::new(WIDTH, HEIGHT),
                Some(source),
                ColorPalette::default(),
                settings,
            )
            .expect("initialize");
        (visualizer, hub)
    }

    #[test]
    fn smoothing_is_idempotent_under_constant_input() {
        let mut value = 0.0;
        for _ in 0..400 {
            value = smooth(value, 0.7, 0.9);
        }
        let settled = smooth(0.7, 0.7, 0.9);

        assert_eq!(settled, 0.7);
        assert!((value - 0.7).abs() < 1e-4);
        assert_eq!(smooth(0.2, 0.9, 0.0), 0.9);
        assert_eq!(smooth(0.2, 0.9, 5.0), smooth(0.2, 0.9, MAX_SMOOTHING));
    }

    #[test]
    fn lifecycle_transitions() {
        let source: Rc<dyn AnalysisSource> = Rc::new(SilentSource::new(64));
        let (mut visualizer, hub) = running(StyleId::Bars, source, &VisualizerSettings::new());
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);

        assert_eq!(visualizer.lifecycle(), Lifecycle::Running);
        assert_eq!(hub.listener_count(), 1);
        assert!(visualizer.draw(&mut surface, 0.0).is_ok());

        visualizer.destroy();
        visualizer.destroy();
        assert_eq!(visualizer.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(hub.listener_count(), 0);
        assert!(visualizer.draw(&mut surface, 16.0).is_err());
        assert!(visualizer.resize(100.0, 100.0).is_err());
    }

    #[test]
    fn failed_initialize_releases_listeners() {
        let hub = EventHub::new();
        let mut visualizer = Visualizer::new(StyleId::Sphere);
        let settings = VisualizerSettings::new().with("interactiveMode", true);

        let err = visualizer
            .initialize(&hub, SurfaceSize::new(WIDTH, HEIGHT), None, ColorPalette::default(), &settings)
            .unwrap_err();

        assert!(matches!(err, VisualiserError::Initialization(_)));
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(visualizer.lifecycle(), Lifecycle::Created);

        let err = visualizer
            .initialize(
                &hub,
                SurfaceSize::new(0.0, 0.0),
                Some(Rc::new(SilentSource::default())),
                ColorPalette::default(),
                &settings,
            )
            .unwrap_err();
        assert!(matches!(err, VisualiserError::Initialization(_)));
    }

    #[test]
    fn interactive_spatial_styles_register_pointer_listeners() {
        let source: Rc<dyn AnalysisSource> = Rc::new(SilentSource::new(64));
        let settings = VisualizerSettings::new().with("interactiveMode", true);
        let (mut visualizer, hub) = running(StyleId::Sphere, source, &settings);

        assert!(hub.has_listener(EventKind::Pointer));
        assert!(visualizer
            .handle_event(&InputEvent::PointerDown { x: 1.0, y: 1.0 }, 0.0)
            .unwrap());
        visualizer.destroy();
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn pointer_events_are_ignored_without_interactive_mode() {
        let source: Rc<dyn AnalysisSource> = Rc::new(SilentSource::new(64));
        let (mut visualizer, _hub) = running(StyleId::Sphere, source, &VisualizerSettings::new());

        assert!(!visualizer
            .handle_event(&InputEvent::PointerDown { x: 1.0, y: 1.0 }, 0.0)
            .unwrap());
        assert!(visualizer
            .handle_event(&InputEvent::Resize { width: 640.0, height: 480.0 }, 0.0)
            .unwrap());
        assert_eq!(visualizer.size(), SurfaceSize::new(640.0, 480.0));
    }

    #[test]
    fn every_style_decays_to_rest_on_silence() {
        for style in StyleId::ALL {
            let source = ManualSource::new(64);
            source.set_level(200);
            source.set_time((0..128).map(|i| ((i as f32) * 0.3).sin()).collect());
            let shared: Rc<dyn AnalysisSource> = Rc::new(source.clone());
            let (mut visualizer, _hub) = running(*style, shared, &VisualizerSettings::new());
            let mut surface = RecordingSurface::new(WIDTH, HEIGHT);

            for tick in 0..20 {
                visualizer.draw(&mut surface, tick as f64 * 16.0).unwrap();
            }
            source.set_level(0);
            source.set_time(vec![0.0; 128]);

            let mut previous = visualizer.tracked_values();
            for tick in 20..400 {
                visualizer.draw(&mut surface, tick as f64 * 16.0).unwrap();
                surface.take_commands();
                let current = visualizer.tracked_values();
                assert_eq!(current.len(), previous.len(), "{style}");
                for (now, before) in current.iter().zip(&previous) {
                    assert!(now.abs() <= before.abs() + 1e-6, "{style} grew: {before} -> {now}");
                }
                previous = current;
            }
            assert!(
                previous.iter().all(|value| value.abs() < 1e-3),
                "{style} did not settle: {:?}",
                previous.iter().cloned().fold(0.0f32, f32::max)
            );
        }
    }

    #[test]
    fn short_frames_are_treated_as_silence() {
        let source = ManualSource::new(64);
        let shared: Rc<dyn AnalysisSource> = Rc::new(source.clone());
        let settings = VisualizerSettings::new().with("smoothing", 0.0);
        let (mut visualizer, _hub) = running(StyleId::Bars, shared, &settings);
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);

        source.set_frequency(vec![255; 10]);
        source.set_time(Vec::new());
        let summary = visualizer.draw(&mut surface, 0.0).unwrap();

        assert_eq!(summary.peak, 0.0);
        assert!(visualizer.tracked_values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn truncated_time_frames_are_replaced_by_silence() {
        let source = ManualSource::new(64);
        let shared: Rc<dyn AnalysisSource> = Rc::new(source.clone());
        let (visualizer, _hub) = running(StyleId::Wave, shared, &VisualizerSettings::new());

        source.set_time(vec![1.0; 10]);
        let (_, time) = visualizer.pull_frames().unwrap();
        assert_eq!(time.len(), 128);
        assert!(time.samples().iter().all(|v| *v == 0.0));

        source.set_time(vec![0.5; 128]);
        let (_, time) = visualizer.pull_frames().unwrap();
        assert!(time.samples().iter().all(|v| *v == 0.5));
    }

    #[test]
    fn draw_paces_with_a_clamped_delta() {
        let source: Rc<dyn AnalysisSource> = Rc::new(SilentSource::new(64));
        let (mut visualizer, _hub) = running(StyleId::Bars, source, &VisualizerSettings::new());
        let mut surface = RecordingSurface::new(WIDTH, HEIGHT);

        visualizer.draw(&mut surface, 0.0).unwrap();
        assert!((visualizer.clock().dt() - 1.0 / 60.0).abs() < 1e-6);
        visualizer.draw(&mut surface, 20.0).unwrap();
        assert!((visualizer.clock().dt() - 0.02).abs() < 1e-6);
        visualizer.draw(&mut surface, 5_000.0).unwrap();
        assert!((visualizer.clock().dt() - 0.1).abs() < 1e-6);
        assert_eq!(visualizer.clock().frames(), 3);
    }

    #[test]
    fn unknown_update_keys_are_ignored() {
        let source: Rc<dyn AnalysisSource> = Rc::new(SilentSource::new(64));
        let (mut visualizer, _hub) = running(StyleId::Bars, source, &VisualizerSettings::new());

        assert!(!visualizer.update_setting("ringSpeed", 3).unwrap());
        assert!(visualizer.update_setting("barCount", 16).unwrap());
        assert_eq!(visualizer.tracked_values().len(), 32);
    }
}
