//! Core library of the reactive visualiser.
//!
//! The engine consumes an [`AnalysisSource`] and a 2D [`Surface`] and draws
//! one of the 2D or 3D styles per display refresh. Each module owns one
//! subsystem: analysis buffers and the FFT analyser, style settings, the 2D
//! style family, the camera-projected 3D family, and the [`FrameScheduler`]
//! that hosts drive once per tick.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod flat;
pub mod palette;
pub mod render;
pub mod scene;
pub mod settings;
pub mod spatial;
pub mod timeline;
pub mod visualizer;

pub use analysis::{
    AnalysisSource, AnalysisSummary, BandEnergies, FpsMeter, FrequencyFrame, ManualSource,
    SilentSource, TimeFrame,
};
pub use audio::{AnalyserNode, AnalysisHandle, AudioEngine};
pub use config::{AnalyserConfig, EngineConfig};
pub use error::{Result, VisualiserError};
pub use events::{EventHub, EventKind, InputEvent, Subscription};
pub use palette::{Color, ColorPalette};
pub use render::{DrawCommand, Glow, Point, RecordingSurface, Surface, SurfaceSize};
pub use scene::{Dimension, StyleId};
pub use settings::{defaults_for, SettingValue, VisualizerSettings};
pub use timeline::{FrameClock, FrameScheduler};
pub use visualizer::{Lifecycle, Visualizer};
