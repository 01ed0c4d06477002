//! Camera-projected 3D styles.
//!
//! Every 3D style shares one [`Scene3d`]: a projector, a camera pose with
//! autorotation and an optional [`InteractionController`]. Styles only
//! generate geometry into a [`DepthBatch`]; the batch is sorted back to front
//! and painted onto the 2D surface.

pub mod audioscape;
pub mod bars3d;
pub mod camera;
pub mod cube_grid;
pub mod equalizer;
pub mod galaxy3d;
pub mod geometry;
pub mod interaction;
pub mod nebula;
pub mod particles3d;
pub mod primitives;
pub mod rings;
pub mod sphere;
pub mod spiral;
pub mod terrain;
pub mod tunnel;
pub mod vortex;

use std::f32::consts::{FRAC_PI_2, TAU};

use crate::{
    visualizer::{FrameInput, Style},
    ColorPalette, InputEvent, StyleId, Surface, SurfaceSize, VisualizerSettings,
};

pub use audioscape::Audioscape;
pub use bars3d::Bars3d;
pub use camera::{CameraPose, ProjectedPoint, Projector};
pub use cube_grid::CubeGrid;
pub use equalizer::{Equalizer, EqualizerLayout};
pub use galaxy3d::Galaxy3d;
pub use interaction::InteractionController;
pub use nebula::Nebula;
pub use particles3d::Particles3d;
pub use primitives::{DepthBatch, Primitive, View};
pub use rings::WaveformRings;
pub use sphere::Sphere;
pub use spiral::Spiral;
pub use terrain::Terrain;
pub use tunnel::Tunnel;
pub use vortex::Vortex;

/// Geometry generator for one 3D style.
pub(crate) trait Shape {
    fn configure(&mut self, settings: &VisualizerSettings);

    fn update(&mut self, input: &FrameInput<'_>);

    /// Queues this frame's primitives.
    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette);

    fn tracked_values(&self) -> Vec<f32>;
}

/// Camera state shared by every 3D style.
#[derive(Debug, Clone)]
pub struct Scene3d {
    projector: Projector,
    pose: CameraPose,
    interaction: InteractionController,
    auto_rotate: bool,
    /// Radians per 60 Hz tick.
    rotation_speed: f32,
    interactive: bool,
    camera_distance: f32,
    camera_tilt: f32,
}

impl Scene3d {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let camera_distance = settings.float("cameraDistance", 600.0).max(1.0);
        let camera_tilt = tilt(settings);
        let mut pose = CameraPose::new(camera_distance);
        pose.rotation.x = camera_tilt;
        let mut scene = Self {
            projector: Projector::default(),
            pose,
            interaction: InteractionController::default(),
            auto_rotate: true,
            rotation_speed: 0.0,
            interactive: false,
            camera_distance,
            camera_tilt,
        };
        scene.configure(settings);
        scene
    }

    pub fn configure(&mut self, settings: &VisualizerSettings) {
        self.projector = Projector::new(settings.float("fov", 60.0));
        self.auto_rotate = settings.boolean("autoRotate", true);
        // rotationSpeed is expressed in degrees per tick
        self.rotation_speed = settings.float("rotationSpeed", 0.3).to_radians();
        self.interactive = settings.boolean("interactiveMode", false);

        let distance = settings.float("cameraDistance", 600.0).max(1.0);
        if distance != self.camera_distance {
            self.camera_distance = distance;
            self.pose.distance = distance;
        }
        let camera_tilt = tilt(settings);
        if camera_tilt != self.camera_tilt {
            self.camera_tilt = camera_tilt;
            self.pose.rotation.x = camera_tilt;
        }
    }

    /// Advances autorotation by one tick; paused while the user interacts.
    pub fn advance(&mut self, step: f32, now_ms: f64) -> f32 {
        if !self.auto_rotate {
            return 0.0;
        }
        let delta = self.interaction.autorotation(self.rotation_speed, step, now_ms);
        self.pose.rotation.y = (self.pose.rotation.y + delta) % TAU;
        delta
    }

    pub fn handle_input(&mut self, event: &InputEvent, now_ms: f64) -> bool {
        self.interactive && self.interaction.handle(event, &mut self.pose, now_ms)
    }

    pub fn view(&self, size: SurfaceSize) -> View {
        View::new(self.projector, self.pose, size)
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }
}

fn tilt(settings: &VisualizerSettings) -> f32 {
    settings.float("cameraTilt", 0.35).clamp(-FRAC_PI_2, FRAC_PI_2)
}

pub(crate) enum SpatialShape {
    Bars(Bars3d),
    Terrain(Terrain),
    Sphere(Sphere),
    Rings(WaveformRings),
    Particles(Particles3d),
    Nebula(Nebula),
    Spiral(Spiral),
    Vortex(Vortex),
    CubeGrid(CubeGrid),
    Equalizer(Equalizer),
    Tunnel(Tunnel),
    Audioscape(Audioscape),
    Galaxy(Galaxy3d),
}

macro_rules! dispatch {
    ($self:expr, $shape:ident => $body:expr) => {
        match $self {
            SpatialShape::Bars($shape) => $body,
            SpatialShape::Terrain($shape) => $body,
            SpatialShape::Sphere($shape) => $body,
            SpatialShape::Rings($shape) => $body,
            SpatialShape::Particles($shape) => $body,
            SpatialShape::Nebula($shape) => $body,
            SpatialShape::Spiral($shape) => $body,
            SpatialShape::Vortex($shape) => $body,
            SpatialShape::CubeGrid($shape) => $body,
            SpatialShape::Equalizer($shape) => $body,
            SpatialShape::Tunnel($shape) => $body,
            SpatialShape::Audioscape($shape) => $body,
            SpatialShape::Galaxy($shape) => $body,
        }
    };
}

impl SpatialShape {
    fn new(style: StyleId, settings: &VisualizerSettings) -> Self {
        match style {
            StyleId::Terrain => SpatialShape::Terrain(Terrain::new(settings)),
            StyleId::Sphere => SpatialShape::Sphere(Sphere::new(settings)),
            StyleId::WaveformRings => SpatialShape::Rings(WaveformRings::new(settings)),
            StyleId::Particles3d => SpatialShape::Particles(Particles3d::new(settings)),
            StyleId::Nebula => SpatialShape::Nebula(Nebula::new(settings)),
            StyleId::Spiral => SpatialShape::Spiral(Spiral::new(settings)),
            StyleId::Vortex => SpatialShape::Vortex(Vortex::new(settings)),
            StyleId::CubeGrid => SpatialShape::CubeGrid(CubeGrid::new(settings)),
            StyleId::Equalizer => SpatialShape::Equalizer(Equalizer::new(settings)),
            StyleId::Tunnel => SpatialShape::Tunnel(Tunnel::new(settings)),
            StyleId::Audioscape => SpatialShape::Audioscape(Audioscape::new(settings)),
            StyleId::Galaxy3d => SpatialShape::Galaxy(Galaxy3d::new(settings)),
            _ => SpatialShape::Bars(Bars3d::new(settings)),
        }
    }
}

impl Shape for SpatialShape {
    fn configure(&mut self, settings: &VisualizerSettings) {
        dispatch!(self, shape => shape.configure(settings))
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        dispatch!(self, shape => shape.update(input))
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        dispatch!(self, shape => shape.build(view, batch, palette))
    }

    fn tracked_values(&self) -> Vec<f32> {
        dispatch!(self, shape => shape.tracked_values())
    }
}

/// A running 3D style: shared camera plus the style's geometry.
pub struct SpatialScene {
    scene: Scene3d,
    shape: SpatialShape,
}

impl SpatialScene {
    /// Builds the state for a 3D style. Flat ids fall back to 3D bars.
    pub(crate) fn new(style: StyleId, settings: &VisualizerSettings, _size: SurfaceSize) -> Self {
        Self {
            scene: Scene3d::new(settings),
            shape: SpatialShape::new(style, settings),
        }
    }

    pub fn scene(&self) -> &Scene3d {
        &self.scene
    }
}

impl Style for SpatialScene {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.scene.configure(settings);
        self.shape.configure(settings);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        self.scene.advance(input.step(), input.now_ms);
        self.shape.update(input);
    }

    fn draw(&self, surface: &mut dyn Surface, palette: &ColorPalette) {
        let view = self.scene.view(surface.size());
        let mut batch = DepthBatch::new();
        self.shape.build(&view, &mut batch, palette);
        batch.flush(surface);
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.shape.tracked_values()
    }

    fn handle_input(&mut self, event: &InputEvent, now_ms: f64) {
        self.scene.handle_input(event, now_ms);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{defaults_for, BandEnergies, FrequencyFrame, RecordingSurface, TimeFrame};

    pub(crate) const SIZE: SurfaceSize = SurfaceSize::new(640.0, 480.0);

    /// Runs one update with every bin at `level` and a sine time frame.
    pub(crate) fn tick_shape(shape: &mut impl Shape, level: u8, now_ms: f64) {
        let frequency = FrequencyFrame::new(vec![level; 64]);
        let time = TimeFrame::new(
            (0..128)
                .map(|i| (i as f32 * 0.2).sin() * level as f32 / 255.0)
                .collect(),
        );
        shape.update(&FrameInput {
            frequency: &frequency,
            time: &time,
            bands: BandEnergies::from_frame(&frequency),
            average: frequency.average(),
            now_ms,
            dt: 1.0 / 60.0,
            size: SIZE,
        });
    }

    pub(crate) fn default_view() -> View {
        let mut pose = CameraPose::new(600.0);
        pose.rotation.x = 0.35;
        View::new(Projector::default(), pose, SIZE)
    }

    fn scene(style: StyleId, settings: VisualizerSettings) -> SpatialScene {
        let merged = VisualizerSettings::overlay(&defaults_for(style), &settings);
        SpatialScene::new(style, &merged, SIZE)
    }

    #[test]
    fn every_spatial_style_draws_depth_sorted_geometry() {
        for style in StyleId::ALL.iter().filter(|style| style.is_spatial()) {
            let mut scene = scene(*style, VisualizerSettings::new());
            let frequency = FrequencyFrame::new(vec![180; 64]);
            let time = TimeFrame::new((0..128).map(|i| (i as f32 * 0.2).sin()).collect());
            scene.update(&FrameInput {
                frequency: &frequency,
                time: &time,
                bands: BandEnergies::from_frame(&frequency),
                average: frequency.average(),
                now_ms: 0.0,
                dt: 1.0 / 60.0,
                size: SIZE,
            });

            let mut batch = DepthBatch::new();
            scene.shape.build(&scene.scene.view(SIZE), &mut batch, &ColorPalette::default());
            assert!(!batch.is_empty(), "{style} built nothing");
            batch.sort();
            let depths = batch.depths();
            assert!(depths.windows(2).all(|pair| pair[0] >= pair[1]), "{style}");

            let mut surface = RecordingSurface::new(SIZE.width, SIZE.height);
            scene.draw(&mut surface, &ColorPalette::default());
            assert!(surface.commands().len() >= depths.len(), "{style}");
        }
    }

    #[test]
    fn autorotation_pauses_while_dragging() {
        let settings = VisualizerSettings::new().with("interactiveMode", true);
        let mut scene = scene(StyleId::Sphere, settings);
        tick_scene(&mut scene, 0.0);
        let yaw = scene.scene().pose().yaw();
        assert!(yaw > 0.0);

        scene.handle_input(&InputEvent::PointerDown { x: 10.0, y: 10.0 }, 16.0);
        for tick in 2..20 {
            tick_scene(&mut scene, tick as f64 * 16.0);
            assert_eq!(scene.scene().pose().yaw(), yaw);
        }

        scene.handle_input(&InputEvent::PointerMove { x: 30.0, y: 10.0 }, 400.0);
        assert!((scene.scene().pose().yaw() - yaw - 20.0 * interaction::DRAG_SENSITIVITY).abs() < 1e-5);
    }

    #[test]
    fn gestures_are_ignored_without_interactive_mode() {
        let mut scene = scene(StyleId::Terrain, VisualizerSettings::new());
        let before = *scene.scene().pose();
        scene.handle_input(&InputEvent::PointerDown { x: 0.0, y: 0.0 }, 0.0);
        scene.handle_input(&InputEvent::PointerMove { x: 300.0, y: 300.0 }, 0.0);
        assert_eq!(*scene.scene().pose(), before);
    }

    #[test]
    fn camera_settings_apply_live() {
        let mut scene = scene(StyleId::Tunnel, VisualizerSettings::new());
        let settings = VisualizerSettings::overlay(
            &defaults_for(StyleId::Tunnel),
            &VisualizerSettings::new().with("cameraDistance", 900).with("autoRotate", false),
        );
        scene.configure(&settings);

        assert_eq!(scene.scene().pose().distance, 900.0);
        assert_eq!(scene.scene.advance(1.0, 0.0), 0.0);
    }

    #[test]
    fn camera_tilt_applies_live() {
        let mut scene = scene(StyleId::Tunnel, VisualizerSettings::new());
        assert!((scene.scene().pose().pitch() - 0.35).abs() < 1e-6);

        let settings = VisualizerSettings::overlay(
            &defaults_for(StyleId::Tunnel),
            &VisualizerSettings::new().with("cameraTilt", 0.8),
        );
        scene.configure(&settings);
        assert!((scene.scene().pose().pitch() - 0.8).abs() < 1e-6);

        let steep = VisualizerSettings::overlay(
            &defaults_for(StyleId::Tunnel),
            &VisualizerSettings::new().with("cameraTilt", 3.0),
        );
        scene.configure(&steep);
        assert!((scene.scene().pose().pitch() - FRAC_PI_2).abs() < 1e-6);
    }

    fn tick_scene(scene: &mut SpatialScene, now_ms: f64) {
        let frequency = FrequencyFrame::silent(64);
        let time = TimeFrame::silent(128);
        scene.update(&FrameInput {
            frequency: &frequency,
            time: &time,
            bands: BandEnergies::default(),
            average: 0.0,
            now_ms,
            dt: 1.0 / 60.0,
            size: SIZE,
        });
    }
}
