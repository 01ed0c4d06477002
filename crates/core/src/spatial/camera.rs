//! Camera pose and the perspective projector every 3D primitive goes through.

use glam::{Mat3, Vec3};

use crate::{Point, SurfaceSize};

pub const DEFAULT_NEAR: f32 = 1.0;
pub const DEFAULT_FAR: f32 = 10_000.0;
/// Screen-space slack before a projected point counts as off-canvas.
pub const DEFAULT_MARGIN: f32 = 100.0;

/// Camera position, per-axis rotation (radians: x pitch, y yaw, z roll) and
/// distance from the orbit target.
///
/// Roll is stored but the projector only applies yaw and pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Vec3,
    pub distance: f32,
}

impl CameraPose {
    pub fn new(distance: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            distance,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    pub fn pitch(&self) -> f32 {
        self.rotation.x
    }

    /// Rotates a world point into camera space, yaw first then pitch.
    pub fn to_camera(&self, point: Vec3) -> Vec3 {
        let relative = point - self.position;
        Mat3::from_rotation_x(self.rotation.x) * (Mat3::from_rotation_y(self.rotation.y) * relative)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    /// Perspective factor for depth-correct sizes and widths.
    pub scale: f32,
    /// Camera-space depth; larger is farther away.
    pub depth: f32,
}

impl ProjectedPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn hidden(depth: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            visible: false,
            scale: 0.0,
            depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub margin: f32,
}

impl Projector {
    pub fn new(fov: f32) -> Self {
        Self {
            fov: fov.clamp(10.0, 170.0),
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            margin: DEFAULT_MARGIN,
        }
    }

    /// Focal length in pixels for a surface of the given size.
    pub fn focal_length(&self, size: SurfaceSize) -> f32 {
        (size.height / 2.0) / (self.fov.to_radians() / 2.0).tan()
    }

    pub fn project(&self, pose: &CameraPose, point: Vec3, size: SurfaceSize) -> ProjectedPoint {
        let camera = pose.to_camera(point);
        let depth = camera.z + pose.distance;
        if depth <= self.near || depth > self.far {
            return ProjectedPoint::hidden(depth);
        }

        let scale = self.focal_length(size) / depth;
        let center = size.center();
        let x = center.x + camera.x * scale;
        let y = center.y - camera.y * scale;
        let visible = x >= -self.margin
            && x <= size.width + self.margin
            && y >= -self.margin
            && y <= size.height + self.margin;

        ProjectedPoint {
            x,
            y,
            visible,
            scale,
            depth,
        }
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    const SIZE: SurfaceSize = SurfaceSize::new(800.0, 600.0);

    #[test]
    fn point_at_the_camera_is_hidden() {
        let pose = CameraPose::new(500.0);
        let projector = Projector::default();

        let at_camera = projector.project(&pose, Vec3::new(0.0, 0.0, -500.0), SIZE);
        assert!(!at_camera.visible);

        let inside_near = projector.project(&pose, Vec3::new(0.0, 0.0, -499.5), SIZE);
        assert!(!inside_near.visible);
    }

    #[test]
    fn point_beyond_far_clip_is_hidden() {
        let pose = CameraPose::new(500.0);
        let projector = Projector::default();

        let far = projector.project(&pose, Vec3::new(0.0, 0.0, DEFAULT_FAR), SIZE);
        assert!(!far.visible);
    }

    #[test]
    fn point_ahead_projects_to_center() {
        let pose = CameraPose::new(500.0);
        let projected = Projector::default().project(&pose, Vec3::ZERO, SIZE);

        assert!(projected.visible);
        assert_eq!(projected.point(), SIZE.center());
        assert_eq!(projected.depth, 500.0);
    }

    #[test]
    fn scale_falls_with_distance() {
        let projector = Projector::default();
        let near = projector.project(&CameraPose::new(300.0), Vec3::ZERO, SIZE);
        let far = projector.project(&CameraPose::new(900.0), Vec3::ZERO, SIZE);
        assert!((near.scale / far.scale - 3.0).abs() < 1e-4);
    }

    #[test]
    fn ninety_degree_fov_maps_depth_to_half_height() {
        let projector = Projector::new(90.0);
        let pose = CameraPose::new(100.0);
        let edge = projector.project(&pose, Vec3::new(0.0, 100.0, 0.0), SIZE);

        assert!(edge.visible);
        assert!(edge.y.abs() < 1e-3);
    }

    #[test]
    fn margin_keeps_slightly_offscreen_points() {
        let projector = Projector::new(90.0);
        let pose = CameraPose::new(100.0);
        let just_off = projector.project(&pose, Vec3::new(0.0, 120.0, 0.0), SIZE);
        let far_off = projector.project(&pose, Vec3::new(0.0, 400.0, 0.0), SIZE);

        assert!(just_off.y < 0.0);
        assert!(just_off.visible);
        assert!(!far_off.visible);
    }

    #[test]
    fn yaw_moves_points_around_the_target() {
        let mut pose = CameraPose::new(500.0);
        pose.rotation.y = FRAC_PI_2;
        let rotated = pose.to_camera(Vec3::new(100.0, 0.0, 0.0));

        assert!(rotated.x.abs() < 1e-3);
        assert!((rotated.z.abs() - 100.0).abs() < 1e-3);
    }
}
