//! The 2D drawing surface the engine paints onto.
//!
//! Hosts implement [`Surface`] over whatever canvas they own. The
//! [`RecordingSurface`] keeps every call as a [`DrawCommand`], which is what
//! the headless app and the tests draw into.

use serde::{Deserialize, Serialize};

use crate::Color;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point at `radius` from `self` in direction `angle` (radians).
    pub fn polar(self, radius: f32, angle: f32) -> Point {
        Point::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_dim(self) -> f32 {
        self.width.min(self.height)
    }

    pub fn is_drawable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 1.0 && self.height >= 1.0
    }

    /// Distance from the center to a corner.
    pub fn half_diagonal(self) -> f32 {
        (self.width.powi(2) + self.height.powi(2)).sqrt() / 2.0
    }
}

/// Soft blur applied to subsequent shapes until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    pub blur: f32,
    pub color: Color,
}

pub trait Surface {
    fn size(&self) -> SurfaceSize;

    /// Replaces every pixel with `color`.
    fn clear(&mut self, color: Color);

    /// Blends a translucent full-surface fill over the previous frame.
    fn fade(&mut self, color: Color);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color);

    fn stroke_path(&mut self, points: &[Point], closed: bool, width: f32, color: Color);

    fn fill_path(&mut self, points: &[Point], color: Color);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    fn stroke_circle(&mut self, center: Point, radius: f32, width: f32, color: Color);

    fn set_glow(&mut self, glow: Option<Glow>);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear(Color),
    Fade(Color),
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    Path {
        points: Vec<Point>,
        closed: bool,
        width: f32,
        color: Color,
    },
    FillPath {
        points: Vec<Point>,
        color: Color,
    },
    FillCircle {
        center: Point,
        radius: f32,
        color: Color,
    },
    StrokeCircle {
        center: Point,
        radius: f32,
        width: f32,
        color: Color,
    },
    Glow(Option<Glow>),
}

#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: SurfaceSize,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands recorded since the most recent `clear`.
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|command| matches!(command, DrawCommand::Clear(_)))
            .unwrap_or(0);
        &self.commands[start..]
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = SurfaceSize::new(width, height);
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fade(&mut self, color: Color) {
        self.commands.push(DrawCommand::Fade(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn stroke_path(&mut self, points: &[Point], closed: bool, width: f32, color: Color) {
        self.commands.push(DrawCommand::Path {
            points: points.to_vec(),
            closed,
            width,
            color,
        });
    }

    fn fill_path(&mut self, points: &[Point], color: Color) {
        self.commands.push(DrawCommand::FillPath {
            points: points.to_vec(),
            color,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, width: f32, color: Color) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            width,
            color,
        });
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.commands.push(DrawCommand::Glow(glow));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_frame_starts_at_latest_clear() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.clear(Color::BLACK);
        surface.fill_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        surface.clear(Color::BLACK);
        surface.fill_circle(Point::new(1.0, 1.0), 2.0, Color::WHITE);

        assert_eq!(surface.last_frame().len(), 2);
        assert_eq!(surface.commands().len(), 4);
    }

    #[test]
    fn size_helpers() {
        let size = SurfaceSize::new(300.0, 400.0);
        assert_eq!(size.center(), Point::new(150.0, 200.0));
        assert_eq!(size.min_dim(), 300.0);
        assert_eq!(size.half_diagonal(), 250.0);
        assert!(!SurfaceSize::new(0.0, 10.0).is_drawable());
    }
}
