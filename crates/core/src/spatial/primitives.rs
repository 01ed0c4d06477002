//! Projected point, line and polygon primitives collected per frame and
//! painted back to front.

use glam::Vec3;

use crate::{
    spatial::{CameraPose, ProjectedPoint, Projector},
    Color, Point, Surface, SurfaceSize,
};

/// Everything needed to project world points for one frame.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub projector: Projector,
    pub pose: CameraPose,
    pub size: SurfaceSize,
}

impl View {
    pub fn new(projector: Projector, pose: CameraPose, size: SurfaceSize) -> Self {
        Self {
            projector,
            pose,
            size,
        }
    }

    pub fn project(&self, point: Vec3) -> ProjectedPoint {
        self.projector.project(&self.pose, point, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Point {
        at: Point,
        radius: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    Polygon {
        points: Vec<Point>,
        fill: Option<Color>,
        stroke: Option<(f32, Color)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    depth: f32,
    primitive: Primitive,
}

/// Frame-local list of primitives, sorted by depth before painting.
#[derive(Debug, Clone, Default)]
pub struct DepthBatch {
    entries: Vec<Entry>,
}

impl DepthBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queues a dot whose radius shrinks with depth. Hidden points are dropped.
    pub fn point(&mut self, view: &View, at: Vec3, radius: f32, color: Color) -> bool {
        let projected = view.project(at);
        if !projected.visible {
            return false;
        }
        self.push(
            projected.depth,
            Primitive::Point {
                at: projected.point(),
                radius: (radius * projected.scale).max(0.5),
                color,
            },
        );
        true
    }

    /// Queues a segment. Both ends must be visible.
    pub fn line(&mut self, view: &View, from: Vec3, to: Vec3, width: f32, color: Color) -> bool {
        let a = view.project(from);
        let b = view.project(to);
        if !a.visible || !b.visible {
            return false;
        }
        self.push(
            (a.depth + b.depth) / 2.0,
            Primitive::Line {
                from: a.point(),
                to: b.point(),
                width: (width * (a.scale + b.scale) / 2.0).max(0.5),
                color,
            },
        );
        true
    }

    /// Queues a closed polygon at its mean depth. Every vertex must be visible.
    pub fn polygon(
        &mut self,
        view: &View,
        vertices: &[Vec3],
        fill: Option<Color>,
        stroke: Option<(f32, Color)>,
    ) -> bool {
        if vertices.len() < 3 {
            return false;
        }
        let projected: Vec<ProjectedPoint> = vertices.iter().map(|v| view.project(*v)).collect();
        if projected.iter().any(|p| !p.visible) {
            return false;
        }
        let depth = projected.iter().map(|p| p.depth).sum::<f32>() / projected.len() as f32;
        self.push(
            depth,
            Primitive::Polygon {
                points: projected.iter().map(ProjectedPoint::point).collect(),
                fill,
                stroke,
            },
        );
        true
    }

    pub fn push(&mut self, depth: f32, primitive: Primitive) {
        self.entries.push(Entry { depth, primitive });
    }

    /// Orders entries farthest first.
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    }

    pub fn depths(&self) -> Vec<f32> {
        self.entries.iter().map(|entry| entry.depth).collect()
    }

    /// Sorts and paints every primitive, back to front.
    pub fn flush(mut self, surface: &mut dyn Surface) {
        self.sort();
        for entry in self.entries {
            match entry.primitive {
                Primitive::Point { at, radius, color } => surface.fill_circle(at, radius, color),
                Primitive::Line {
                    from,
                    to,
                    width,
                    color,
                } => surface.stroke_line(from, to, width, color),
                Primitive::Polygon {
                    points,
                    fill,
                    stroke,
                } => {
                    if let Some(color) = fill {
                        surface.fill_path(&points, color);
                    }
                    if let Some((width, color)) = stroke {
                        surface.stroke_path(&points, true, width, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DrawCommand, RecordingSurface};

    fn view() -> View {
        View::new(Projector::default(), CameraPose::new(500.0), SurfaceSize::new(400.0, 300.0))
    }

    #[test]
    fn sorts_back_to_front_regardless_of_input_order() {
        let view = view();
        let orders = [[0.0, 100.0, -100.0], [-100.0, 0.0, 100.0], [100.0, -100.0, 0.0]];
        for zs in orders {
            let mut batch = DepthBatch::new();
            for z in zs {
                assert!(batch.point(&view, Vec3::new(0.0, 0.0, z), 4.0, Color::WHITE));
            }
            batch.sort();
            assert_eq!(batch.depths(), vec![600.0, 500.0, 400.0]);
        }
    }

    #[test]
    fn flush_paints_farthest_first() {
        let view = view();
        let mut batch = DepthBatch::new();
        batch.point(&view, Vec3::new(0.0, 0.0, -200.0), 4.0, Color::WHITE);
        batch.point(&view, Vec3::new(0.0, 0.0, 200.0), 4.0, Color::BLACK);

        let mut surface = RecordingSurface::new(400.0, 300.0);
        batch.flush(&mut surface);

        let colors: Vec<Color> = surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillCircle { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec![Color::BLACK, Color::WHITE]);
    }

    #[test]
    fn hidden_geometry_is_dropped() {
        let view = view();
        let mut batch = DepthBatch::new();
        let behind = Vec3::new(0.0, 0.0, -600.0);

        assert!(!batch.point(&view, behind, 1.0, Color::WHITE));
        assert!(!batch.line(&view, Vec3::ZERO, behind, 1.0, Color::WHITE));
        assert!(!batch.polygon(&view, &[Vec3::ZERO, Vec3::X, behind], Some(Color::WHITE), None));
        assert!(batch.is_empty());
    }

    #[test]
    fn polygon_uses_mean_depth() {
        let view = view();
        let mut batch = DepthBatch::new();
        let square = [
            Vec3::new(-10.0, -10.0, -50.0),
            Vec3::new(10.0, -10.0, -50.0),
            Vec3::new(10.0, 10.0, 50.0),
            Vec3::new(-10.0, 10.0, 50.0),
        ];
        assert!(batch.polygon(&view, &square, Some(Color::WHITE), Some((1.0, Color::BLACK))));
        assert_eq!(batch.depths(), vec![500.0]);
    }
}
