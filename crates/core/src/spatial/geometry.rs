//! Small mesh helpers shared by the 3D styles.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// The six quads of an axis-aligned box standing on `base` (bottom centre),
/// `width` across x/z and `height` up y. Each quad is wound consistently
/// and paired with a shade factor for flat lighting.
pub fn box_faces(base: Vec3, width: f32, height: f32) -> [([Vec3; 4], f32); 6] {
    let h = width / 2.0;
    let (x0, x1) = (base.x - h, base.x + h);
    let (z0, z1) = (base.z - h, base.z + h);
    let (y0, y1) = (base.y, base.y + height);
    let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    [
        ([v(x0, y0, z0), v(x1, y0, z0), v(x1, y1, z0), v(x0, y1, z0)], 0.8),
        ([v(x1, y0, z1), v(x0, y0, z1), v(x0, y1, z1), v(x1, y1, z1)], 0.8),
        ([v(x0, y0, z1), v(x0, y0, z0), v(x0, y1, z0), v(x0, y1, z1)], 0.6),
        ([v(x1, y0, z0), v(x1, y0, z1), v(x1, y1, z1), v(x1, y1, z0)], 0.6),
        ([v(x0, y1, z0), v(x1, y1, z0), v(x1, y1, z1), v(x0, y1, z1)], 1.0),
        ([v(x0, y0, z1), v(x1, y0, z1), v(x1, y0, z0), v(x0, y0, z0)], 0.4),
    ]
}

/// The six faces of a cube centred on `center`.
pub fn cube_faces(center: Vec3, size: f32) -> [([Vec3; 4], f32); 6] {
    box_faces(center - Vec3::Y * (size / 2.0), size, size)
}

/// `count` evenly spread unit vectors (golden-angle spiral).
pub fn fibonacci_sphere(count: usize) -> Vec<Vec3> {
    let golden = PI * (3.0 - 5f32.sqrt());
    (0..count)
        .map(|i| {
            let y = if count > 1 {
                1.0 - 2.0 * i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden * i as f32;
            Vec3::new(theta.cos() * ring, y, theta.sin() * ring)
        })
        .collect()
}

/// Point on a horizontal circle of `radius` at height `y`.
pub fn ring_point(radius: f32, angle: f32, y: f32) -> Vec3 {
    Vec3::new(radius * angle.cos(), y, radius * angle.sin())
}

/// `count` angles evenly spread over a full turn.
pub fn angles(count: usize) -> impl Iterator<Item = f32> {
    (0..count).map(move |i| i as f32 / count.max(1) as f32 * TAU)
}

/// Centred coordinate of cell `index` in a row of `count` cells.
pub fn centred(index: usize, count: usize, spacing: f32) -> f32 {
    (index as f32 - (count as f32 - 1.0) / 2.0) * spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_points_are_unit_length() {
        let points = fibonacci_sphere(50);
        assert_eq!(points.len(), 50);
        assert!(points.iter().all(|p| (p.length() - 1.0).abs() < 1e-4));
        assert_eq!(points[0].y, 1.0);
        assert_eq!(points[49].y, -1.0);
    }

    #[test]
    fn box_spans_requested_extent() {
        let faces = box_faces(Vec3::new(10.0, 0.0, 0.0), 4.0, 6.0);
        let all: Vec<Vec3> = faces.iter().flat_map(|(quad, _)| quad.iter().copied()).collect();
        let max = all.iter().fold(Vec3::splat(f32::MIN), |acc, v| acc.max(*v));
        let min = all.iter().fold(Vec3::splat(f32::MAX), |acc, v| acc.min(*v));

        assert_eq!(min, Vec3::new(8.0, 0.0, -2.0));
        assert_eq!(max, Vec3::new(12.0, 6.0, 2.0));
    }

    #[test]
    fn centred_cells_are_symmetric() {
        assert_eq!(centred(0, 3, 10.0), -10.0);
        assert_eq!(centred(1, 3, 10.0), 0.0);
        assert_eq!(centred(3, 4, 10.0), 15.0);
    }
}
