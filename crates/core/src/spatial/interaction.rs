//! Pointer and pinch gestures mapped onto the camera pose.
//!
//! While a drag or pinch is active, and for a short cooldown after it ends,
//! [`InteractionController::autorotation`] yields zero so the camera never
//! jumps under the user's hand.

use std::f32::consts::FRAC_PI_2;

use crate::{spatial::CameraPose, InputEvent, Point};

/// Radians of rotation per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.005;
/// Camera-distance units per wheel delta unit.
pub const ZOOM_SENSITIVITY: f32 = 0.5;
pub const COOLDOWN_MS: f64 = 1000.0;
pub const MIN_DISTANCE: f32 = 150.0;
pub const MAX_DISTANCE: f32 = 2000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    sensitivity: f32,
    min_distance: f32,
    max_distance: f32,
    drag_from: Option<Point>,
    pinch_from: Option<f32>,
    cooldown_until_ms: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(DRAG_SENSITIVITY)
    }
}

impl InteractionController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            min_distance: MIN_DISTANCE,
            max_distance: MAX_DISTANCE,
            drag_from: None,
            pinch_from: None,
            cooldown_until_ms: f64::NEG_INFINITY,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// True during a drag or pinch and until the cooldown after it expires.
    pub fn is_interacting(&self, now_ms: f64) -> bool {
        self.drag_from.is_some() || self.pinch_from.is_some() || now_ms < self.cooldown_until_ms
    }

    /// Autorotation step for this tick; zero while interacting.
    pub fn autorotation(&self, speed: f32, step: f32, now_ms: f64) -> f32 {
        if self.is_interacting(now_ms) {
            0.0
        } else {
            speed * step
        }
    }

    /// Applies one gesture event to `pose`. Returns whether the pose changed
    /// or a gesture started/ended.
    pub fn handle(&mut self, event: &InputEvent, pose: &mut CameraPose, now_ms: f64) -> bool {
        match *event {
            InputEvent::PointerDown { x, y } => {
                self.drag_from = Some(Point::new(x, y));
                true
            }
            InputEvent::PointerMove { x, y } => {
                let Some(from) = self.drag_from else {
                    return false;
                };
                pose.rotation.y += (x - from.x) * self.sensitivity;
                pose.rotation.x = (pose.rotation.x + (y - from.y) * self.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
                self.drag_from = Some(Point::new(x, y));
                true
            }
            InputEvent::PointerUp => self.release_drag(now_ms),
            InputEvent::Wheel { delta } => {
                pose.distance = self.clamp_distance(pose.distance + delta * ZOOM_SENSITIVITY);
                self.cooldown_until_ms = now_ms + COOLDOWN_MS;
                true
            }
            InputEvent::PinchStart { distance } => {
                self.pinch_from = Some(distance);
                true
            }
            InputEvent::Pinch { distance } => {
                let Some(from) = self.pinch_from else {
                    return false;
                };
                if distance > 0.0 {
                    pose.distance = self.clamp_distance(pose.distance * from / distance);
                    self.pinch_from = Some(distance);
                }
                true
            }
            InputEvent::PinchEnd => {
                if self.pinch_from.take().is_none() {
                    return false;
                }
                self.cooldown_until_ms = now_ms + COOLDOWN_MS;
                true
            }
            InputEvent::Resize { .. } => false,
        }
    }

    fn release_drag(&mut self, now_ms: f64) -> bool {
        if self.drag_from.take().is_none() {
            return false;
        }
        self.cooldown_until_ms = now_ms + COOLDOWN_MS;
        true
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_rotates_by_scaled_delta() {
        let mut controller = InteractionController::default();
        let mut pose = CameraPose::new(600.0);

        controller.handle(&InputEvent::PointerDown { x: 100.0, y: 100.0 }, &mut pose, 0.0);
        controller.handle(&InputEvent::PointerMove { x: 140.0, y: 80.0 }, &mut pose, 10.0);

        assert!((pose.yaw() - 40.0 * DRAG_SENSITIVITY).abs() < 1e-6);
        assert!((pose.pitch() + 20.0 * DRAG_SENSITIVITY).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped_to_quarter_turn() {
        let mut controller = InteractionController::default();
        let mut pose = CameraPose::new(600.0);

        controller.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 }, &mut pose, 0.0);
        controller.handle(&InputEvent::PointerMove { x: 0.0, y: 5000.0 }, &mut pose, 1.0);
        assert_eq!(pose.pitch(), FRAC_PI_2);

        controller.handle(&InputEvent::PointerMove { x: 0.0, y: -10000.0 }, &mut pose, 2.0);
        assert_eq!(pose.pitch(), -FRAC_PI_2);
    }

    #[test]
    fn autorotation_is_zero_while_interacting_and_during_cooldown() {
        let mut controller = InteractionController::default();
        let mut pose = CameraPose::new(600.0);
        assert_eq!(controller.autorotation(0.01, 1.0, 0.0), 0.01);

        controller.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 }, &mut pose, 0.0);
        for tick in 0..10 {
            assert_eq!(controller.autorotation(0.01, 1.0, tick as f64 * 16.0), 0.0);
        }

        controller.handle(&InputEvent::PointerUp, &mut pose, 500.0);
        assert!(!controller.is_dragging());
        assert_eq!(controller.autorotation(0.01, 1.0, 1400.0), 0.0);
        assert_eq!(controller.autorotation(0.01, 1.0, 1500.0), 0.01);
    }

    #[test]
    fn moves_without_a_drag_are_ignored() {
        let mut controller = InteractionController::default();
        let mut pose = CameraPose::new(600.0);

        assert!(!controller.handle(&InputEvent::PointerMove { x: 50.0, y: 50.0 }, &mut pose, 0.0));
        assert_eq!(pose.rotation, CameraPose::new(600.0).rotation);
        assert!(!controller.handle(&InputEvent::PointerUp, &mut pose, 0.0));
        assert!(!controller.is_interacting(0.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controller = InteractionController::default();
        let mut pose = CameraPose::new(600.0);

        controller.handle(&InputEvent::Wheel { delta: 100_000.0 }, &mut pose, 0.0);
        assert_eq!(pose.distance, MAX_DISTANCE);

        controller.handle(&InputEvent::PinchStart { distance: 10.0 }, &mut pose, 0.0);
        controller.handle(&InputEvent::Pinch { distance: 1000.0 }, &mut pose, 0.0);
        assert_eq!(pose.distance, MIN_DISTANCE);
        assert!(controller.is_interacting(5000.0));

        controller.handle(&InputEvent::PinchEnd, &mut pose, 5000.0);
        assert!(controller.is_interacting(5500.0));
        assert!(!controller.is_interacting(6000.0));
    }
}
