//! Per-participant vehicle physics
//!
//! A vehicle is advanced once per room tick and steered by directional input
//! that may arrive at any moment between ticks. It has no locking of its
//! own: the owning room hands out `&mut` access only while holding its
//! exclusive lock, so input application, tick advancement, and snapshot
//! capture never interleave on the same vehicle.

use shared::{DirectionalInput, PlayerSnapshot, VehicleTuning};
use std::time::Duration;
use tokio::time::Instant;

/// Physics state for one participant
#[derive(Debug, Clone)]
pub struct VehicleModel {
    /// Participant identifier, unique within a room
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Degrees, kept in `[0, 360)`
    pub heading: f64,
    /// Signed; bounded by the tuning's reverse and forward limits
    pub speed: f64,
    /// Index of the next checkpoint to reach
    pub checkpoint_index: usize,
    pub finished: bool,
    /// Last time a non-empty input was applied
    pub last_activity: Instant,
    tuning: VehicleTuning,
}

impl VehicleModel {
    /// Creates a stationary vehicle facing along the positive x-axis.
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self::with_tuning(id, x, y, VehicleTuning::default())
    }

    pub fn with_tuning(id: impl Into<String>, x: f64, y: f64, tuning: VehicleTuning) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            heading: 0.0,
            speed: 0.0,
            checkpoint_index: 0,
            finished: false,
            last_activity: Instant::now(),
            tuning,
        }
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    /// Integrates one fixed tick: move along the heading, then decay speed.
    pub fn advance(&mut self) {
        let radians = self.heading.to_radians();
        self.x += radians.cos() * self.speed;
        self.y += radians.sin() * self.speed;

        self.speed *= self.tuning.decay_rate;
        if self.speed.abs() < self.tuning.minimum_speed {
            self.speed = 0.0;
        }
    }

    /// Applies one input sample.
    ///
    /// Opposite flags are both applied in sequence, so `up` + `down` and
    /// `left` + `right` cancel out (up to clamping). Steering only engages
    /// above the turn threshold, which keeps a parked car from spinning.
    pub fn apply_input(&mut self, input: DirectionalInput) {
        if input.any() {
            self.last_activity = Instant::now();
        }

        if input.up {
            self.speed = (self.speed + self.tuning.acceleration).min(self.tuning.max_forward_speed);
        }
        if input.down {
            self.speed = (self.speed - self.tuning.acceleration).max(self.tuning.max_reverse_speed);
        }

        if self.speed.abs() > self.tuning.turn_threshold {
            if input.left {
                self.heading -= self.tuning.turn_rate;
            }
            if input.right {
                self.heading += self.tuning.turn_rate;
            }
        }

        self.heading = normalize_heading(self.heading);
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }

    /// Moves to the next checkpoint. Returns true if this completed the
    /// course for the first time.
    pub fn advance_checkpoint(&mut self, course_len: usize) -> bool {
        if self.checkpoint_index >= course_len {
            return false;
        }

        self.checkpoint_index += 1;
        if self.checkpoint_index == course_len && !self.finished {
            self.finished = true;
            return true;
        }
        false
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            angle: self.heading,
            speed: self.speed,
            finished: self.finished,
            checkpoint: self.checkpoint_index,
        }
    }
}

/// Wraps any angle in degrees into `[0, 360)`.
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const UP: DirectionalInput = DirectionalInput {
        up: true,
        down: false,
        left: false,
        right: false,
    };

    fn moving_vehicle(speed: f64) -> VehicleModel {
        let mut vehicle = VehicleModel::new("1", 0.0, 0.0);
        vehicle.speed = speed;
        vehicle
    }

    #[test]
    fn test_vehicle_creation() {
        let vehicle = VehicleModel::new("1", 100.0, 200.0);

        assert_eq!(vehicle.id, "1");
        assert_eq!(vehicle.x, 100.0);
        assert_eq!(vehicle.y, 200.0);
        assert_eq!(vehicle.heading, 0.0);
        assert_eq!(vehicle.speed, 0.0);
        assert_eq!(vehicle.checkpoint_index, 0);
        assert!(!vehicle.finished);
    }

    #[test]
    fn test_accelerate_then_advance() {
        let mut vehicle = VehicleModel::new("1", 0.0, 0.0);

        vehicle.apply_input(UP);
        assert_eq!(vehicle.speed, 1.0);

        vehicle.advance();
        assert_approx_eq!(vehicle.x, 1.0, 1e-9);
        assert_approx_eq!(vehicle.y, 0.0, 1e-9);
        assert_approx_eq!(vehicle.speed, 0.99, 1e-9);
    }

    #[test]
    fn test_forward_speed_is_clamped() {
        let mut vehicle = moving_vehicle(12.0);
        vehicle.apply_input(UP);
        assert_eq!(vehicle.speed, 12.0);
    }

    #[test]
    fn test_reverse_speed_is_clamped() {
        let mut vehicle = VehicleModel::new("1", 0.0, 0.0);
        let down = DirectionalInput {
            down: true,
            ..Default::default()
        };

        for _ in 0..10 {
            vehicle.apply_input(down);
        }
        assert_eq!(vehicle.speed, -6.0);
    }

    #[test]
    fn test_reverse_moves_backwards() {
        let mut vehicle = moving_vehicle(-2.0);
        vehicle.advance();
        assert_approx_eq!(vehicle.x, -2.0, 1e-9);
    }

    #[test]
    fn test_no_turning_below_threshold() {
        let mut vehicle = moving_vehicle(0.5);
        vehicle.apply_input(DirectionalInput {
            right: true,
            ..Default::default()
        });
        assert_eq!(vehicle.heading, 0.0);
    }

    #[test]
    fn test_turning_wraps_heading() {
        let mut vehicle = moving_vehicle(5.0);
        let left = DirectionalInput {
            left: true,
            ..Default::default()
        };

        vehicle.apply_input(left);
        assert_approx_eq!(vehicle.heading, 355.0, 1e-9);

        let right = DirectionalInput {
            right: true,
            ..Default::default()
        };
        vehicle.apply_input(right);
        vehicle.apply_input(right);
        assert_approx_eq!(vehicle.heading, 5.0, 1e-9);
    }

    #[test]
    fn test_heading_stays_in_range() {
        let mut vehicle = moving_vehicle(10.0);
        let right = DirectionalInput {
            right: true,
            ..Default::default()
        };

        for step in 0..500 {
            if step % 3 == 0 {
                vehicle.apply_input(UP);
            }
            vehicle.apply_input(right);
            assert!((0.0..360.0).contains(&vehicle.heading));
        }

        let left = DirectionalInput {
            left: true,
            up: true,
            ..Default::default()
        };
        for _ in 0..1000 {
            vehicle.apply_input(left);
            vehicle.advance();
            assert!((0.0..360.0).contains(&vehicle.heading));
        }
    }

    #[test]
    fn test_opposite_inputs_cancel() {
        let mut vehicle = moving_vehicle(5.0);
        vehicle.heading = 90.0;

        vehicle.apply_input(DirectionalInput {
            up: true,
            down: true,
            left: true,
            right: true,
        });

        assert_approx_eq!(vehicle.speed, 5.0, 1e-9);
        assert_approx_eq!(vehicle.heading, 90.0, 1e-9);
    }

    #[test]
    fn test_opposite_inputs_at_forward_cap() {
        // The clamp applies between the two deltas, so the cap is not preserved.
        let mut vehicle = moving_vehicle(12.0);
        vehicle.apply_input(DirectionalInput {
            up: true,
            down: true,
            ..Default::default()
        });
        assert_approx_eq!(vehicle.speed, 11.0, 1e-9);
    }

    #[test]
    fn test_speed_decays_without_input() {
        let mut vehicle = moving_vehicle(12.0);
        vehicle.heading = 45.0;
        let mut previous = vehicle.speed;

        for _ in 0..2000 {
            vehicle.advance();
            assert!(vehicle.speed <= previous);
            assert!(vehicle.speed >= 0.0);
            assert_eq!(vehicle.heading, 45.0);
            previous = vehicle.speed;
        }
        assert_eq!(vehicle.speed, 0.0);
    }

    #[test]
    fn test_reverse_speed_decays_without_input() {
        let mut vehicle = moving_vehicle(-6.0);
        let mut previous = vehicle.speed.abs();

        for _ in 0..2000 {
            vehicle.advance();
            assert!(vehicle.speed.abs() <= previous);
            assert!(vehicle.speed <= 0.0);
            previous = vehicle.speed.abs();
        }
        assert_eq!(vehicle.speed, 0.0);
    }

    #[test]
    fn test_custom_tuning_limits() {
        let tuning = VehicleTuning {
            max_forward_speed: 3.0,
            turn_rate: 90.0,
            ..Default::default()
        };
        let mut vehicle = VehicleModel::with_tuning("1", 0.0, 0.0, tuning);
        assert_eq!(vehicle.tuning().max_forward_speed, 3.0);

        for _ in 0..10 {
            vehicle.apply_input(UP);
        }
        assert_eq!(vehicle.speed, 3.0);

        vehicle.apply_input(DirectionalInput {
            right: true,
            ..Default::default()
        });
        assert_approx_eq!(vehicle.heading, 90.0, 1e-9);
    }

    #[test]
    fn test_small_speed_snaps_to_zero() {
        let mut vehicle = moving_vehicle(0.2);
        vehicle.advance();
        assert_eq!(vehicle.speed, 0.0);

        let mut vehicle = moving_vehicle(-0.15);
        vehicle.advance();
        assert_eq!(vehicle.speed, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_only_refreshed_by_real_input() {
        let mut vehicle = VehicleModel::new("1", 0.0, 0.0);
        let stale = vehicle.last_activity;
        tokio::time::sleep(Duration::from_secs(60)).await;

        vehicle.apply_input(DirectionalInput::default());
        assert_eq!(vehicle.last_activity, stale);
        assert!(vehicle.is_inactive(Duration::from_secs(30)));

        vehicle.apply_input(UP);
        assert!(vehicle.last_activity > stale);
        assert!(!vehicle.is_inactive(Duration::from_secs(30)));
    }

    #[test]
    fn test_advance_checkpoint_finishes_once() {
        let mut vehicle = VehicleModel::new("1", 0.0, 0.0);

        assert!(!vehicle.advance_checkpoint(2));
        assert_eq!(vehicle.checkpoint_index, 1);
        assert!(vehicle.advance_checkpoint(2));
        assert!(vehicle.finished);

        assert!(!vehicle.advance_checkpoint(2));
        assert_eq!(vehicle.checkpoint_index, 2);
        assert!(vehicle.finished);
    }

    #[test]
    fn test_snapshot() {
        let mut vehicle = VehicleModel::new("2", 100.0, 350.0);
        vehicle.speed = 3.0;
        vehicle.heading = 270.0;
        vehicle.checkpoint_index = 4;

        let snapshot = vehicle.snapshot();
        assert_eq!(snapshot.id, "2");
        assert_eq!(snapshot.x, 100.0);
        assert_eq!(snapshot.y, 350.0);
        assert_eq!(snapshot.angle, 270.0);
        assert_eq!(snapshot.speed, 3.0);
        assert_eq!(snapshot.checkpoint, 4);
        assert!(!snapshot.finished);
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_approx_eq!(normalize_heading(-5.0), 355.0, 1e-9);
        assert_approx_eq!(normalize_heading(725.0), 5.0, 1e-9);
        assert!(normalize_heading(-1e-18) < 360.0);
    }
}
