//! Kinematic demo vessel driven by guidance commands.

use usv_nav::geo::{destination, wrap_180, wrap_360};
use usv_types::{GuidanceCommand, Position};

use crate::config::VehicleConfig;

// Below this speed the vessel is treated as stationary.
const MIN_MOVING_SPEED: f64 = 0.001;

/// Point-mass vessel with a turn-rate and acceleration limit.
#[derive(Debug, Clone)]
pub struct DemoVessel {
    position: Position,
    heading: f64,
    speed: f64,
    limits: VehicleConfig,
    travelled_m: f64,
}

impl DemoVessel {
    pub fn new(position: Position, heading: f64, limits: VehicleConfig) -> Self {
        Self {
            position,
            heading: wrap_360(heading),
            speed: 0.0,
            limits,
            travelled_m: 0.0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn travelled_m(&self) -> f64 {
        self.travelled_m
    }

    /// Follow `cmd` for `dt` seconds, or coast to a stop when there is none.
    pub fn apply(&mut self, cmd: Option<&GuidanceCommand>, dt: f64) {
        match cmd {
            Some(cmd) => {
                let speed = cmd.effective_thrust() * self.limits.max_speed;
                self.step(cmd.heading_deg, speed, dt);
            }
            None => self.step(self.heading, 0.0, dt),
        }
    }

    /// Advance `dt` seconds towards `desired_heading` at `desired_speed`.
    pub fn step(&mut self, desired_heading: f64, desired_speed: f64, dt: f64) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let desired_speed = desired_speed.clamp(0.0, self.limits.max_speed);

        let max_turn = self.limits.turn_rate * dt;
        let turn = wrap_180(desired_heading - self.heading).clamp(-max_turn, max_turn);
        self.heading = wrap_360(self.heading + turn);

        let max_dv = self.limits.acceleration * dt;
        self.speed += (desired_speed - self.speed).clamp(-max_dv, max_dv);

        if self.speed > MIN_MOVING_SPEED {
            let d = self.speed * dt;
            self.position = destination(self.position, self.heading, d);
            self.travelled_m += d;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usv_nav::geo::{bearing, distance, heading_error};

    const START: Position = Position::new(-41.2865, 174.7762);

    fn vessel() -> DemoVessel {
        DemoVessel::new(START, 0.0, VehicleConfig::default())
    }

    #[test]
    fn turn_rate_is_limited() {
        let mut v = vessel();
        v.step(90.0, 0.0, 1.0);
        assert!((v.heading() - 15.0).abs() < 1e-9);
        v.step(300.0, 0.0, 1.0);
        assert!(v.heading().abs() < 1e-9);
    }

    #[test]
    fn acceleration_is_limited_and_speed_capped() {
        let mut v = vessel();
        v.step(0.0, 10.0, 1.0);
        assert!((v.speed() - 0.5).abs() < 1e-9);
        for _ in 0..10 {
            v.step(0.0, 10.0, 1.0);
        }
        assert_eq!(v.speed(), 2.0);
    }

    #[test]
    fn moves_along_heading() {
        let mut v = vessel();
        for _ in 0..100 {
            v.step(0.0, 2.0, 0.1);
        }
        let moved = distance(START, v.position());
        assert!((moved - v.travelled_m()).abs() < 1e-6);
        assert!(moved > 5.0);
        assert!(heading_error(bearing(START, v.position()), 0.0) < 1e-6);
    }

    #[test]
    fn no_guidance_coasts_to_stop() {
        let mut v = vessel();
        v.step(0.0, 2.0, 4.0);
        v.apply(None, 2.0);
        v.apply(None, 2.0);
        assert_eq!(v.speed(), 0.0);
    }

    #[test]
    fn guidance_thrust_sets_target_speed() {
        let mut v = vessel();
        let cmd = GuidanceCommand {
            heading_deg: 0.0,
            distance_m: None,
            thrust: Some(0.5),
            is_complete: false,
        };
        for _ in 0..50 {
            v.apply(Some(&cmd), 0.1);
        }
        assert!((v.speed() - 1.0).abs() < 1e-9);
    }
}
