//! Station keeping: hold within a tolerance radius for a dwell time.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use usv_nav::geo::{bearing, distance};
use usv_types::{GuidanceCommand, Position, UsvError};

use crate::clock::SharedClock;

const MAX_TRANSIT_THRUST: f64 = 0.8;
const MAX_HOLD_THRUST: f64 = 0.2;

/// Result of one [`StationKeepingMission::update`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationKeepingStatus {
    pub distance_to_station: f64,
    pub bearing_to_station: f64,
    pub in_tolerance_zone: bool,
    /// Seconds of dwell still required; zero outside the zone.
    pub time_remaining: f64,
    pub mission_complete: bool,
}

/// Hold position within `tolerance_radius` meters of `target` for an
/// uninterrupted `duration`.
///
/// Leaving the zone before the dwell expires discards the elapsed time.
#[derive(Debug, Clone)]
pub struct StationKeepingMission {
    target: Position,
    tolerance_radius: f64,
    duration: Duration,
    clock: SharedClock,
    entered_at: Option<Duration>,
    complete: bool,
}

impl StationKeepingMission {
    /// # Errors
    ///
    /// [`UsvError::InvalidMission`] when the target is not finite, the
    /// radius is not a positive number, or the duration is negative or not
    /// finite.
    pub fn new(
        target: Position,
        tolerance_radius: f64,
        duration_secs: f64,
        clock: SharedClock,
    ) -> Result<Self, UsvError> {
        if !target.is_finite() {
            return Err(UsvError::InvalidMission(format!(
                "station target {target} is not finite"
            )));
        }
        if !tolerance_radius.is_finite() || tolerance_radius <= 0.0 {
            return Err(UsvError::InvalidMission(format!(
                "tolerance radius must be positive, got {tolerance_radius}"
            )));
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(UsvError::InvalidMission(format!(
                "station keeping duration must be non-negative, got {duration_secs}"
            )));
        }
        info!(%target, tolerance_radius, duration_secs, "Created station keeping mission");
        Ok(Self {
            target,
            tolerance_radius,
            duration: Duration::from_secs_f64(duration_secs),
            clock,
            entered_at: None,
            complete: false,
        })
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn tolerance_radius(&self) -> f64 {
        self.tolerance_radius
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Seconds of dwell still required, or `None` while outside the zone.
    pub fn time_remaining(&self) -> Option<f64> {
        if self.complete {
            return Some(0.0);
        }
        self.entered_at.map(|entered| {
            let held = self.clock.elapsed().saturating_sub(entered);
            self.duration.saturating_sub(held).as_secs_f64()
        })
    }

    pub fn update(&mut self, position: Position) -> Result<StationKeepingStatus, UsvError> {
        if self.complete {
            return Ok(StationKeepingStatus {
                distance_to_station: 0.0,
                bearing_to_station: 0.0,
                in_tolerance_zone: true,
                time_remaining: 0.0,
                mission_complete: true,
            });
        }
        position.validate()?;

        let dist = distance(position, self.target);
        let brg = bearing(position, self.target);
        let in_zone = dist <= self.tolerance_radius;
        let now = self.clock.elapsed();

        match (in_zone, self.entered_at) {
            (true, None) => {
                info!(distance = dist, "Entered station keeping zone");
                self.entered_at = Some(now);
            }
            (false, Some(_)) => {
                info!(distance = dist, "Left station keeping zone; dwell timer reset");
                self.entered_at = None;
            }
            _ => {}
        }

        let mut time_remaining = 0.0;
        if let Some(entered) = self.entered_at {
            let held = now.saturating_sub(entered);
            if held >= self.duration {
                info!(held_secs = held.as_secs_f64(), "Station keeping complete");
                self.complete = true;
            } else {
                time_remaining = (self.duration - held).as_secs_f64();
                debug!(time_remaining, "Holding station");
            }
        }

        Ok(StationKeepingStatus {
            distance_to_station: dist,
            bearing_to_station: brg,
            in_tolerance_zone: in_zone,
            time_remaining,
            mission_complete: self.complete,
        })
    }

    /// Steer at the station; thrust scales with distance, gently inside the
    /// zone.
    pub fn guidance(&self, position: Position) -> Result<GuidanceCommand, UsvError> {
        if self.complete {
            return Ok(GuidanceCommand {
                heading_deg: 0.0,
                distance_m: Some(0.0),
                thrust: Some(0.0),
                is_complete: true,
            });
        }
        position.validate()?;

        let dist = distance(position, self.target);
        let thrust = if dist > self.tolerance_radius {
            MAX_TRANSIT_THRUST.min(dist / 100.0)
        } else {
            MAX_HOLD_THRUST.min(dist / (2.0 * self.tolerance_radius))
        };

        Ok(GuidanceCommand {
            heading_deg: bearing(position, self.target),
            distance_m: Some(dist),
            thrust: Some(thrust),
            is_complete: false,
        })
    }
}
