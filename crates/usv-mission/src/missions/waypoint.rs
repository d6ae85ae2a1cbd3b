//! Waypoint transit: visit an ordered list of positions.

use serde::{Deserialize, Serialize};
use tracing::info;
use usv_nav::geo::{bearing, distance};
use usv_types::{GuidanceCommand, Position, UsvError};

/// Result of one [`WaypointMission::update`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointStatus {
    pub distance_to_waypoint: f64,
    pub bearing_to_waypoint: f64,
    /// True when this update reached the waypoint it was targeting.
    pub waypoint_reached: bool,
    /// Index of the waypoint targeted after this update.
    pub current_waypoint: usize,
    pub mission_complete: bool,
}

/// Navigate through `waypoints` in order, advancing once within
/// `arrival_radius` meters of the current target.
#[derive(Debug, Clone)]
pub struct WaypointMission {
    waypoints: Vec<Position>,
    arrival_radius: f64,
    current_index: usize,
    complete: bool,
}

impl WaypointMission {
    /// Create a waypoint mission.
    ///
    /// # Errors
    ///
    /// [`UsvError::InvalidMission`] when `waypoints` is empty, a waypoint is
    /// not finite, or `arrival_radius` is negative or not finite.
    pub fn new(waypoints: Vec<Position>, arrival_radius: f64) -> Result<Self, UsvError> {
        if waypoints.is_empty() {
            return Err(UsvError::InvalidMission(
                "waypoint mission requires at least one waypoint".to_string(),
            ));
        }
        if let Some(bad) = waypoints.iter().position(|wp| !wp.is_finite()) {
            return Err(UsvError::InvalidMission(format!("waypoint {bad} is not finite")));
        }
        if !arrival_radius.is_finite() || arrival_radius < 0.0 {
            return Err(UsvError::InvalidMission(format!(
                "arrival radius must be a non-negative number, got {arrival_radius}"
            )));
        }
        info!(count = waypoints.len(), arrival_radius, "Created waypoint mission");
        Ok(Self {
            waypoints,
            arrival_radius,
            current_index: 0,
            complete: false,
        })
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn arrival_radius(&self) -> f64 {
        self.arrival_radius
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The waypoint currently being steered to.
    pub fn current_waypoint(&self) -> Position {
        self.waypoints[self.current_index]
    }

    /// The waypoint after the current one, if any.
    pub fn next_waypoint(&self) -> Option<Position> {
        self.waypoints.get(self.current_index + 1).copied()
    }

    /// Restart the mission from the first waypoint.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.complete = false;
    }

    /// Advance the mission for the vehicle at `position`.
    ///
    /// Once complete, further calls return zero distance and bearing and
    /// leave the index untouched.
    pub fn update(&mut self, position: Position) -> Result<WaypointStatus, UsvError> {
        if self.complete {
            return Ok(WaypointStatus {
                distance_to_waypoint: 0.0,
                bearing_to_waypoint: 0.0,
                waypoint_reached: false,
                current_waypoint: self.current_index,
                mission_complete: true,
            });
        }
        position.validate()?;

        let target = self.current_waypoint();
        let dist = distance(position, target);
        let brg = bearing(position, target);
        let reached = dist <= self.arrival_radius;

        if reached {
            info!(index = self.current_index, %target, "Reached waypoint");
            if self.current_index + 1 < self.waypoints.len() {
                self.current_index += 1;
                info!(index = self.current_index, target = %self.current_waypoint(), "Moving to next waypoint");
            } else {
                info!("Final waypoint reached; waypoint mission complete");
                self.complete = true;
            }
        }

        Ok(WaypointStatus {
            distance_to_waypoint: dist,
            bearing_to_waypoint: brg,
            waypoint_reached: reached,
            current_waypoint: self.current_index,
            mission_complete: self.complete,
        })
    }

    /// Steer towards the current waypoint.  No thrust is set; callers band
    /// thrust by distance (see [`GuidanceCommand::effective_thrust`]).
    pub fn guidance(&self, position: Position) -> Result<GuidanceCommand, UsvError> {
        if self.complete {
            return Ok(GuidanceCommand {
                heading_deg: 0.0,
                distance_m: Some(0.0),
                thrust: None,
                is_complete: true,
            });
        }
        position.validate()?;

        let target = self.current_waypoint();
        Ok(GuidanceCommand {
            heading_deg: bearing(position, target),
            distance_m: Some(distance(position, target)),
            thrust: None,
            is_complete: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usv_nav::geo::destination;

    const HOME: Position = Position::new(37.7749, -122.4194);

    fn route() -> Vec<Position> {
        vec![
            destination(HOME, 0.0, 80.0),
            destination(HOME, 45.0, 200.0),
            destination(HOME, 90.0, 300.0),
        ]
    }

    #[test]
    fn empty_waypoint_list_is_rejected() {
        assert!(matches!(
            WaypointMission::new(vec![], 5.0),
            Err(UsvError::InvalidMission(_))
        ));
    }

    #[test]
    fn negative_radius_is_rejected() {
        assert!(WaypointMission::new(route(), -1.0).is_err());
        assert!(WaypointMission::new(route(), f64::NAN).is_err());
    }

    #[test]
    fn far_from_waypoint_does_not_advance() {
        let mut mission = WaypointMission::new(route(), 5.0).unwrap();
        let status = mission.update(HOME).unwrap();
        assert!(!status.waypoint_reached);
        assert_eq!(status.current_waypoint, 0);
        assert!((status.distance_to_waypoint - 80.0).abs() < 1e-6);
        assert!(status.bearing_to_waypoint.abs() < 1e-6);
    }

    #[test]
    fn reaching_waypoint_advances_index() {
        let wps = route();
        let mut mission = WaypointMission::new(wps.clone(), 5.0).unwrap();
        let status = mission.update(destination(wps[0], 180.0, 3.0)).unwrap();
        assert!(status.waypoint_reached);
        assert_eq!(status.current_waypoint, 1);
        assert_eq!(mission.current_waypoint(), wps[1]);
        assert_eq!(mission.next_waypoint(), Some(wps[2]));
    }

    #[test]
    fn index_is_monotonic_and_completion_is_sticky() {
        let wps = route();
        let mut mission = WaypointMission::new(wps.clone(), 5.0).unwrap();
        let track = [HOME, wps[0], HOME, wps[1], wps[0], wps[2], HOME, wps[0]];

        let mut last_index = 0;
        let mut completed_at = None;
        for (step, pos) in track.iter().enumerate() {
            let status = mission.update(*pos).unwrap();
            assert!(status.current_waypoint >= last_index);
            last_index = status.current_waypoint;
            if status.mission_complete && completed_at.is_none() {
                completed_at = Some(step);
            }
            if completed_at.is_some_and(|s| step > s) {
                assert_eq!(status.distance_to_waypoint, 0.0);
                assert_eq!(status.bearing_to_waypoint, 0.0);
                assert_eq!(status.current_waypoint, 2);
            }
        }
        assert_eq!(completed_at, Some(5));
        assert!(mission.is_complete());
    }

    #[test]
    fn guidance_points_at_current_waypoint() {
        let mission = WaypointMission::new(route(), 5.0).unwrap();
        let cmd = mission.guidance(HOME).unwrap();
        assert!(cmd.heading_deg.abs() < 1e-6);
        assert!((cmd.distance_m.unwrap() - 80.0).abs() < 1e-6);
        assert!(cmd.thrust.is_none());
        assert!(!cmd.is_complete);
        assert_eq!(cmd.effective_thrust(), 0.7);
    }

    #[test]
    fn guidance_after_completion_is_zeroed() {
        let mut mission = WaypointMission::new(vec![HOME], 5.0).unwrap();
        assert!(mission.update(HOME).unwrap().mission_complete);
        let cmd = mission.guidance(HOME).unwrap();
        assert!(cmd.is_complete);
        assert_eq!(cmd.heading_deg, 0.0);
        assert_eq!(cmd.effective_thrust(), 0.0);
    }

    #[test]
    fn reset_restarts_from_first_waypoint() {
        let mut mission = WaypointMission::new(vec![HOME], 5.0).unwrap();
        mission.update(HOME).unwrap();
        mission.reset();
        assert!(!mission.is_complete());
        assert_eq!(mission.current_index(), 0);
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let mut mission = WaypointMission::new(route(), 5.0).unwrap();
        assert!(matches!(
            mission.update(Position::new(f64::NAN, 0.0)),
            Err(UsvError::InvalidTelemetry { .. })
        ));
        assert_eq!(mission.current_index(), 0);
    }
}
