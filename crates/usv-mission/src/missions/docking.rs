//! Docking: approach point, alignment, and final run-in.
//!
//! ```text
//! NavigateToApproach ──(< 2 m from approach point)──▶ AlignWithDock
//! AlignWithDock ──(heading error < 5°)──▶ FinalApproach
//! FinalApproach ──(< 1 m from dock)──▶ Docked
//! ```
//!
//! The approach point lies `approach_distance` meters behind the dock, on the
//! reciprocal of the dock heading.  At most one transition happens per
//! update.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use usv_nav::geo::{bearing, destination, distance, heading_error, wrap_360};
use usv_types::{GuidanceCommand, Position, UsvError};

use crate::clock::SharedClock;

const APPROACH_ARRIVAL_M: f64 = 2.0;
const ALIGNED_DEG: f64 = 5.0;
const DOCKED_M: f64 = 1.0;

const TRANSIT_THRUST: f64 = 0.6;
const TRANSIT_SLOWDOWN_M: f64 = 10.0;
const MIN_TRANSIT_THRUST: f64 = 0.2;
const ALIGN_THRUST: f64 = 0.1;
const FINE_ALIGN_THRUST: f64 = 0.05;
const FINE_ALIGN_DEG: f64 = 10.0;
const FINAL_SLOWDOWN_M: f64 = 3.0;
const MIN_FINAL_THRUST: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DockingState {
    NavigateToApproach,
    AlignWithDock,
    FinalApproach,
    Docked,
}

impl fmt::Display for DockingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DockingState::NavigateToApproach => "NAVIGATE_TO_APPROACH",
            DockingState::AlignWithDock => "ALIGN_WITH_DOCK",
            DockingState::FinalApproach => "FINAL_APPROACH",
            DockingState::Docked => "DOCKED",
        };
        f.write_str(s)
    }
}

/// Result of one [`DockingMission::update`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockingStatus {
    /// State after this update.
    pub state: DockingState,
    pub distance_to_approach: f64,
    pub distance_to_dock: f64,
    pub heading_error: f64,
    pub mission_complete: bool,
}

#[derive(Debug, Clone)]
pub struct DockingMission {
    dock: Position,
    dock_heading: f64,
    approach_distance: f64,
    approach_speed: f64,
    approach_point: Position,
    state: DockingState,
    clock: SharedClock,
    // Set on the first update, so time spent queued is not counted.
    state_entered: Option<Duration>,
}

impl DockingMission {
    /// # Errors
    ///
    /// [`UsvError::InvalidMission`] when the dock position or heading is not
    /// finite, the approach distance is negative, or the approach speed is
    /// outside `[0, 1]`.
    pub fn new(
        dock: Position,
        dock_heading: f64,
        approach_distance: f64,
        approach_speed: f64,
        clock: SharedClock,
    ) -> Result<Self, UsvError> {
        if !dock.is_finite() {
            return Err(UsvError::InvalidMission(format!(
                "dock position {dock} is not finite"
            )));
        }
        if !dock_heading.is_finite() {
            return Err(UsvError::InvalidMission(format!(
                "dock heading must be finite, got {dock_heading}"
            )));
        }
        if !approach_distance.is_finite() || approach_distance < 0.0 {
            return Err(UsvError::InvalidMission(format!(
                "approach distance must be non-negative, got {approach_distance}"
            )));
        }
        if !(0.0..=1.0).contains(&approach_speed) {
            return Err(UsvError::InvalidMission(format!(
                "approach speed must be within [0, 1], got {approach_speed}"
            )));
        }

        let dock_heading = wrap_360(dock_heading);
        let approach_point = destination(dock, wrap_360(dock_heading + 180.0), approach_distance);
        info!(%dock, dock_heading, %approach_point, "Created docking mission");

        Ok(Self {
            dock,
            dock_heading,
            approach_distance,
            approach_speed,
            approach_point,
            state: DockingState::NavigateToApproach,
            clock,
            state_entered: None,
        })
    }

    pub fn dock(&self) -> Position {
        self.dock
    }

    pub fn dock_heading(&self) -> f64 {
        self.dock_heading
    }

    pub fn approach_distance(&self) -> f64 {
        self.approach_distance
    }

    pub fn approach_speed(&self) -> f64 {
        self.approach_speed
    }

    pub fn approach_point(&self) -> Position {
        self.approach_point
    }

    pub fn state(&self) -> DockingState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == DockingState::Docked
    }

    /// How long the mission has been in its current state.  Zero until the
    /// first [`update`](Self::update).
    pub fn time_in_state(&self) -> Duration {
        self.state_entered
            .map_or(Duration::ZERO, |t| self.clock.elapsed().saturating_sub(t))
    }

    fn transition(&mut self, next: DockingState) {
        info!(
            from = %self.state,
            to = %next,
            after_secs = self.time_in_state().as_secs_f64(),
            "Docking state transition"
        );
        self.state = next;
        self.state_entered = Some(self.clock.elapsed());
    }

    pub fn update(&mut self, position: Position, heading: f64) -> Result<DockingStatus, UsvError> {
        if self.is_complete() {
            return Ok(DockingStatus {
                state: DockingState::Docked,
                distance_to_approach: 0.0,
                distance_to_dock: 0.0,
                heading_error: 0.0,
                mission_complete: true,
            });
        }
        validate(position, heading)?;
        if self.state_entered.is_none() {
            self.state_entered = Some(self.clock.elapsed());
        }

        let to_approach = distance(position, self.approach_point);
        let to_dock = distance(position, self.dock);
        let error = heading_error(heading, self.dock_heading);

        match self.state {
            DockingState::NavigateToApproach if to_approach < APPROACH_ARRIVAL_M => {
                self.transition(DockingState::AlignWithDock);
            }
            DockingState::AlignWithDock if error < ALIGNED_DEG => {
                self.transition(DockingState::FinalApproach);
            }
            DockingState::FinalApproach if to_dock < DOCKED_M => {
                self.transition(DockingState::Docked);
                info!(%position, "Docked");
            }
            _ => debug!(state = %self.state, to_approach, to_dock, error, "Docking in progress"),
        }

        Ok(DockingStatus {
            state: self.state,
            distance_to_approach: to_approach,
            distance_to_dock: to_dock,
            heading_error: error,
            mission_complete: self.is_complete(),
        })
    }

    pub fn guidance(&self, position: Position, heading: f64) -> Result<GuidanceCommand, UsvError> {
        if self.is_complete() {
            return Ok(GuidanceCommand {
                heading_deg: self.dock_heading,
                distance_m: None,
                thrust: Some(0.0),
                is_complete: true,
            });
        }
        validate(position, heading)?;

        let cmd = match self.state {
            DockingState::NavigateToApproach => {
                let d = distance(position, self.approach_point);
                let thrust = if d > TRANSIT_SLOWDOWN_M {
                    TRANSIT_THRUST
                } else {
                    MIN_TRANSIT_THRUST.max(TRANSIT_THRUST * d / TRANSIT_SLOWDOWN_M)
                };
                GuidanceCommand {
                    heading_deg: bearing(position, self.approach_point),
                    distance_m: Some(d),
                    thrust: Some(thrust),
                    is_complete: false,
                }
            }
            DockingState::AlignWithDock => {
                let thrust = if heading_error(heading, self.dock_heading) < FINE_ALIGN_DEG {
                    FINE_ALIGN_THRUST
                } else {
                    ALIGN_THRUST
                };
                GuidanceCommand {
                    heading_deg: self.dock_heading,
                    distance_m: Some(distance(position, self.dock)),
                    thrust: Some(thrust),
                    is_complete: false,
                }
            }
            DockingState::FinalApproach => {
                let d = distance(position, self.dock);
                let thrust = if d < FINAL_SLOWDOWN_M {
                    MIN_FINAL_THRUST.max(self.approach_speed * d / FINAL_SLOWDOWN_M)
                } else {
                    self.approach_speed
                };
                GuidanceCommand {
                    heading_deg: self.dock_heading,
                    distance_m: Some(d),
                    thrust: Some(thrust),
                    is_complete: false,
                }
            }
            DockingState::Docked => GuidanceCommand {
                heading_deg: self.dock_heading,
                distance_m: None,
                thrust: Some(0.0),
                is_complete: true,
            },
        };
        Ok(cmd)
    }
}

fn validate(position: Position, heading: f64) -> Result<(), UsvError> {
    position.validate()?;
    if !heading.is_finite() {
        return Err(UsvError::InvalidTelemetry {
            field: "heading".to_string(),
            value: heading,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const DOCK: Position = Position::new(-36.8485, 174.7633);
    const DOCK_HEADING: f64 = 270.0;

    fn mission() -> (ManualClock, DockingMission) {
        let clock = ManualClock::new();
        let m = DockingMission::new(DOCK, DOCK_HEADING, 20.0, 0.3, clock.shared()).unwrap();
        (clock, m)
    }

    #[test]
    fn approach_point_is_behind_the_dock() {
        let (_clock, m) = mission();
        let ap = m.approach_point();
        assert!((distance(DOCK, ap) - 20.0).abs() < 1e-6);
        assert!(heading_error(bearing(DOCK, ap), 90.0) < 1e-3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let clock = ManualClock::new();
        assert!(DockingMission::new(DOCK, f64::NAN, 20.0, 0.3, clock.shared()).is_err());
        assert!(DockingMission::new(DOCK, 90.0, -5.0, 0.3, clock.shared()).is_err());
        assert!(DockingMission::new(DOCK, 90.0, 20.0, 1.5, clock.shared()).is_err());
    }

    #[test]
    fn full_docking_walk_moves_forward_only() {
        let (clock, mut m) = mission();
        let far = destination(DOCK, 90.0, 200.0);
        let ap = m.approach_point();

        let s = m.update(far, 0.0).unwrap();
        assert_eq!(s.state, DockingState::NavigateToApproach);

        clock.advance_secs(10.0);
        let s = m.update(ap, 0.0).unwrap();
        assert_eq!(s.state, DockingState::AlignWithDock);
        assert_eq!(m.time_in_state(), Duration::ZERO);

        // Misaligned: hold state.
        let s = m.update(ap, 200.0).unwrap();
        assert_eq!(s.state, DockingState::AlignWithDock);
        assert!((s.heading_error - 70.0).abs() < 1e-9);

        let s = m.update(ap, 268.0).unwrap();
        assert_eq!(s.state, DockingState::FinalApproach);

        let s = m.update(destination(DOCK, 90.0, 0.5), DOCK_HEADING).unwrap();
        assert_eq!(s.state, DockingState::Docked);
        assert!(s.mission_complete);

        let s = m.update(far, 0.0).unwrap();
        assert_eq!(s.state, DockingState::Docked);
        assert!(s.mission_complete);
    }

    #[test]
    fn one_transition_per_update() {
        let (_clock, mut m) = mission();
        let ap = m.approach_point();
        let s = m.update(ap, DOCK_HEADING).unwrap();
        assert_eq!(s.state, DockingState::AlignWithDock);
        let s = m.update(DOCK, DOCK_HEADING).unwrap();
        assert_eq!(s.state, DockingState::FinalApproach);
        let s = m.update(DOCK, DOCK_HEADING).unwrap();
        assert_eq!(s.state, DockingState::Docked);
    }

    #[test]
    fn time_in_state_tracks_clock() {
        let (clock, mut m) = mission();
        let far = destination(m.approach_point(), 90.0, 100.0);
        m.update(far, 0.0).unwrap();
        clock.advance_secs(7.5);
        assert_eq!(m.time_in_state(), Duration::from_millis(7500));
    }

    #[test]
    fn time_in_state_excludes_time_before_first_update() {
        let (clock, mut m) = mission();
        clock.advance_secs(60.0);
        assert_eq!(m.time_in_state(), Duration::ZERO);

        let far = destination(m.approach_point(), 90.0, 100.0);
        m.update(far, 0.0).unwrap();
        clock.advance_secs(2.0);
        assert_eq!(m.time_in_state(), Duration::from_secs(2));
        assert_eq!(m.state(), DockingState::NavigateToApproach);
    }

    #[test]
    fn navigate_guidance_tapers_near_approach_point() {
        let (_clock, m) = mission();
        let ap = m.approach_point();

        let far = m.guidance(destination(ap, 90.0, 100.0), 0.0).unwrap();
        assert_eq!(far.thrust, Some(0.6));
        assert!(heading_error(far.heading_deg, 270.0) < 1e-2);

        let mid = m.guidance(destination(ap, 90.0, 5.0), 0.0).unwrap();
        assert!((mid.thrust.unwrap() - 0.3).abs() < 1e-6);

        let close = m.guidance(destination(ap, 90.0, 1.0), 0.0).unwrap();
        assert_eq!(close.thrust, Some(0.2));
    }

    #[test]
    fn align_and_final_guidance() {
        let (_clock, mut m) = mission();
        let ap = m.approach_point();
        m.update(ap, 0.0).unwrap();

        let coarse = m.guidance(ap, 180.0).unwrap();
        assert_eq!(coarse.heading_deg, DOCK_HEADING);
        assert_eq!(coarse.thrust, Some(0.1));
        let fine = m.guidance(ap, 265.0).unwrap();
        assert_eq!(fine.thrust, Some(0.05));

        m.update(ap, DOCK_HEADING).unwrap();
        assert_eq!(m.state(), DockingState::FinalApproach);

        let run_in = m.guidance(ap, DOCK_HEADING).unwrap();
        assert_eq!(run_in.thrust, Some(0.3));
        let taper = m.guidance(destination(DOCK, 90.0, 1.5), DOCK_HEADING).unwrap();
        assert!((taper.thrust.unwrap() - 0.15).abs() < 1e-6);
        let last = m.guidance(destination(DOCK, 90.0, 0.3), DOCK_HEADING).unwrap();
        assert_eq!(last.thrust, Some(0.1));
    }

    #[test]
    fn docked_guidance_holds_dock_heading() {
        let (_clock, mut m) = mission();
        m.update(m.approach_point(), DOCK_HEADING).unwrap();
        m.update(DOCK, DOCK_HEADING).unwrap();
        m.update(DOCK, DOCK_HEADING).unwrap();
        let cmd = m.guidance(DOCK, 0.0).unwrap();
        assert!(cmd.is_complete);
        assert_eq!(cmd.heading_deg, DOCK_HEADING);
        assert_eq!(cmd.thrust, Some(0.0));
    }

    #[test]
    fn non_finite_heading_is_rejected() {
        let (_clock, mut m) = mission();
        assert!(matches!(
            m.update(DOCK, f64::INFINITY),
            Err(UsvError::InvalidTelemetry { field, .. }) if field == "heading"
        ));
    }

    #[test]
    fn state_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&DockingState::NavigateToApproach).unwrap();
        assert_eq!(json, "\"NAVIGATE_TO_APPROACH\"");
    }
}
