//! Mission state machines and the [`Mission`] enum the manager dispatches on.
//!
//! | Variant | Completes when |
//! |---------|----------------|
//! | [`WaypointMission`]       | The last waypoint is within the arrival radius. |
//! | [`StationKeepingMission`] | The vessel dwells inside the tolerance radius for the full duration. |
//! | [`DockingMission`]        | The final approach closes to within 1 m of the dock. |
//!
//! Every variant exposes `update` (advance progress, report a status) and
//! `guidance` (produce this cycle's [`GuidanceCommand`]).  Docking is the only
//! variant that reads the vessel heading.

mod docking;
mod station_keeping;
mod waypoint;

pub use docking::{DockingMission, DockingState, DockingStatus};
pub use station_keeping::{StationKeepingMission, StationKeepingStatus};
pub use waypoint::{WaypointMission, WaypointStatus};

use serde::{Deserialize, Serialize};
use usv_types::{GuidanceCommand, MissionKind, Position, UsvError};

/// Per-update status of whichever mission is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mission_type", rename_all = "snake_case")]
pub enum MissionOutcome {
    Waypoint(WaypointStatus),
    StationKeeping(StationKeepingStatus),
    Docking(DockingStatus),
}

impl MissionOutcome {
    pub fn kind(&self) -> MissionKind {
        match self {
            MissionOutcome::Waypoint(_) => MissionKind::Waypoint,
            MissionOutcome::StationKeeping(_) => MissionKind::StationKeeping,
            MissionOutcome::Docking(_) => MissionKind::Docking,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            MissionOutcome::Waypoint(s) => s.mission_complete,
            MissionOutcome::StationKeeping(s) => s.mission_complete,
            MissionOutcome::Docking(s) => s.mission_complete,
        }
    }
}

/// A mission of any kind, owning its target geometry and progress.
#[derive(Debug, Clone)]
pub enum Mission {
    Waypoint(WaypointMission),
    StationKeeping(StationKeepingMission),
    Docking(DockingMission),
}

impl Mission {
    pub fn kind(&self) -> MissionKind {
        match self {
            Mission::Waypoint(_) => MissionKind::Waypoint,
            Mission::StationKeeping(_) => MissionKind::StationKeeping,
            Mission::Docking(_) => MissionKind::Docking,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Mission::Waypoint(m) => m.is_complete(),
            Mission::StationKeeping(m) => m.is_complete(),
            Mission::Docking(m) => m.is_complete(),
        }
    }

    /// Advance the mission one cycle and compute its guidance.
    ///
    /// Guidance is computed after the update, so a mission that completes
    /// this cycle returns its terminal command.
    pub fn step(
        &mut self,
        position: Position,
        heading: f64,
    ) -> Result<(MissionOutcome, GuidanceCommand), UsvError> {
        match self {
            Mission::Waypoint(m) => {
                let status = m.update(position)?;
                Ok((MissionOutcome::Waypoint(status), m.guidance(position)?))
            }
            Mission::StationKeeping(m) => {
                let status = m.update(position)?;
                Ok((MissionOutcome::StationKeeping(status), m.guidance(position)?))
            }
            Mission::Docking(m) => {
                let status = m.update(position, heading)?;
                Ok((MissionOutcome::Docking(status), m.guidance(position, heading)?))
            }
        }
    }
}

impl From<WaypointMission> for Mission {
    fn from(m: WaypointMission) -> Self {
        Mission::Waypoint(m)
    }
}

impl From<StationKeepingMission> for Mission {
    fn from(m: StationKeepingMission) -> Self {
        Mission::StationKeeping(m)
    }
}

impl From<DockingMission> for Mission {
    fn from(m: DockingMission) -> Self {
        Mission::Docking(m)
    }
}
