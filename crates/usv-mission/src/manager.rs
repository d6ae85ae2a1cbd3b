//! [`MissionManager`] – FIFO mission queue and execution state machine.
//!
//! ```text
//!            start                 pause
//!   Idle ───────────▶ Running ◀──────────▶ Paused
//!     ▲                │  │      resume
//!     │ queue empty    │  └──── dispatch error ───▶ Error
//!     └────────────────┤
//!                      └─ last mission done ───▶ Completed
//!
//!   abort (from any state) ───▶ Aborted
//! ```
//!
//! The manager is driven by [`MissionManager::update`], called once per
//! control cycle with fresh telemetry.  `Completed` and `Aborted` accept
//! `start` again once new missions are queued; `Error` only leaves through
//! `abort`.
//!
//! # Example
//!
//! ```
//! use usv_mission::{ManagerStatus, MissionManager};
//! use usv_types::{MissionKind, Position};
//!
//! let mut manager = MissionManager::new();
//! let here = Position::new(37.7749, -122.4194);
//! manager.add_waypoint_mission(vec![here], 5.0).unwrap();
//! manager.start().unwrap();
//!
//! let result = manager.update(here, 90.0);
//! assert_eq!(result.status, ManagerStatus::Completed);
//! assert_eq!(result.mission_kind, Some(MissionKind::Waypoint));
//! assert_eq!(manager.history().len(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use usv_types::{GuidanceCommand, MissionKind, Position, UsvError};
use uuid::Uuid;

use crate::clock::{SharedClock, SystemClock};
use crate::missions::{
    DockingMission, Mission, MissionOutcome, StationKeepingMission, WaypointMission,
};

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ManagerStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
    Error,
}

impl fmt::Display for ManagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManagerStatus::Idle => "IDLE",
            ManagerStatus::Running => "RUNNING",
            ManagerStatus::Paused => "PAUSED",
            ManagerStatus::Completed => "COMPLETED",
            ManagerStatus::Aborted => "ABORTED",
            ManagerStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// A mission waiting in (or pulled from) the queue.
#[derive(Debug, Clone)]
pub struct QueuedMission {
    pub id: Uuid,
    pub mission: Mission,
}

impl QueuedMission {
    pub fn kind(&self) -> MissionKind {
        self.mission.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOutcome {
    Completed,
    Aborted,
}

/// One finished or aborted mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub id: Uuid,
    pub kind: MissionKind,
    pub outcome: RecordOutcome,
    /// Seconds between the mission becoming active and finishing.
    pub duration_secs: f64,
    pub finished_at: DateTime<Utc>,
}

/// What one call to [`MissionManager::update`] produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub status: ManagerStatus,
    pub guidance: Option<GuidanceCommand>,
    pub mission_info: Option<MissionOutcome>,
    /// Kind of the mission active after the update, or of the mission that
    /// just finished when the queue ran dry.
    pub mission_kind: Option<MissionKind>,
}

impl UpdateResult {
    fn idle(status: ManagerStatus) -> Self {
        Self {
            status,
            guidance: None,
            mission_info: None,
            mission_kind: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMission {
    pub id: Uuid,
    pub kind: MissionKind,
    pub running_time_secs: f64,
}

/// Point-in-time view returned by [`MissionManager::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub status: ManagerStatus,
    pub queued_count: usize,
    /// Number of history entries, completed or aborted.
    pub completed_count: usize,
    pub current_position: Option<Position>,
    pub current_heading: Option<f64>,
    pub active_mission: Option<ActiveMission>,
}

// ────────────────────────────────────────────────────────────────────────────
// MissionManager
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MissionManager {
    clock: SharedClock,
    queue: VecDeque<QueuedMission>,
    current: Option<QueuedMission>,
    status: ManagerStatus,
    current_position: Option<Position>,
    current_heading: Option<f64>,
    history: Vec<MissionRecord>,
    mission_started: Option<Duration>,
}

impl Default for MissionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionManager {
    /// Create an idle manager timed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Create an idle manager timed by `clock`.  Missions added through this
    /// manager share the same clock.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            clock,
            queue: VecDeque::new(),
            current: None,
            status: ManagerStatus::Idle,
            current_position: None,
            current_heading: None,
            history: Vec::new(),
            mission_started: None,
        }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // ── Queue ────────────────────────────────────────────────────────────────

    /// Queue a waypoint mission.
    ///
    /// # Errors
    ///
    /// [`UsvError::InvalidMission`] if the mission cannot be constructed.
    pub fn add_waypoint_mission(
        &mut self,
        waypoints: Vec<Position>,
        arrival_radius: f64,
    ) -> Result<Uuid, UsvError> {
        let mission = WaypointMission::new(waypoints, arrival_radius)?;
        Ok(self.enqueue(mission.into()))
    }

    /// Queue a station keeping mission.
    ///
    /// # Errors
    ///
    /// [`UsvError::InvalidMission`] if the mission cannot be constructed.
    pub fn add_station_keeping_mission(
        &mut self,
        station: Position,
        tolerance_radius: f64,
        duration_secs: f64,
    ) -> Result<Uuid, UsvError> {
        let mission = StationKeepingMission::new(
            station,
            tolerance_radius,
            duration_secs,
            self.clock.clone(),
        )?;
        Ok(self.enqueue(mission.into()))
    }

    /// Queue a docking mission.
    ///
    /// # Errors
    ///
    /// [`UsvError::InvalidMission`] if the mission cannot be constructed.
    pub fn add_docking_mission(
        &mut self,
        dock: Position,
        dock_heading: f64,
        approach_distance: f64,
        approach_speed: f64,
    ) -> Result<Uuid, UsvError> {
        let mission = DockingMission::new(
            dock,
            dock_heading,
            approach_distance,
            approach_speed,
            self.clock.clone(),
        )?;
        Ok(self.enqueue(mission.into()))
    }

    fn enqueue(&mut self, mission: Mission) -> Uuid {
        let id = Uuid::new_v4();
        info!(%id, kind = %mission.kind(), queued = self.queue.len() + 1, "Mission queued");
        self.queue.push_back(QueuedMission { id, mission });
        id
    }

    fn activate_next(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(next) => {
                info!(id = %next.id, kind = %next.kind(), "Starting mission");
                self.current = Some(next);
                self.mission_started = Some(self.clock.elapsed());
                true
            }
            None => false,
        }
    }

    fn running_time(&self) -> f64 {
        self.mission_started
            .map(|t| self.clock.elapsed().saturating_sub(t).as_secs_f64())
            .unwrap_or(0.0)
    }

    fn record(&mut self, entry: &QueuedMission, outcome: RecordOutcome) {
        self.history.push(MissionRecord {
            id: entry.id,
            kind: entry.kind(),
            outcome,
            duration_secs: self.running_time(),
            finished_at: Utc::now(),
        });
    }

    // ── Control ──────────────────────────────────────────────────────────────

    /// Begin executing the queue.
    ///
    /// Starting while already running is a logged no-op; starting while
    /// paused resumes.
    ///
    /// # Errors
    ///
    /// - [`UsvError::InvalidTransition`] from the `Error` state.
    /// - [`UsvError::EmptyQueue`] when there is no mission to run.
    pub fn start(&mut self) -> Result<(), UsvError> {
        match self.status {
            ManagerStatus::Running => {
                warn!("Missions already running");
                return Ok(());
            }
            ManagerStatus::Paused => {
                self.resume();
                return Ok(());
            }
            ManagerStatus::Error => {
                return Err(UsvError::InvalidTransition {
                    from: self.status.to_string(),
                    operation: "start".to_string(),
                });
            }
            ManagerStatus::Idle | ManagerStatus::Completed | ManagerStatus::Aborted => {}
        }

        if self.current.is_none() && !self.activate_next() {
            warn!("No missions in queue to start");
            return Err(UsvError::EmptyQueue);
        }

        self.status = ManagerStatus::Running;
        info!(queued = self.queue.len(), "Mission execution started");
        Ok(())
    }

    /// Running → Paused.  Returns whether the state changed.
    pub fn pause(&mut self) -> bool {
        if self.status != ManagerStatus::Running {
            return false;
        }
        self.status = ManagerStatus::Paused;
        info!("Mission execution paused");
        true
    }

    /// Paused → Running.  Returns whether the state changed.
    pub fn resume(&mut self) -> bool {
        if self.status != ManagerStatus::Paused {
            return false;
        }
        self.status = ManagerStatus::Running;
        info!("Mission execution resumed");
        true
    }

    /// Abort the active mission and discard the queue.
    pub fn abort(&mut self) {
        let previous = self.status;
        self.status = ManagerStatus::Aborted;
        let discarded = self.queue.len();
        self.queue.clear();

        if let Some(entry) = self.current.take()
            && previous != ManagerStatus::Idle
        {
            self.record(&entry, RecordOutcome::Aborted);
        }
        self.mission_started = None;
        info!(from = %previous, discarded, "All missions aborted");
    }

    // ── Control cycle ────────────────────────────────────────────────────────

    /// Feed one cycle of telemetry and advance the active mission.
    ///
    /// Outside `Running` this only records the telemetry.  Any error while
    /// dispatching the mission moves the manager to `Error`.
    pub fn update(&mut self, position: Position, heading: f64) -> UpdateResult {
        self.current_position = Some(position);
        self.current_heading = Some(heading);

        if self.status != ManagerStatus::Running {
            return UpdateResult::idle(self.status);
        }

        if self.current.is_none() && !self.activate_next() {
            info!("Mission queue empty; going idle");
            self.status = ManagerStatus::Idle;
            return UpdateResult::idle(self.status);
        }

        let Some(entry) = self.current.as_mut() else {
            return UpdateResult::idle(self.status);
        };
        let kind = entry.kind();
        let id = entry.id;

        let stepped = validate_heading(heading).and_then(|()| entry.mission.step(position, heading));
        let (outcome, guidance) = match stepped {
            Ok(step) => step,
            Err(e) => {
                error!(%id, %kind, error = %e, "Error updating mission");
                self.status = ManagerStatus::Error;
                return UpdateResult {
                    status: self.status,
                    guidance: None,
                    mission_info: None,
                    mission_kind: Some(kind),
                };
            }
        };

        let mut mission_kind = kind;
        if outcome.is_complete() || guidance.is_complete {
            info!(%id, %kind, "Mission completed");
            if let Some(done) = self.current.take() {
                self.record(&done, RecordOutcome::Completed);
            }
            if self.activate_next() {
                if let Some(next) = &self.current {
                    mission_kind = next.kind();
                }
            } else {
                self.mission_started = None;
                self.status = ManagerStatus::Completed;
                info!(total = self.history.len(), "All missions completed");
            }
        }

        UpdateResult {
            status: self.status,
            guidance: Some(guidance),
            mission_info: Some(outcome),
            mission_kind: Some(mission_kind),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn state(&self) -> ManagerStatus {
        self.status
    }

    pub fn status(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            status: self.status,
            queued_count: self.queue.len(),
            completed_count: self.history.len(),
            current_position: self.current_position,
            current_heading: self.current_heading,
            active_mission: self.current.as_ref().map(|entry| ActiveMission {
                id: entry.id,
                kind: entry.kind(),
                running_time_secs: self.running_time(),
            }),
        }
    }

    pub fn history(&self) -> &[MissionRecord] {
        &self.history
    }

    pub fn current_mission(&self) -> Option<&QueuedMission> {
        self.current.as_ref()
    }

    pub fn queued(&self) -> impl Iterator<Item = &QueuedMission> {
        self.queue.iter()
    }
}

fn validate_heading(heading: f64) -> Result<(), UsvError> {
    if heading.is_finite() {
        Ok(())
    } else {
        Err(UsvError::InvalidTelemetry {
            field: "heading".to_string(),
            value: heading,
        })
    }
}
