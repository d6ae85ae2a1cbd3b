//! `usv-mission` – Mission Sequencing & Guidance
//!
//! Converts live position/heading telemetry into one
//! [`GuidanceCommand`][usv_types::GuidanceCommand] per control cycle.
//!
//! # Modules
//!
//! - [`clock`] – [`Clock`][clock::Clock]: monotonic time source injected into
//!   the timed missions.  [`SystemClock`][clock::SystemClock] reads
//!   [`Instant`][std::time::Instant]; [`ManualClock`][clock::ManualClock] is
//!   advanced explicitly by tests and simulations.
//! - [`missions`] – the three mission state machines
//!   ([`WaypointMission`][missions::WaypointMission],
//!   [`StationKeepingMission`][missions::StationKeepingMission],
//!   [`DockingMission`][missions::DockingMission]) and the
//!   [`Mission`][missions::Mission] enum that tags them.
//! - [`manager`] – [`MissionManager`][manager::MissionManager]: FIFO mission
//!   queue with start/pause/resume/abort and a per-cycle
//!   [`update`][manager::MissionManager::update] entry point.
//! - [`defaults`] – [`MissionDefaults`][defaults::MissionDefaults]: default
//!   radii, durations, and docking geometry used when enqueuing missions.
//!
//! # Error handling
//!
//! Mission construction rejects invalid parameters with
//! [`UsvError::InvalidMission`][usv_types::UsvError::InvalidMission].  Any
//! error raised while the manager dispatches the active mission moves it to
//! the sticky [`ManagerStatus::Error`][manager::ManagerStatus::Error] state.

pub mod clock;
pub mod defaults;
pub mod manager;
pub mod missions;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use defaults::MissionDefaults;
pub use manager::{
    ActiveMission, ManagerSnapshot, ManagerStatus, MissionManager, MissionRecord, QueuedMission,
    RecordOutcome, UpdateResult,
};
pub use missions::{
    DockingMission, DockingState, Mission, MissionOutcome, StationKeepingMission, WaypointMission,
};
