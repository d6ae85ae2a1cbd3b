use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geographic position in decimal degrees on a spherical Earth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Create a position from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Reject non-finite coordinates with [`UsvError::InvalidTelemetry`].
    pub fn validate(&self) -> Result<(), UsvError> {
        if !self.latitude.is_finite() {
            return Err(UsvError::InvalidTelemetry {
                field: "latitude".to_string(),
                value: self.latitude,
            });
        }
        if !self.longitude.is_finite() {
            return Err(UsvError::InvalidTelemetry {
                field: "longitude".to_string(),
                value: self.longitude,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Position {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// A circular keep-out zone used by the path planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Position,
    /// Radius in meters.
    pub radius_m: f64,
}

impl Obstacle {
    pub const fn new(center: Position, radius_m: f64) -> Self {
        Self { center, radius_m }
    }
}

/// The mission variant a queue entry or result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Waypoint,
    StationKeeping,
    Docking,
}

impl MissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionKind::Waypoint => "waypoint",
            MissionKind::StationKeeping => "station_keeping",
            MissionKind::Docking => "docking",
        }
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Distance bands for guidance that carries a distance but no thrust.
const FULL_SPEED_BEYOND_M: f64 = 100.0;
const CRUISE_BEYOND_M: f64 = 20.0;

/// One control cycle's steering and thrust request for the low-level
/// controller.
///
/// Waypoint guidance leaves `thrust` unset and reports `distance_m`; use
/// [`GuidanceCommand::effective_thrust`] to apply the standard distance
/// banding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuidanceCommand {
    /// Desired heading in degrees, `[0, 360)`, 0 = true north.
    pub heading_deg: f64,
    /// Distance to the current target in meters, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    /// Thrust fraction in `[0.0, 1.0]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thrust: Option<f64>,
    pub is_complete: bool,
}

impl GuidanceCommand {
    /// Thrust fraction to apply this cycle.
    ///
    /// An explicit `thrust` wins.  Otherwise the distance is banded:
    /// beyond 100 m full thrust, beyond 20 m 70 %, else 40 %.  A completed
    /// command always yields zero.
    pub fn effective_thrust(&self) -> f64 {
        if self.is_complete {
            return 0.0;
        }
        if let Some(thrust) = self.thrust {
            return thrust.clamp(0.0, 1.0);
        }
        match self.distance_m {
            Some(d) if d > FULL_SPEED_BEYOND_M => 1.0,
            Some(d) if d > CRUISE_BEYOND_M => 0.7,
            _ => 0.4,
        }
    }
}

/// Global error type spanning mission construction, telemetry validation,
/// manager state transitions, and configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UsvError {
    #[error("Invalid mission parameters: {0}")]
    InvalidMission(String),

    #[error("Invalid telemetry: {field} = {value}")]
    InvalidTelemetry { field: String, value: f64 },

    #[error("Cannot {operation} while {from}")]
    InvalidTransition { from: String, operation: String },

    #[error("No missions queued")]
    EmptyQueue,

    #[error("Configuration error: {0}")]
    Config(String),
}
