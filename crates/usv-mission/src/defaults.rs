use serde::{Deserialize, Serialize};

/// Default mission parameters, used when a caller or config file does not
/// specify them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDefaults {
    /// Meters within which a waypoint counts as reached.
    #[serde(default = "default_waypoint_arrival_radius")]
    pub waypoint_arrival_radius: f64,
    /// Meters around the station that count as on station.
    #[serde(default = "default_station_keeping_radius")]
    pub station_keeping_radius: f64,
    /// Seconds the vessel must stay on station.
    #[serde(default = "default_station_keeping_duration")]
    pub station_keeping_duration: f64,
    /// Meters behind the dock where the final approach begins.
    #[serde(default = "default_docking_approach_distance")]
    pub docking_approach_distance: f64,
    /// Thrust fraction used for the final run-in.
    #[serde(default = "default_docking_approach_speed")]
    pub docking_approach_speed: f64,
}

fn default_waypoint_arrival_radius() -> f64 {
    5.0
}

fn default_station_keeping_radius() -> f64 {
    10.0
}

fn default_station_keeping_duration() -> f64 {
    300.0
}

fn default_docking_approach_distance() -> f64 {
    20.0
}

fn default_docking_approach_speed() -> f64 {
    0.3
}

impl Default for MissionDefaults {
    fn default() -> Self {
        Self {
            waypoint_arrival_radius: default_waypoint_arrival_radius(),
            station_keeping_radius: default_station_keeping_radius(),
            station_keeping_duration: default_station_keeping_duration(),
            docking_approach_distance: default_docking_approach_distance(),
            docking_approach_speed: default_docking_approach_speed(),
        }
    }
}
