//! Configuration – reads/writes `~/.usv/config.toml`.
//!
//! Every section and field has a default, so a partial file (or none at all)
//! yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use usv_mission::MissionDefaults;
use usv_nav::{PlannerConfig, PlanningStrategy};
use usv_types::UsvError;

/// Kinematic limits of the demo vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Speed at full thrust, m/s.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Maximum rate of turn, degrees/s.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f64,
    /// Speed change limit, m/s².
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
}

fn default_max_speed() -> f64 {
    2.0
}
fn default_turn_rate() -> f64 {
    15.0
}
fn default_acceleration() -> f64 {
    0.5
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            turn_rate: default_turn_rate(),
            acceleration: default_acceleration(),
        }
    }
}

/// Control loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seconds of simulated time per control cycle.
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Simulated seconds after which the loop gives up.
    #[serde(default = "default_max_time")]
    pub max_time: f64,
    /// Simulated seconds between progress lines.
    #[serde(default = "default_report_interval")]
    pub report_interval: f64,
    /// Distance from the start position beyond which the supervisor aborts.
    #[serde(default = "default_geofence_radius")]
    pub geofence_radius: f64,
}

fn default_time_step() -> f64 {
    0.1
}
fn default_max_time() -> f64 {
    1000.0
}
fn default_report_interval() -> f64 {
    10.0
}
fn default_geofence_radius() -> f64 {
    5_000.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            max_time: default_max_time(),
            report_interval: default_report_interval(),
            geofence_radius: default_geofence_radius(),
        }
    }
}

/// Persisted configuration stored in `~/.usv/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub mission: MissionDefaults,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Return the path to `~/.usv/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".usv").join("config.toml")
}

/// Load the config from `path`, applying `USV_*` overrides.  Returns `None`
/// if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, UsvError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        UsvError::Config(format!("Failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| UsvError::Config(format!("Failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `USV_*` environment variable overrides to `cfg`.  Unparseable
/// values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `USV_SAFE_DISTANCE` | `planner.safe_distance` |
/// | `USV_GRID_SIZE` | `planner.grid_size` |
/// | `USV_PLANNER_MODE` | `planner.strategy` (`direct`/`waypoint`, `stepwise`/`astar`, `rrt`) |
/// | `USV_MAX_SPEED` | `vehicle.max_speed` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("USV_SAFE_DISTANCE")
        && let Ok(d) = v.parse::<f64>()
    {
        cfg.planner.safe_distance = d;
    }
    if let Ok(v) = std::env::var("USV_GRID_SIZE")
        && let Ok(g) = v.parse::<f64>()
    {
        cfg.planner.grid_size = g;
    }
    if let Ok(v) = std::env::var("USV_PLANNER_MODE")
        && let Ok(mode) = v.parse::<PlanningStrategy>()
    {
        cfg.planner.strategy = mode;
    }
    if let Ok(v) = std::env::var("USV_MAX_SPEED")
        && let Ok(s) = v.parse::<f64>()
    {
        cfg.vehicle.max_speed = s;
    }
}

/// Default configuration with `USV_*` overrides applied, for when no file
/// could be loaded.
pub fn defaults_with_env() -> Config {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// Save the config to `path`, creating parent directories as needed.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), UsvError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| UsvError::Config(format!("Failed to create config directory: {e}")))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| UsvError::Config(format!("Failed to serialize config: {e}")))?;
    fs::write(path, raw).map_err(|e| {
        UsvError::Config(format!("Failed to write config at {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.vehicle.max_speed, 2.0);
        assert_eq!(loaded.simulation.time_step, 0.1);
        assert_eq!(loaded.mission.station_keeping_duration, 300.0);
        assert_eq!(loaded.planner.strategy, PlanningStrategy::Direct);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            "[planner]\nstrategy = \"astar\"\nseed = 7\n\n[vehicle]\nturn_rate = 30.0\n",
        )
        .expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.planner.strategy, PlanningStrategy::Stepwise);
        assert_eq!(cfg.planner.seed, Some(7));
        assert_eq!(cfg.planner.grid_size, 5.0);
        assert_eq!(cfg.vehicle.turn_rate, 30.0);
        assert_eq!(cfg.vehicle.max_speed, 2.0);
        assert_eq!(cfg.mission.waypoint_arrival_radius, 5.0);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[vehicle\nmax_speed = ").expect("write");
        assert!(matches!(load_from(&path), Err(UsvError::Config(_))));
    }

    #[test]
    fn config_path_points_to_usv_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".usv"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // Each override test uses its own variable so parallel tests don't race.

    #[test]
    fn apply_env_overrides_changes_safe_distance() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("USV_SAFE_DISTANCE", "25") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.planner.safe_distance, 25.0);
        unsafe { std::env::remove_var("USV_SAFE_DISTANCE") };
    }

    #[test]
    fn apply_env_overrides_changes_planner_mode() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("USV_PLANNER_MODE", "rrt") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.planner.strategy, PlanningStrategy::Rrt);
        unsafe { std::env::remove_var("USV_PLANNER_MODE") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_grid_size() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("USV_GRID_SIZE", "not-a-number") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.planner.grid_size, 5.0);
        unsafe { std::env::remove_var("USV_GRID_SIZE") };
    }

    #[test]
    fn apply_env_overrides_changes_max_speed() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("USV_MAX_SPEED", "3.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.vehicle.max_speed, 3.5);
        assert_eq!(defaults_with_env().vehicle.max_speed, 3.5);
        unsafe { std::env::remove_var("USV_MAX_SPEED") };
    }
}
