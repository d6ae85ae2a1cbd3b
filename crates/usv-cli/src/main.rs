//! `usv` – USV Mission Controller demonstration
//!
//! Runs the mission manager in a closed loop against a kinematic demo vessel:
//!
//! 1. Loads `~/.usv/config.toml` (or the path given as the first argument),
//!    falling back to defaults.
//! 2. Plans a harbour transit around a charted obstacle with the configured
//!    planning strategy and queues it as a waypoint mission, followed by
//!    station keeping at the transit's end and a docking run.
//! 3. Steps the manager, the vessel, and a behavior-tree supervisor on a
//!    fixed simulated time step until every mission completes, the manager
//!    aborts or errors, or the time budget runs out.
//! 4. Intercepts **Ctrl-C** as an operator fault: the supervisor aborts the
//!    active mission and the loop exits.

mod config;
mod sim;
mod supervisor;

use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use usv_mission::{ManagerStatus, ManualClock, MissionManager, UpdateResult};
use usv_nav::PathPlanner;
use usv_nav::geo::{destination, distance};
use usv_types::{Obstacle, Position, UsvError};

use crate::config::Config;
use crate::sim::DemoVessel;
use crate::supervisor::Supervisor;

// Wellington Harbour.
const HOME: Position = Position::new(-41.2865, 174.7762);
const TRANSIT_BEARING: f64 = 45.0;
const TRANSIT_LENGTH_M: f64 = 400.0;
const OBSTACLE_RADIUS_M: f64 = 20.0;
const DOCK_OFFSET_M: f64 = 150.0;
const DOCK_HEADING: f64 = 270.0;

fn main() {
    let _telemetry = usv_runtime::init_tracing("usv-mission-controller");

    print_banner();

    // ── Operator fault flag ───────────────────────────────────────────────
    let fault = Arc::new(AtomicBool::new(false));
    let fault_handler = Arc::clone(&fault);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – aborting missions …".yellow().bold());
        fault_handler.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; missions cannot be aborted from the terminal");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);
    let cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            match config::save_to(&Config::default(), &path) {
                Ok(()) => println!(
                    "  {} Default config saved to {}",
                    "✓".green(),
                    path.display().to_string().bold()
                ),
                Err(e) => warn!(error = %e, "Could not save default config"),
            }
            config::defaults_with_env()
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::defaults_with_env()
        }
    };

    match run(&cfg, &fault) {
        Ok(status) => {
            let verdict = match status {
                ManagerStatus::Completed => "all missions completed".green().bold(),
                ManagerStatus::Aborted => "missions aborted".yellow().bold(),
                ManagerStatus::Error => "mission error".red().bold(),
                _ => "time budget exhausted".yellow().bold(),
            };
            println!("\n  {} {}\n", "■".bold(), verdict);
        }
        Err(e) => {
            error!(error = %e, "Demo setup failed");
            println!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Control loop
// ─────────────────────────────────────────────────────────────────────────────

fn run(cfg: &Config, fault: &AtomicBool) -> Result<ManagerStatus, UsvError> {
    let clock = ManualClock::new();
    let mut manager = MissionManager::with_clock(clock.shared());
    queue_demo_missions(&mut manager, cfg)?;
    manager.start()?;

    let mut supervisor = Supervisor::new(cfg.simulation.geofence_radius)
        .map_err(|e| UsvError::Config(format!("supervisor tree: {e}")))?;
    let mut vessel = DemoVessel::new(HOME, 0.0, cfg.vehicle.clone());

    let dt = cfg.simulation.time_step;
    if !(dt.is_finite() && dt > 0.0) {
        return Err(UsvError::Config(format!("time_step must be positive, got {dt}")));
    }

    let mut sim_time = 0.0;
    let mut next_report = 0.0;
    let mut status = manager.state();

    while sim_time < cfg.simulation.max_time {
        let result = manager.update(vessel.position(), vessel.heading());
        status = result.status;

        if let Some(reason) = supervisor.check(
            fault.load(Ordering::SeqCst),
            distance(HOME, vessel.position()),
        ) && status != ManagerStatus::Aborted
        {
            warn!(%reason, "Supervisor requested abort");
            manager.abort();
            status = manager.state();
        }

        match status {
            ManagerStatus::Completed => {
                info!(sim_time, "All missions completed");
                break;
            }
            ManagerStatus::Aborted | ManagerStatus::Error => {
                error!(sim_time, %status, "Mission error or aborted");
                break;
            }
            _ => {}
        }

        if sim_time >= next_report {
            report(sim_time, &result, &vessel);
            next_report += cfg.simulation.report_interval;
        }

        let guidance = result
            .guidance
            .as_ref()
            .filter(|_| status == ManagerStatus::Running);
        vessel.apply(guidance, dt);

        clock.advance_secs(dt);
        sim_time += dt;
    }

    let snapshot = manager.status();
    match serde_json::to_string(&snapshot) {
        Ok(json) => info!(status = %json, "Final mission manager status"),
        Err(e) => warn!(error = %e, "Could not serialize final status"),
    }
    for record in manager.history() {
        println!(
            "  {:<16} {:<10} {:>8.1}s",
            record.kind.to_string().bold(),
            format!("{:?}", record.outcome).to_lowercase(),
            record.duration_secs
        );
    }
    println!("  Distance travelled: {:.0} m", vessel.travelled_m());

    Ok(status)
}

/// Plan a transit around a charted obstacle, then hold station at its end and
/// dock nearby.
fn queue_demo_missions(manager: &mut MissionManager, cfg: &Config) -> Result<(), UsvError> {
    let goal = destination(HOME, TRANSIT_BEARING, TRANSIT_LENGTH_M);
    let hazard = destination(HOME, TRANSIT_BEARING, TRANSIT_LENGTH_M / 2.0);

    let mut planner = PathPlanner::new(cfg.planner.clone());
    planner.set_obstacles(vec![Obstacle::new(hazard, OBSTACLE_RADIUS_M)]);
    let plan = planner.plan(HOME, goal);
    info!(
        strategy = %cfg.planner.strategy,
        waypoints = plan.len(),
        length_m = plan.length_m(),
        "Transit planned"
    );

    let defaults = &cfg.mission;
    manager.add_waypoint_mission(plan.into_waypoints(), defaults.waypoint_arrival_radius)?;
    manager.add_station_keeping_mission(
        goal,
        defaults.station_keeping_radius,
        defaults.station_keeping_duration,
    )?;
    manager.add_docking_mission(
        destination(goal, 90.0, DOCK_OFFSET_M),
        DOCK_HEADING,
        defaults.docking_approach_distance,
        defaults.docking_approach_speed,
    )?;
    Ok(())
}

fn report(sim_time: f64, result: &UpdateResult, vessel: &DemoVessel) {
    let kind = result
        .mission_kind
        .map(|k| k.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  t={:>7.1}s  {:<9} {:<16} pos {}  hdg {:>5.1}°  {:.2} m/s",
        sim_time,
        result.status.to_string().cyan(),
        kind,
        vessel.position(),
        vessel.heading(),
        vessel.speed()
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  __  _______   __"#.bold().cyan());
    println!("{}", r#" / / / / ___/ | / /"#.bold().cyan());
    println!("{}", r#"/ /_/ (__  )| |/ / "#.bold().cyan());
    println!("{}", r#"\____/____/ |___/  "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "USV Mission Controller".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}
