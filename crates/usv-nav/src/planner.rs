//! Obstacle-aware route planning.
//!
//! [`PathPlanner`] turns a start/goal pair into an ordered list of waypoints
//! around a registered set of circular [`Obstacle`]s.  Three strategies share
//! the same [`PathPlanner::plan`] entry point:
//!
//! | Strategy | Behaviour |
//! |----------|-----------|
//! | [`PlanningStrategy::Direct`]   | `[start, goal]`; warns when the leg is blocked. |
//! | [`PlanningStrategy::Stepwise`] | Grid-sized steps towards the goal, inserting a tangent avoidance waypoint at each blocked step. |
//! | [`PlanningStrategy::Rrt`]      | Rapidly-exploring random tree with goal bias; falls back to `[start, goal]`. |
//!
//! Planning never fails.  When no safe route is found the planner logs a
//! warning and returns the direct path, leaving the risk call to the caller.
//!
//! # Example
//!
//! ```rust
//! use usv_nav::planner::{PathPlanner, PlannerConfig, PlanningStrategy};
//! use usv_types::{Obstacle, Position};
//!
//! let mut planner = PathPlanner::new(PlannerConfig {
//!     strategy: PlanningStrategy::Stepwise,
//!     ..PlannerConfig::default()
//! });
//! planner.set_obstacles(vec![Obstacle::new(Position::new(0.0, 0.001), 10.0)]);
//!
//! let start = Position::new(0.0, 0.0);
//! let goal = Position::new(0.0, 0.002);
//! let path = planner.plan(start, goal);
//!
//! assert_eq!(path.first(), Some(start));
//! assert_eq!(path.last(), Some(goal));
//! ```

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use usv_types::{Obstacle, Position, UsvError};

use crate::geo::{bearing, destination, distance, heading_error, wrap_360};
use crate::geometry::{segment_intersects_circle, segments_intersect};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which planning algorithm [`PathPlanner::plan`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningStrategy {
    #[default]
    #[serde(alias = "waypoint")]
    Direct,
    #[serde(alias = "astar")]
    Stepwise,
    Rrt,
}

impl fmt::Display for PlanningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningStrategy::Direct => write!(f, "direct"),
            PlanningStrategy::Stepwise => write!(f, "stepwise"),
            PlanningStrategy::Rrt => write!(f, "rrt"),
        }
    }
}

impl FromStr for PlanningStrategy {
    type Err = UsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "waypoint" => Ok(PlanningStrategy::Direct),
            "stepwise" | "astar" => Ok(PlanningStrategy::Stepwise),
            "rrt" => Ok(PlanningStrategy::Rrt),
            other => Err(UsvError::Config(format!("unknown planning strategy: {other}"))),
        }
    }
}

/// Tunables for [`PathPlanner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub strategy: PlanningStrategy,
    /// Clearance added to every obstacle radius, in meters.
    pub safe_distance: f64,
    /// Step length of the stepwise planner, in meters.  The RRT step cap is
    /// twice this value.
    pub grid_size: f64,
    /// Iteration cap for the stepwise planner.
    pub max_iterations: usize,
    /// Iteration cap for the RRT planner.
    pub rrt_max_iterations: usize,
    /// Probability of sampling the goal itself on each RRT iteration.
    pub goal_sample_rate: f64,
    /// Degrees added around the start/goal bounding box when sampling.
    pub sample_padding_deg: f64,
    /// Extra clearance beyond `radius + safe_distance` for avoidance
    /// waypoints, in meters.
    pub avoidance_margin: f64,
    /// RNG seed for deterministic RRT runs.  `None` seeds from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: PlanningStrategy::Direct,
            safe_distance: 10.0,
            grid_size: 5.0,
            max_iterations: 100,
            rrt_max_iterations: 200,
            goal_sample_rate: 0.1,
            sample_padding_deg: 0.01,
            avoidance_margin: 5.0,
            seed: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PathPlan
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered route from start to goal, both inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPlan {
    waypoints: Vec<Position>,
}

impl PathPlan {
    pub fn new(waypoints: Vec<Position>) -> Self {
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn into_waypoints(self) -> Vec<Position> {
        self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> Option<Position> {
        self.waypoints.first().copied()
    }

    pub fn last(&self) -> Option<Position> {
        self.waypoints.last().copied()
    }

    /// Iterate over consecutive `(from, to)` legs.
    pub fn legs(&self) -> impl Iterator<Item = (Position, Position)> + '_ {
        self.waypoints.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total great-circle length of the route in meters.
    pub fn length_m(&self) -> f64 {
        self.legs().map(|(a, b)| distance(a, b)).sum()
    }

    /// True when any leg crosses the line `a → b` (e.g. a shipping-lane
    /// centreline or a boundary).
    pub fn crosses(&self, a: Position, b: Position) -> bool {
        self.legs().any(|(p, q)| segments_intersect(p, q, a, b))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PathPlanner
// ─────────────────────────────────────────────────────────────────────────────

/// Plans routes around static circular obstacles.
///
/// Construct with [`PathPlanner::new`], register obstacles with
/// [`PathPlanner::set_obstacles`], then call [`PathPlanner::plan`].
pub struct PathPlanner {
    config: PlannerConfig,
    obstacles: Vec<Obstacle>,
    rng: StdRng,
}

impl PathPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        info!(strategy = %config.strategy, "Path planner initialised");
        Self {
            config,
            obstacles: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Switch the active strategy without discarding registered obstacles.
    pub fn set_strategy(&mut self, strategy: PlanningStrategy) {
        self.config.strategy = strategy;
    }

    /// Replace the obstacle set used by subsequent [`plan`][Self::plan] calls.
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        info!(count = obstacles.len(), "Obstacles registered for path planning");
        self.obstacles = obstacles;
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Plan a route from `start` to `goal` with the configured strategy.
    #[instrument(level = "debug", skip(self))]
    pub fn plan(&mut self, start: Position, goal: Position) -> PathPlan {
        if !start.is_finite() || !goal.is_finite() {
            warn!(%start, %goal, "Non-finite endpoint; returning the direct path unplanned");
            return PathPlan::new(vec![start, goal]);
        }
        match self.config.strategy {
            PlanningStrategy::Direct => self.plan_direct(start, goal),
            PlanningStrategy::Stepwise => self.plan_stepwise(start, goal),
            PlanningStrategy::Rrt => self.plan_rrt(start, goal),
        }
    }

    /// True when the leg `a → b` keeps `safe_distance` clear of every
    /// obstacle.
    pub fn is_collision_free(&self, a: Position, b: Position) -> bool {
        self.obstacles.iter().all(|obs| {
            !segment_intersects_circle(a, b, obs.center, obs.radius_m + self.config.safe_distance)
        })
    }

    // ── Direct ────────────────────────────────────────────────────────────

    fn plan_direct(&self, start: Position, goal: Position) -> PathPlan {
        if !self.is_collision_free(start, goal) {
            warn!(%start, %goal, "Direct path intersects an obstacle; consider the stepwise or RRT planner");
        }
        PathPlan::new(vec![start, goal])
    }

    // ── Stepwise avoidance ────────────────────────────────────────────────

    fn plan_stepwise(&self, start: Position, goal: Position) -> PathPlan {
        let grid = self.config.grid_size;
        let mut path = vec![start];
        let mut current = start;
        let mut iterations = 0;

        while iterations < self.config.max_iterations && distance(current, goal) > grid {
            iterations += 1;

            let direct = bearing(current, goal);
            let step = grid.min(distance(current, goal));
            let next = destination(current, direct, step);

            current = match self.blocking_obstacle(next) {
                Some(obstacle) => {
                    let waypoint = self.avoidance_waypoint(current, direct, obstacle);
                    debug!(%waypoint, "Inserted avoidance waypoint");
                    waypoint
                }
                None => next,
            };
            path.push(current);
        }

        if iterations >= self.config.max_iterations {
            warn!(iterations, "Stepwise planner hit its iteration cap before reaching the goal");
        }
        if path.last() != Some(&goal) {
            path.push(goal);
        }

        info!(waypoints = path.len(), "Stepwise planning completed");
        PathPlan::new(path)
    }

    /// First obstacle whose inflated radius contains `point`.
    fn blocking_obstacle(&self, point: Position) -> Option<&Obstacle> {
        self.obstacles
            .iter()
            .find(|obs| distance(point, obs.center) < obs.radius_m + self.config.safe_distance)
    }

    /// A waypoint abeam `obstacle`, perpendicular to the line of sight from
    /// `current`, on whichever side bends the track least from `direct`.
    fn avoidance_waypoint(&self, current: Position, direct: f64, obstacle: &Obstacle) -> Position {
        let to_obstacle = bearing(current, obstacle.center);
        let offset = obstacle.radius_m + self.config.safe_distance + self.config.avoidance_margin;

        [wrap_360(to_obstacle + 90.0), wrap_360(to_obstacle - 90.0)]
            .into_iter()
            .map(|side| destination(obstacle.center, side, offset))
            .min_by(|a, b| {
                let da = heading_error(bearing(current, *a), direct);
                let db = heading_error(bearing(current, *b), direct);
                da.total_cmp(&db)
            })
            .unwrap_or(current)
    }

    // ── RRT ───────────────────────────────────────────────────────────────

    fn plan_rrt(&mut self, start: Position, goal: Position) -> PathPlan {
        let pad = self.config.sample_padding_deg.abs().max(f64::EPSILON);
        let lat_min = start.latitude.min(goal.latitude) - pad;
        let lat_max = start.latitude.max(goal.latitude) + pad;
        let lon_min = start.longitude.min(goal.longitude) - pad;
        let lon_max = start.longitude.max(goal.longitude) + pad;
        let max_step = self.config.grid_size * 2.0;

        let mut tree = vec![start];
        let mut parents: Vec<Option<usize>> = vec![None];
        let mut goal_idx = None;

        for _ in 0..self.config.rrt_max_iterations {
            let sample = if self.rng.random::<f64>() < self.config.goal_sample_rate {
                goal
            } else {
                Position::new(
                    self.rng.random_range(lat_min..=lat_max),
                    self.rng.random_range(lon_min..=lon_max),
                )
            };

            let nearest_idx = nearest_node(&tree, sample);
            let nearest = tree[nearest_idx];
            let gap = distance(nearest, sample);
            if gap < f64::EPSILON {
                continue;
            }
            let new_node = destination(nearest, bearing(nearest, sample), gap.min(max_step));

            if !self.is_collision_free(nearest, new_node) {
                continue;
            }
            tree.push(new_node);
            parents.push(Some(nearest_idx));
            let new_idx = tree.len() - 1;

            if self.is_collision_free(new_node, goal) {
                tree.push(goal);
                parents.push(Some(new_idx));
                goal_idx = Some(tree.len() - 1);
                break;
            }
        }

        let Some(goal_idx) = goal_idx else {
            warn!(nodes = tree.len(), "RRT failed to reach goal, falling back to direct path");
            return PathPlan::new(vec![start, goal]);
        };

        let mut path = Vec::new();
        let mut cursor = Some(goal_idx);
        while let Some(idx) = cursor {
            path.push(tree[idx]);
            cursor = parents[idx];
        }
        path.reverse();

        info!(waypoints = path.len(), nodes = tree.len(), "RRT planning completed");
        PathPlan::new(path)
    }
}

fn nearest_node(tree: &[Position], point: Position) -> usize {
    tree.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(**a, point).total_cmp(&distance(**b, point)))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
