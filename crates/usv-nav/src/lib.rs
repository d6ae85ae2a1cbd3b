//! `usv-nav` – Geodesy & Path Planning
//!
//! Turns geographic coordinates into the distances, bearings, and
//! obstacle-free routes that the mission layer steers by.
//!
//! # Modules
//!
//! - [`geo`] – great-circle distance, initial bearing, and
//!   destination-from-bearing on a spherical Earth (radius 6,371,000 m),
//!   plus heading wrap helpers.
//! - [`geometry`] – a local tangent-plane projection with the
//!   segment-to-circle clearance test and the segment-segment crossing test.
//! - [`planner`] – [`PathPlanner`][planner::PathPlanner]: direct,
//!   stepwise-avoidance, and randomized-tree (RRT) route planning around
//!   circular [`Obstacle`][usv_types::Obstacle]s.

pub mod geo;
pub mod geometry;
pub mod planner;

pub use geo::{bearing, destination, distance, heading_error, wrap_180, wrap_360};
pub use planner::{PathPlan, PathPlanner, PlannerConfig, PlanningStrategy};
