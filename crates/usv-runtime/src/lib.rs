//! `usv-runtime` – Supervision & Process Runtime
//!
//! Pieces shared by binaries that drive the mission controller.
//!
//! # Modules
//!
//! - [`behavior_tree`] – [`BehaviorTree`][behavior_tree::BehaviorTree]: an
//!   arena-based behavior tree built with
//!   [`TreeBuilder`][behavior_tree::TreeBuilder].  Supports action, condition,
//!   sequence, selector, and parallel nodes; sequences and selectors resume at
//!   the child that last reported `Running`.  Used to supervise the mission
//!   manager (e.g. abort on a fault flag) on top of the fixed mission state
//!   machines.
//! - [`blackboard`] – [`Blackboard`][blackboard::Blackboard]: JSON key/value
//!   store shared by the nodes of one tree.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.  Set
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` to export spans to any OTLP-compatible
//!   collector.

pub mod behavior_tree;
pub mod blackboard;
pub mod telemetry;

pub use behavior_tree::{BehaviorStatus, BehaviorTree, BehaviorTreeError, NodeId, TreeBuilder};
pub use blackboard::Blackboard;
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing, try_init_tracing};
