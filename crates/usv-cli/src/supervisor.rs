//! Safety supervisor layered over the mission manager.
//!
//! ```text
//! selector "supervise"
//! ├── sequence "healthy"
//! │   ├── condition "no_fault"
//! │   └── condition "inside_geofence"
//! └── action "request_abort"   (latches `abort_requested` on the blackboard)
//! ```

use usv_runtime::{BehaviorStatus, BehaviorTree, BehaviorTreeError, Blackboard, TreeBuilder};

const FAULT: &str = "fault";
const DISTANCE_FROM_HOME: &str = "distance_from_home_m";
const ABORT_REQUESTED: &str = "abort_requested";
const ABORT_REASON: &str = "abort_reason";

pub struct Supervisor {
    tree: BehaviorTree,
}

impl Supervisor {
    /// Build a supervisor that requests an abort on an operator fault or when
    /// the vessel strays more than `geofence_radius` meters from home.
    pub fn new(geofence_radius: f64) -> Result<Self, BehaviorTreeError> {
        let mut b = TreeBuilder::new();
        let no_fault = b.condition("no_fault", |bb| !bb.get_bool(FAULT).unwrap_or(false));
        let inside = b.condition("inside_geofence", move |bb| {
            bb.get_f64(DISTANCE_FROM_HOME)
                .is_some_and(|d| d <= geofence_radius)
        });
        let healthy = b.sequence("healthy", &[no_fault, inside])?;
        let abort = b.action("request_abort", |bb| {
            let reason = if bb.get_bool(FAULT).unwrap_or(false) {
                "operator fault"
            } else {
                "geofence breach"
            };
            if !bb.get_bool(ABORT_REQUESTED).unwrap_or(false) {
                bb.set(ABORT_REQUESTED, true);
                bb.set(ABORT_REASON, reason);
            }
            BehaviorStatus::Success
        });
        let root = b.selector("supervise", &[healthy, abort])?;
        Ok(Self {
            tree: b.build(root)?,
        })
    }

    /// Feed one cycle of observations.  Returns the abort reason once an
    /// abort has been requested; the request stays latched.
    pub fn check(&mut self, fault: bool, distance_from_home: f64) -> Option<String> {
        let patch = Blackboard::new()
            .with(FAULT, fault)
            .with(DISTANCE_FROM_HOME, distance_from_home);
        self.tree.update(Some(patch));

        let bb = self.tree.blackboard();
        if bb.get_bool(ABORT_REQUESTED).unwrap_or(false) {
            bb.get_str(ABORT_REASON).map(str::to_string)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_vessel_is_not_aborted() {
        let mut s = Supervisor::new(100.0).unwrap();
        assert_eq!(s.check(false, 10.0), None);
        assert_eq!(s.check(false, 99.0), None);
    }

    #[test]
    fn fault_requests_abort() {
        let mut s = Supervisor::new(100.0).unwrap();
        assert_eq!(s.check(true, 10.0).as_deref(), Some("operator fault"));
    }

    #[test]
    fn geofence_breach_requests_abort_and_latches() {
        let mut s = Supervisor::new(100.0).unwrap();
        assert_eq!(s.check(false, 150.0).as_deref(), Some("geofence breach"));
        assert_eq!(s.check(false, 10.0).as_deref(), Some("geofence breach"));
    }

    #[test]
    fn non_finite_distance_is_unhealthy() {
        let mut s = Supervisor::new(100.0).unwrap();
        assert!(s.check(false, f64::NAN).is_some());
    }
}
