//! Object builders for tests of the control plane crates.
//!
//! Compiled for this crate's tests and behind the `fixtures` feature, which
//! dependents enable from `[dev-dependencies]` only.

use crate::models::{
    Deployment, Labels, Metadata, Node, OwnerKind, Pod, PodPhase, ReplicaSet,
    node::LOCATION_LABEL,
};

/// Scheduler name stamped on pods built by [`pod_of`].
pub const SCHEDULER: &str = "edge-scheduler";

/// Deployment selecting `app=<name>`.
pub fn deployment(name: &str) -> Deployment {
    let mut d = Deployment {
        metadata: Metadata::named(name),
        ..Default::default()
    };
    d.spec.selector = Labels::from([("app".to_string(), name.to_string())]);
    d
}

/// The replica set `<deployment>-rs` owned by `deployment`.
pub fn replicaset_of(deployment: &Deployment) -> ReplicaSet {
    let mut rs = ReplicaSet {
        metadata: Metadata::named(&format!("{}-rs", deployment.metadata.name))
            .owned_by(OwnerKind::Deployment, &deployment.metadata),
        ..Default::default()
    };
    rs.spec.selector = deployment.spec.selector.clone();
    rs
}

/// Pod of `deployment` owned through [`replicaset_of`], handled by [`SCHEDULER`].
/// An empty `node` leaves it unbound.
pub fn pod_of(deployment: &Deployment, name: &str, node: &str, phase: PodPhase) -> Pod {
    let rs = replicaset_of(deployment);
    let mut pod = Pod {
        metadata: Metadata::named(name).owned_by(OwnerKind::ReplicaSet, &rs.metadata),
        ..Default::default()
    };
    pod.metadata.labels = deployment.spec.selector.clone();
    pod.spec.scheduler_name = SCHEDULER.to_string();
    pod.spec.node_name = node.to_string();
    pod.status.phase = phase;
    pod
}

/// Node in `location` carrying the `extra` labels too.
pub fn located(name: &str, location: &str, extra: &[(&str, &str)]) -> Node {
    let mut labels = vec![(LOCATION_LABEL, location)];
    labels.extend_from_slice(extra);
    Node::with_labels(name, &labels)
}
