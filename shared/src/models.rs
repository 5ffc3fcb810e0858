pub mod deployment;
pub mod metadata;
pub mod node;
pub mod pod;
pub mod replicaset;

pub use deployment::Deployment;
pub use metadata::{Labels, Metadata, OwnerKind, OwnerReference};
pub use node::{Node, NodeStatus, Taint, TaintEffect};
pub use pod::{Pod, PodPhase, PodSpec, PodStatus, Toleration};
pub use replicaset::ReplicaSet;
