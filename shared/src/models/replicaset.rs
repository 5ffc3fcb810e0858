use serde::{Deserialize, Serialize};

use crate::{
    api::PodManifest,
    models::metadata::{Labels, Metadata},
};

// --- Core ---

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplicaSet {
    pub metadata: Metadata,
    pub spec: ReplicaSetSpec,
    pub status: ReplicaSetStatus,
}

/// Actual state
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplicaSetStatus {
    pub ready_replicas: u16,
    pub observed_generation: u16,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplicaSetSpec {
    pub replicas: u16,
    #[serde(default)]
    pub selector: Labels,
    pub template: PodManifest,
}
