use serde::{Deserialize, Serialize};

use crate::{
    api::PodManifest,
    models::metadata::{Labels, Metadata},
};

// --- Core ---

/// Owns one or more replica sets; the workload group pods are placed for.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Deployment {
    pub metadata: Metadata,
    pub spec: DeploymentSpec,
    pub status: DeploymentStatus,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeploymentSpec {
    pub replicas: u16,
    #[serde(default)]
    pub selector: Labels,
    pub template: PodManifest,
}

/// Actual state
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeploymentStatus {
    pub ready_replicas: u16,
    pub observed_generation: u16,
}

impl Deployment {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
