use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::metadata::{Labels, Metadata};
use crate::models::node::TaintEffect;

// --- Core ---

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Pod {
    pub metadata: Metadata,
    pub spec: PodSpec,
    pub status: PodStatus,
}

/// Desired state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodSpec {
    pub node_name: String,
    #[serde(default)]
    pub scheduler_name: String,
    #[serde(default)]
    pub node_selector: Labels,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    pub containers: Vec<ContainerSpec>,
}

/// Allows a pod onto nodes carrying a taint with the same key and value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Toleration {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: Option<TaintEffect>,
}

/// Actual state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodStatus {
    pub phase: PodPhase,
    #[serde(default)]
    pub conditions: Vec<PodCondition>,
    pub container_status: Vec<(String, String)>,
    pub last_update: Option<DateTime<Utc>>,
    pub observed_generation: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum PodPhase {
    Pending,
    Running,
    Unknown,
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub last_transition: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ConditionType {
    Scheduled,
    Initialized,
    ContainersReady,
    Ready,
}

// --- Containers ---

/// Definition of a container within a Pod.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub ports: Option<Vec<Port>>,
    pub env: Option<Vec<EnvVar>>,
}

/// Environment variable for a container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Port mapping for a container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Port {
    #[serde(rename = "containerPort")]
    pub container_port: u16,
}

// --- Impl ---

impl Pod {
    /// Running, or at least scheduled/initialized/ready according to its conditions.
    pub fn is_ready(&self) -> bool {
        self.status.phase == PodPhase::Running
            || self.status.conditions.iter().any(|c| {
                matches!(
                    c.condition_type,
                    ConditionType::Ready | ConditionType::Initialized | ConditionType::Scheduled
                )
            })
    }

    /// Comma separated values of a label, empty entries dropped.
    /// `None` when the label is not set at all.
    pub fn label_list(&self, label: &str) -> Option<Vec<&str>> {
        self.metadata.labels.get(label).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

impl Default for PodStatus {
    fn default() -> Self {
        PodStatus {
            phase: PodPhase::Pending,
            conditions: Vec::new(),
            container_status: Vec::new(),
            last_update: None,
            observed_generation: 0,
        }
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        ContainerSpec {
            name: "test-container".to_string(),
            image: "busybox:latest".to_string(),
            ports: None,
            env: None,
        }
    }
}

impl Default for PodSpec {
    fn default() -> Self {
        PodSpec {
            node_name: "".to_string(),
            scheduler_name: "".to_string(),
            node_selector: Labels::new(),
            tolerations: Vec::new(),
            containers: vec![ContainerSpec::default()],
        }
    }
}
