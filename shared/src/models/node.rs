use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::metadata::Labels;

/// Node label carrying the location (zone, site) the node runs in.
pub const LOCATION_LABEL: &str = "location";

/// Represents a node in the cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    pub id: Uuid,
    pub name: String,
    pub status: NodeStatus,
    pub addr: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub taints: Vec<Taint>,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

/// Status of a node in the cluster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum NodeStatus {
    Ready,
    Running,
    Stopped,
}

/// Repels pods that do not carry a matching toleration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl Node {
    /// Node with the given name and labels, ready and untainted.
    pub fn with_labels(name: &str, labels: &[(&str, &str)]) -> Self {
        Node {
            name: name.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    /// Value of the [`LOCATION_LABEL`] label, if set.
    pub fn location(&self) -> Option<&str> {
        self.labels.get(LOCATION_LABEL).map(String::as_str)
    }
}

impl Default for Node {
    fn default() -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Node {
            id,
            name: format!("node-{}", &id.to_string()[..8]),
            status: NodeStatus::Ready,
            addr: "127.0.0.1:7630".to_string(),
            labels: Labels::new(),
            taints: Vec::new(),
            started_at: now,
            last_heartbeat: now,
        }
    }
}
