use serde::{Deserialize, Serialize};

use crate::models::{Labels, Node, Pod, PodSpec};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PodManifest {
    #[serde(default)]
    pub labels: Labels,
    pub spec: PodSpec,
}

// ============================= EVENTS

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PodEvent {
    pub event_type: EventType,
    pub pod: Pod,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeEvent {
    pub event_type: EventType,
    pub node: Node,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum EventType {
    Added,
    Deleted,
    Modified,
}

// ============================= POD PATCH

#[derive(Deserialize, Serialize, Debug)]
pub struct PodPatch {
    pub pod_field: PodField,
    pub value: serde_json::Value,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub enum PodField {
    #[serde(rename = "node_name")]
    NodeName,
    #[serde(rename = "spec")]
    Spec,
    #[serde(rename = "status")]
    Status,
}

// ============================= EVICTION

/// Voluntary disruption request, the owning controller recreates the pod.
#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct Eviction {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "gracePeriodSeconds")]
    pub grace_period_seconds: Option<u32>,
}
