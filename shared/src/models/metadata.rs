use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key/value labels attached to cluster objects, also used as equality selectors.
pub type Labels = HashMap<String, String>;

// --- Metadata ---

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metadata {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(rename = "ownerReference")]
    pub owner_reference: Option<OwnerReference>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub generation: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OwnerReference {
    pub id: Uuid,
    pub name: String,
    pub kind: OwnerKind,
    pub controller: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum OwnerKind {
    ReplicaSet,
    Deployment,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Metadata {
            id,
            name: id.to_string(),
            namespace: default_namespace(),
            labels: Labels::new(),
            owner_reference: None,
            created_at: now,
            modified_at: now,
            generation: 0,
        }
    }
}

impl Metadata {
    /// Metadata with a fixed name and otherwise default values.
    pub fn named(name: &str) -> Self {
        Metadata {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the controlling owner of this object.
    pub fn owned_by(mut self, kind: OwnerKind, owner: &Metadata) -> Self {
        self.owner_reference = Some(OwnerReference {
            id: owner.id,
            name: owner.name.clone(),
            kind,
            controller: true,
        });
        self
    }
}

// --- Selectors ---

/// True when every selector pair is present in `labels` with the same value.
pub fn selector_matches(selector: &Labels, labels: &Labels) -> bool {
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|l| l == v))
}

/// Renders a selector as `k1=v1,k2=v2` with keys in sorted order.
pub fn selector_string(selector: &Labels) -> String {
    selector
        .iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
