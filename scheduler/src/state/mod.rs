//! In-memory scheduler state shared by the controllers
//!
//! - node inventory, maintained from the node watch, never expires
//! - decisions recorded on eviction, consumed by the next pod of the same deployment

pub mod cache;

use std::sync::Arc;

use shared::models::Node;

use crate::{pipeline::Decision, scores::ScoreMap};

pub use cache::{Cache, CacheView};

pub type State = Arc<SchedulerState>;

#[derive(Debug)]
pub struct SchedulerState {
    pub nodes: Cache<Node>,
    pub decisions: Cache<Decision>,
}

impl SchedulerState {
    pub fn new() -> State {
        Arc::new(Self {
            nodes: Cache::new(None),
            decisions: Cache::new(None),
        })
    }

    pub async fn add_node(&self, node: &Node) {
        let known = self.nodes.get(&node.name).await.is_some();
        self.nodes.set(&node.name, node.clone()).await;
        let nodes = self.nodes.len().await;
        tracing::debug!(node=%node.name, known, nodes, "Node stored");
    }

    pub async fn delete_node(&self, name: &str) {
        if !self.nodes.delete(name).await {
            tracing::debug!(node=%name, "Deleted node was not in inventory");
        }
    }

    /// Fresh score map over every known node.
    pub async fn seed_scores(&self) -> ScoreMap {
        ScoreMap::new(self.nodes.keys().await)
    }

    /// Keeps the decision for the deployment's next pending pod, replacing older ones.
    pub async fn record_decision(&self, decision: Decision) {
        let key = decision.deployment.metadata.name.clone();
        self.decisions.set(&key, decision).await;
    }

    /// Consumes the recorded decision for a deployment, if any.
    pub async fn take_decision(&self, deployment: &str) -> Option<Decision> {
        self.decisions.take(deployment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Deployment, Metadata, Pod};

    #[tokio::test]
    async fn test_node_inventory_follows_events() {
        let state = SchedulerState::new();
        state.add_node(&Node::with_labels("a", &[])).await;
        state.add_node(&Node::with_labels("b", &[])).await;
        state.delete_node("a").await;
        state.delete_node("missing").await;

        assert_eq!(state.nodes.keys().await, vec!["b"]);
        assert_eq!(state.seed_scores().await.nodes(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_decision_consumed_once() {
        let state = SchedulerState::new();
        let decision = Decision {
            pod: Pod::default(),
            deployment: Deployment {
                metadata: Metadata::named("web"),
                ..Default::default()
            },
            scores: ScoreMap::new(["a"]),
        };
        state.record_decision(decision).await;

        assert!(state.take_decision("other").await.is_none());
        let taken = state.take_decision("web").await.unwrap();
        assert_eq!(taken.scores.nodes(), vec!["a"]);
        assert!(state.take_decision("web").await.is_none());
    }
}
