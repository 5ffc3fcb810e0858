use async_trait::async_trait;

use crate::pipeline::{Context, Decision, Outcome, Terminal, placement_target};

/// Binds the pod to the best scored node.
pub struct Bind;

#[async_trait]
impl Terminal for Bind {
    async fn finish(&self, ctx: &Context, decision: &Decision) -> Outcome {
        let pod = &decision.pod;
        let node = match placement_target(decision) {
            Ok(node) => node,
            Err(Outcome::Unplaceable) => {
                tracing::warn!(pod=%pod.metadata.name, "No node available for pod");
                return Outcome::Unplaceable;
            }
            Err(outcome) => return outcome,
        };

        match ctx
            .client
            .bind(&pod.metadata.namespace, &pod.metadata.name, &node)
            .await
        {
            Ok(()) => {
                tracing::info!(pod=%pod.metadata.name, node=%node, "Bound");
                Outcome::Committed { node }
            }
            Err(err) => {
                tracing::warn!(pod=%pod.metadata.name, node=%node, error=%err, "Bind failed");
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scores::ScoreMap;
    use crate::testing::{FakeCluster, FakeTraffic, context_with_nodes, deployment, pod_of};
    use shared::models::PodPhase;

    fn decision(scores: ScoreMap) -> Decision {
        let web = deployment("web");
        Decision {
            pod: pod_of(&web, "web-1", "", PodPhase::Pending),
            deployment: web,
            scores,
        }
    }

    #[tokio::test]
    async fn test_binds_best_node() {
        let cluster = Arc::new(FakeCluster::default());
        let ctx = context_with_nodes(vec![], cluster.clone(), FakeTraffic::default()).await;
        let scores = ScoreMap::new(["a", "b"]);
        scores.add("b", 3).unwrap();

        let outcome = Bind.finish(&ctx, &decision(scores)).await;

        assert_eq!(outcome, Outcome::Committed { node: "b".into() });
        assert_eq!(cluster.binds(), vec![("web-1".to_string(), "b".to_string())]);
    }

    #[tokio::test]
    async fn test_nothing_to_bind_to() {
        let cluster = Arc::new(FakeCluster::default());
        let ctx = context_with_nodes(vec![], cluster.clone(), FakeTraffic::default()).await;
        let scores = ScoreMap::new(["a"]);
        scores.disable("a").unwrap();

        assert_eq!(
            Bind.finish(&ctx, &decision(scores)).await,
            Outcome::Unplaceable
        );
        assert!(cluster.binds().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_bind_is_failed() {
        let cluster = Arc::new(FakeCluster {
            fail_bind: true,
            ..Default::default()
        });
        let ctx = context_with_nodes(vec![], cluster.clone(), FakeTraffic::default()).await;

        assert_eq!(
            Bind.finish(&ctx, &decision(ScoreMap::new(["a"]))).await,
            Outcome::Failed
        );
    }
}
