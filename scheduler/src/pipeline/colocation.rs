use std::collections::HashMap;

use async_trait::async_trait;

use super::{Context, Decision, Stage};

/// Spreads a deployment's pods across nodes.
///
/// A node hosting `n` ready siblings of the pod keeps `score / (n + 1)`; at
/// `max_pods` siblings the node is disabled.
pub struct ColocationStage {
    max_pods: usize,
}

impl ColocationStage {
    pub fn new(max_pods: usize) -> Self {
        Self { max_pods }
    }
}

#[async_trait]
impl Stage for ColocationStage {
    fn name(&self) -> &'static str {
        "colocation"
    }

    async fn apply(&self, ctx: &Context, decision: &Decision) {
        let siblings = match ctx.client.pods_of(&decision.deployment).await {
            Ok(pods) => pods,
            Err(err) => {
                tracing::warn!(
                    deployment=%decision.deployment.metadata.name,
                    error=%err,
                    "Failed to list deployment pods"
                );
                return;
            }
        };

        let mut per_node: HashMap<String, usize> = HashMap::new();
        for pod in siblings.iter().filter(|p| {
            p.metadata.name != decision.pod.metadata.name
                && !p.spec.node_name.is_empty()
                && p.is_ready()
        }) {
            *per_node.entry(pod.spec.node_name.clone()).or_default() += 1;
        }

        for (node, count) in per_node {
            let Ok(score) = decision.scores.get(&node) else {
                continue;
            };
            let Some(current) = score.value() else {
                continue;
            };
            if count >= self.max_pods {
                tracing::debug!(node=%node, count, max=self.max_pods, "Node at pod cap");
                let _ = decision.scores.disable(&node);
            } else {
                let reduced = i64::from(current) / (count as i64 + 1);
                if let Err(err) = decision.scores.set(&node, reduced) {
                    tracing::debug!(node=%node, error=%err, "Colocation score not applied");
                }
            }
        }
    }
}
