use async_trait::async_trait;
use shared::models::{Labels, Node, Pod, Taint, TaintEffect};

use super::{Context, Decision, Stage};

/// Filter-only stage: disables nodes the pod's node selector or taint
/// tolerations rule out. Adds no score.
pub struct TopologyStage;

/// Every node selector requirement is present on the node with the same value.
pub fn selector_fits(node_selector: &Labels, node: &Node) -> bool {
    node_selector
        .iter()
        .all(|(k, v)| node.labels.get(k) == Some(v))
}

/// A taint is tolerated by a toleration with the same non-empty key and the same
/// value. A toleration without an effect covers every effect.
pub fn tolerates(pod: &Pod, taint: &Taint) -> bool {
    pod.spec.tolerations.iter().any(|t| {
        !t.key.is_empty()
            && t.key == taint.key
            && t.value == taint.value
            && t.effect.is_none_or(|e| e == taint.effect)
    })
}

fn admits(pod: &Pod, node: &Node) -> bool {
    selector_fits(&pod.spec.node_selector, node)
        && node
            .taints
            .iter()
            .filter(|t| t.effect == TaintEffect::NoSchedule)
            .all(|t| tolerates(pod, t))
}

#[async_trait]
impl Stage for TopologyStage {
    fn name(&self) -> &'static str {
        "topology"
    }

    async fn apply(&self, ctx: &Context, decision: &Decision) {
        let nodes = ctx.state.nodes.view().await;
        for name in decision.scores.nodes() {
            match nodes.get(&name) {
                Some(node) if admits(&decision.pod, node) => continue,
                Some(_) => {
                    tracing::debug!(node=%name, pod=%decision.pod.metadata.name, "Node filtered out")
                }
                None => tracing::debug!(node=%name, "Node left the inventory"),
            }
            if let Err(err) = decision.scores.disable(&name) {
                tracing::debug!(node=%name, error=%err, "Cannot disable node");
            }
        }
    }
}
