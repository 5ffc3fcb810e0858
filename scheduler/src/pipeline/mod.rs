//! Scoring pipeline
//!
//! An ordered list of [`Stage`]s wrapped around a [`Terminal`] action. Each stage
//! mutates the attempt's [`ScoreMap`] and the chain always moves on to the next
//! stage: vetoes are expressed by disabling nodes, never by stopping the chain.
//! Stages run in the order they were added, so later stages observe the
//! mutations of earlier ones.

pub mod colocation;
pub mod location;
pub mod topology;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use shared::models::{Deployment, Pod};
use tracing::Instrument;

use crate::{
    client::ClusterClient, config::Config, scores::ScoreMap, state::State,
    telemetry::TrafficSource,
};

pub use colocation::ColocationStage;
pub use location::LocationStage;
pub use topology::TopologyStage;

/// Collaborators available to every stage and terminal.
#[derive(Clone)]
pub struct Context {
    pub state: State,
    pub client: Arc<dyn ClusterClient>,
    pub traffic: Arc<dyn TrafficSource>,
}

/// Pod, its owning deployment and the scores computed for it.
///
/// Recorded after an eviction so the replacement pod of the same deployment
/// is bound without scoring again.
#[derive(Debug, Clone)]
pub struct Decision {
    pub pod: Pod,
    pub deployment: Deployment,
    pub scores: ScoreMap,
}

/// Result of one scheduling or descheduling attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Pod bound to, or evicted in favour of, `node`.
    Committed { node: String },
    /// Pod already runs on the best node.
    InPlace,
    /// Every node disabled, or the best one scored zero.
    Unplaceable,
    /// The api server rejected the bind or eviction.
    Failed,
    /// Attempt dropped before scoring, e.g. no owning deployment.
    Abandoned,
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, ctx: &Context, decision: &Decision);
}

/// Action taken once every stage has run.
#[async_trait]
pub trait Terminal: Send + Sync {
    async fn finish(&self, ctx: &Context, decision: &Decision) -> Outcome;
}

/// Node the pod should move to, or the outcome when there is nothing to do.
pub fn placement_target(decision: &Decision) -> Result<String, Outcome> {
    let Some((node, score)) = decision.scores.select_best() else {
        return Err(Outcome::Unplaceable);
    };
    if score == 0 {
        return Err(Outcome::Unplaceable);
    }
    if decision.pod.spec.node_name == node {
        return Err(Outcome::InPlace);
    }
    Ok(node)
}

/// The stages both scheduling and descheduling run, in order.
pub fn default_stages(config: &Config) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(TopologyStage),
        Arc::new(LocationStage::new(config.default_location.clone())),
        Arc::new(ColocationStage::new(config.max_pods_per_node)),
    ]
}

enum Link {
    Stage { stage: Arc<dyn Stage>, next: Box<Link> },
    Terminal(Arc<dyn Terminal>),
}

impl Link {
    fn call<'a>(&'a self, ctx: &'a Context, decision: &'a Decision) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            match self {
                Link::Stage { stage, next } => {
                    let span = tracing::debug_span!("stage", stage = stage.name());
                    stage.apply(ctx, decision).instrument(span).await;
                    next.call(ctx, decision).await
                }
                Link::Terminal(terminal) => terminal.finish(ctx, decision).await,
            }
        })
    }
}

/// A composed chain of stages ending in a terminal action.
pub struct Pipeline {
    chain: Link,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { stages: Vec::new() }
    }

    pub async fn run(&self, ctx: &Context, decision: &Decision) -> Outcome {
        let outcome = self.chain.call(ctx, decision).await;
        tracing::debug!(
            pod = %decision.pod.metadata.name,
            deployment = %decision.deployment.metadata.name,
            nodes = decision.scores.len(),
            scores = ?decision.scores.list_descending(),
            ?outcome,
            "Pipeline finished"
        );
        outcome
    }
}

pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(mut self, stages: impl IntoIterator<Item = Arc<dyn Stage>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Wraps the stages around `terminal`, innermost last, so the first stage
    /// added is the first to run.
    pub fn build(self, terminal: Arc<dyn Terminal>) -> Pipeline {
        let chain = self
            .stages
            .into_iter()
            .rev()
            .fold(Link::Terminal(terminal), |next, stage| Link::Stage {
                stage,
                next: Box::new(next),
            });
        Pipeline { chain }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::testing::{FakeCluster, FakeTraffic, context_with_nodes};
    use shared::models::Node;

    /// Records which nodes were still enabled when the stage ran.
    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, String)>>>,
        bump: i64,
    }

    #[async_trait]
    impl Stage for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn apply(&self, _ctx: &Context, decision: &Decision) {
            for node in decision.scores.nodes() {
                if decision.scores.add(&node, self.bump).is_ok() {
                    self.seen.lock().unwrap().push((self.name, node));
                }
            }
        }
    }

    struct DisableNode(&'static str);

    #[async_trait]
    impl Stage for DisableNode {
        fn name(&self) -> &'static str {
            "disable"
        }

        async fn apply(&self, _ctx: &Context, decision: &Decision) {
            decision.scores.disable(self.0).unwrap();
        }
    }

    struct Best;

    #[async_trait]
    impl Terminal for Best {
        async fn finish(&self, _ctx: &Context, decision: &Decision) -> Outcome {
            match placement_target(decision) {
                Ok(node) => Outcome::Committed { node },
                Err(outcome) => outcome,
            }
        }
    }

    fn decision(nodes: &[&str]) -> Decision {
        Decision {
            pod: Pod::default(),
            deployment: Deployment::default(),
            scores: ScoreMap::new(nodes.iter().copied()),
        }
    }

    async fn ctx() -> Context {
        context_with_nodes(
            vec![Node::with_labels("a", &[]), Node::with_labels("b", &[])],
            FakeCluster::default(),
            FakeTraffic::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_see_earlier_disables() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .stage(Arc::new(DisableNode("a")))
            .stage(Arc::new(Recorder {
                name: "score-a",
                seen: seen.clone(),
                bump: 10,
            }))
            .stage(Arc::new(Recorder {
                name: "score-b",
                seen: seen.clone(),
                bump: 5,
            }))
            .build(Arc::new(Best));

        let decision = decision(&["a", "b"]);
        let outcome = pipeline.run(&ctx().await, &decision).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("score-a", "b".to_string()), ("score-b", "b".to_string())]
        );
        assert_eq!(outcome, Outcome::Committed { node: "b".into() });
        assert_eq!(decision.scores.select_best(), Some(("b".to_string(), 35)));
    }

    #[tokio::test]
    async fn test_empty_pipeline_reaches_terminal() {
        let pipeline = Pipeline::builder().build(Arc::new(Best));
        let decision = decision(&["a"]);
        assert_eq!(
            pipeline.run(&ctx().await, &decision).await,
            Outcome::Committed { node: "a".into() }
        );
    }

    #[test]
    fn test_placement_target_rules() {
        let d = decision(&[]);
        assert_eq!(placement_target(&d), Err(Outcome::Unplaceable));

        let d = decision(&["a", "b"]);
        d.scores.set("a", 0).unwrap();
        d.scores.set("b", 0).unwrap();
        assert_eq!(placement_target(&d), Err(Outcome::Unplaceable));

        let mut d = decision(&["a", "b"]);
        d.scores.add("b", 10).unwrap();
        assert_eq!(placement_target(&d), Ok("b".to_string()));
        d.pod.spec.node_name = "b".into();
        assert_eq!(placement_target(&d), Err(Outcome::InPlace));
    }
}
