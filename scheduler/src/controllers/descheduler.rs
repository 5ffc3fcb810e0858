//! Drift-controller
//! Periodically re-scores running pods and evicts the ones a better node is
//! available for. The decision is recorded so the replacement pod is bound to
//! that node without scoring again.

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::PodPhase;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    config::Config,
    pipeline::{
        Context, Decision, Outcome, Pipeline, Stage, Terminal, default_stages, placement_target,
    },
};

/// Evicts the pod and records the decision for its deployment.
pub struct Evict;

#[async_trait]
impl Terminal for Evict {
    async fn finish(&self, ctx: &Context, decision: &Decision) -> Outcome {
        let pod = &decision.pod;
        let node = match placement_target(decision) {
            Ok(node) => node,
            Err(outcome) => return outcome,
        };

        if let Err(err) = ctx
            .client
            .evict(&pod.metadata.namespace, &pod.metadata.name)
            .await
        {
            tracing::warn!(pod=%pod.metadata.name, error=%err, "Eviction failed");
            return Outcome::Failed;
        }

        tracing::info!(
            pod=%pod.metadata.name,
            from=%pod.spec.node_name,
            to=%node,
            "Evicted for a better node"
        );
        ctx.state.record_decision(decision.clone()).await;
        Outcome::Committed { node }
    }
}

pub struct Descheduler {
    config: Config,
    ctx: Context,
    pipeline: Pipeline,
}

impl Descheduler {
    pub fn new(config: &Config, ctx: Context) -> Self {
        Self::with_stages(config, ctx, default_stages(config))
    }

    pub fn with_stages(
        config: &Config,
        ctx: Context,
        stages: impl IntoIterator<Item = Arc<dyn Stage>>,
    ) -> Self {
        Self {
            config: config.clone(),
            ctx,
            pipeline: Pipeline::builder().stages(stages).build(Arc::new(Evict)),
        }
    }

    pub async fn run(self) {
        tracing::debug!(every=?self.config.deschedule_interval, "Running");
        let mut ticker = interval(self.config.deschedule_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcomes = self.run_iteration().await;
            tracing::debug!(checked = outcomes.len(), "Sweep done");
        }
    }

    /// One sweep over the running pods of this scheduler. Returns the outcome
    /// per pod that could be scored.
    pub async fn run_iteration(&self) -> Vec<(String, Outcome)> {
        let pods = match self.ctx.client.pods(&self.config.namespace).await {
            Ok(pods) => pods,
            Err(err) => {
                tracing::warn!(namespace=%self.config.namespace, error=%err, "Failed to list pods");
                return Vec::new();
            }
        };

        let mut outcomes = Vec::new();
        for pod in pods.into_iter().filter(|p| {
            p.status.phase == PodPhase::Running && p.spec.scheduler_name == self.config.name
        }) {
            let deployment = match self.ctx.client.deployment_of(&pod).await {
                Ok(deployment) => deployment,
                Err(err) => {
                    tracing::warn!(pod=%pod.metadata.name, error=%err, "Skipping pod without deployment");
                    continue;
                }
            };
            let decision = Decision {
                pod,
                deployment,
                scores: self.ctx.state.seed_scores().await,
            };
            let outcome = self.pipeline.run(&self.ctx, &decision).await;
            outcomes.push((decision.pod.metadata.name, outcome));
        }
        outcomes
    }
}
