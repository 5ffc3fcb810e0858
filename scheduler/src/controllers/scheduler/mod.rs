//! Scheduling engine
//!
//! Watches nodes to keep the inventory current and watches pods to place every
//! pending pod that names this scheduler. A decision recorded by the descheduler
//! for the pod's deployment is reused as is; otherwise the pod is scored by the
//! pipeline and bound to the best node.

mod bind;

use std::sync::Arc;
use std::time::Duration;

use shared::api::{EventType, NodeEvent, PodEvent};
use shared::models::{Pod, PodPhase};
use shared::utils::watch_stream;

use crate::{
    client::{nodes_watch_uri, pods_watch_uri},
    config::Config,
    pipeline::{Context, Decision, Outcome, Pipeline, Stage, Terminal, default_stages},
};

pub use bind::Bind;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub struct Scheduler {
    name: String,
    ctx: Context,
    pipeline: Pipeline,
    binder: Arc<Bind>,
    pods_uri: String,
    nodes_uri: String,
}

impl Scheduler {
    pub fn new(config: &Config, ctx: Context) -> Arc<Self> {
        Self::with_stages(config, ctx, default_stages(config))
    }

    pub fn with_stages(
        config: &Config,
        ctx: Context,
        stages: impl IntoIterator<Item = Arc<dyn Stage>>,
    ) -> Arc<Self> {
        let binder = Arc::new(Bind);
        Arc::new(Self {
            name: config.name.clone(),
            ctx,
            pipeline: Pipeline::builder().stages(stages).build(binder.clone()),
            binder,
            pods_uri: pods_watch_uri(&config.api_server_url, &config.namespace),
            nodes_uri: nodes_watch_uri(&config.api_server_url),
        })
    }

    pub async fn run(self: Arc<Self>) {
        tracing::debug!(scheduler=%self.name, "Running");

        let _ = tokio::try_join!(
            tokio::spawn(self.clone().watch_nodes()),
            tokio::spawn(self.clone().watch_pods()),
        );
    }

    /// Re-opens the watch whenever the stream ends.
    async fn watch_nodes(self: Arc<Self>) {
        loop {
            watch_stream(&self.nodes_uri, |event: NodeEvent| {
                self.handle_node_event(event)
            })
            .await;
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn watch_pods(self: Arc<Self>) {
        loop {
            watch_stream(&self.pods_uri, |event: PodEvent| self.handle_pod_event(event)).await;
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    pub async fn handle_node_event(&self, event: NodeEvent) {
        let state = &self.ctx.state;
        match event.event_type {
            EventType::Added | EventType::Modified => {
                tracing::debug!(node=%event.node.name, location=?event.node.location(), "Node updated");
                state.add_node(&event.node).await;
            }
            EventType::Deleted => {
                tracing::debug!(node=%event.node.name, "Node removed");
                state.delete_node(&event.node.name).await;
            }
        }
    }

    pub async fn handle_pod_event(&self, event: PodEvent) {
        if event.event_type != EventType::Added {
            return;
        }
        let pod = event.pod;
        if pod.status.phase != PodPhase::Pending
            || pod.spec.scheduler_name != self.name
            || !pod.spec.node_name.is_empty()
        {
            tracing::trace!(pod=%pod.metadata.name, "Not ours to schedule");
            return;
        }
        self.schedule(pod).await;
    }

    /// One scheduling attempt. Failures are logged and left to the next event
    /// carrying the pod.
    pub async fn schedule(&self, pod: Pod) -> Outcome {
        let deployment = match self.ctx.client.deployment_of(&pod).await {
            Ok(deployment) => deployment,
            Err(err) => {
                tracing::warn!(pod=%pod.metadata.name, error=%err, "Cannot resolve deployment, abandoning");
                return Outcome::Abandoned;
            }
        };

        if let Some(recorded) = self.ctx.state.take_decision(deployment.name()).await {
            tracing::info!(
                pod=%pod.metadata.name,
                deployment=%deployment.metadata.name,
                "Reusing recorded decision"
            );
            let decision = Decision {
                pod,
                deployment,
                scores: recorded.scores,
            };
            return self.binder.finish(&self.ctx, &decision).await;
        }

        let scores = self.ctx.state.seed_scores().await;
        if scores.is_empty() {
            tracing::warn!(pod=%pod.metadata.name, "No nodes in inventory");
        }
        let decision = Decision {
            pod,
            deployment,
            scores,
        };
        self.pipeline.run(&self.ctx, &decision).await
    }
}
