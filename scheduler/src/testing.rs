//! In-memory fakes of the api server and the traffic store for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::models::{Deployment, Labels, Node, Pod, ReplicaSet, metadata::selector_matches};

use crate::{
    client::ClusterClient,
    errors::{ClientError, TelemetryError},
    pipeline::Context,
    state::SchedulerState,
    telemetry::{TimeWindow, TrafficSource},
};

pub use shared::fixtures::{deployment, located, pod_of, replicaset_of};

#[derive(Default)]
pub struct FakeCluster {
    pub pods: Mutex<Vec<Pod>>,
    pub replicasets: Vec<ReplicaSet>,
    pub deployments: Vec<Deployment>,
    /// (pod, node) per successful bind
    pub binds: Mutex<Vec<(String, String)>>,
    pub evictions: Mutex<Vec<String>>,
    pub fail_bind: bool,
    pub fail_evict: bool,
    pub fail_listing: bool,
}

impl FakeCluster {
    /// Registers a deployment and its single replica set.
    pub fn deploy(mut self, deployment: &Deployment) -> Self {
        self.replicasets.push(replicaset_of(deployment));
        self.deployments.push(deployment.clone());
        self
    }

    pub fn pod(self, pod: Pod) -> Self {
        self.pods.lock().unwrap().push(pod);
        self
    }

    pub fn binds(&self) -> Vec<(String, String)> {
        self.binds.lock().unwrap().clone()
    }

    pub fn evictions(&self) -> Vec<String> {
        self.evictions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError> {
        if self.fail_listing {
            return Err(ClientError::Status {
                status: 500,
                body: "listing disabled".into(),
            });
        }
        Ok(self
            .pods
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.metadata.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn pods_matching(
        &self,
        namespace: &str,
        selector: &Labels,
    ) -> Result<Vec<Pod>, ClientError> {
        Ok(self
            .pods(namespace)
            .await?
            .into_iter()
            .filter(|p| selector_matches(selector, &p.metadata.labels))
            .collect())
    }

    async fn replicaset(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClientError> {
        self.replicasets
            .iter()
            .find(|rs| rs.metadata.namespace == namespace && rs.metadata.name == name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn replicasets(
        &self,
        namespace: &str,
        selector: &Labels,
    ) -> Result<Vec<ReplicaSet>, ClientError> {
        if self.fail_listing {
            return Err(ClientError::Status {
                status: 500,
                body: "listing disabled".into(),
            });
        }
        Ok(self
            .replicasets
            .iter()
            .filter(|rs| {
                rs.metadata.namespace == namespace && selector_matches(selector, &rs.spec.selector)
            })
            .cloned()
            .collect())
    }

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClientError> {
        self.deployments
            .iter()
            .find(|d| d.metadata.namespace == namespace && d.metadata.name == name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(name.to_string()))
    }

    async fn bind(&self, _namespace: &str, pod: &str, node: &str) -> Result<(), ClientError> {
        if self.fail_bind {
            return Err(ClientError::Status {
                status: 409,
                body: "bind rejected".into(),
            });
        }
        self.binds
            .lock()
            .unwrap()
            .push((pod.to_string(), node.to_string()));
        Ok(())
    }

    async fn evict(&self, _namespace: &str, pod: &str) -> Result<(), ClientError> {
        if self.fail_evict {
            return Err(ClientError::Status {
                status: 429,
                body: "eviction refused".into(),
            });
        }
        self.evictions.lock().unwrap().push(pod.to_string());
        Ok(())
    }
}

/// Fixed percentages per (location, window); anything unset is 0 %.
#[derive(Default)]
pub struct FakeTraffic {
    pub percentages: HashMap<(String, TimeWindow), u32>,
    pub failing: Vec<(String, TimeWindow)>,
    pub calls: AtomicUsize,
}

impl FakeTraffic {
    pub fn with(mut self, location: &str, window: TimeWindow, percent: u32) -> Self {
        self.percentages.insert((location.to_string(), window), percent);
        self
    }

    pub fn failing(mut self, location: &str, window: TimeWindow) -> Self {
        self.failing.push((location.to_string(), window));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrafficSource for FakeTraffic {
    async fn request_percentage(
        &self,
        deployment: &str,
        location: &str,
        window: TimeWindow,
    ) -> Result<u32, TelemetryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (location.to_string(), window);
        if self.failing.contains(&key) {
            return Err(TelemetryError::NoTraffic(deployment.to_string()));
        }
        Ok(self.percentages.get(&key).copied().unwrap_or(0))
    }
}

/// Context whose inventory holds `nodes`.
pub async fn context_with_nodes(
    nodes: Vec<Node>,
    cluster: impl Into<Arc<FakeCluster>>,
    traffic: impl Into<Arc<FakeTraffic>>,
) -> Context {
    let state = SchedulerState::new();
    for node in &nodes {
        state.add_node(node).await;
    }
    let cluster: Arc<FakeCluster> = cluster.into();
    let traffic: Arc<FakeTraffic> = traffic.into();
    Context {
        state,
        client: cluster,
        traffic,
    }
}
