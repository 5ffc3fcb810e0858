//! Access to the cluster api server
//!
//! The controllers only see [`ClusterClient`]; [`ApiClient`] talks to the api
//! server over HTTP.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    api::{Eviction, PodField, PodPatch},
    models::{
        Deployment, Labels, Node, OwnerKind, Pod, ReplicaSet, metadata::selector_string,
    },
};

use crate::errors::ClientError;

#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError>;

    async fn pods_matching(
        &self,
        namespace: &str,
        selector: &Labels,
    ) -> Result<Vec<Pod>, ClientError>;

    async fn replicaset(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClientError>;

    async fn replicasets(
        &self,
        namespace: &str,
        selector: &Labels,
    ) -> Result<Vec<ReplicaSet>, ClientError>;

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClientError>;

    async fn bind(&self, namespace: &str, pod: &str, node: &str) -> Result<(), ClientError>;

    async fn evict(&self, namespace: &str, pod: &str) -> Result<(), ClientError>;

    /// Follows owner references pod -> replica set -> deployment.
    async fn deployment_of(&self, pod: &Pod) -> Result<Deployment, ClientError> {
        let namespace = &pod.metadata.namespace;
        let owner = pod.metadata.owner_reference.as_ref().ok_or_else(|| {
            ClientError::NotFound(format!("pod {} has no owner reference", pod.metadata.name))
        })?;
        if owner.kind == OwnerKind::Deployment {
            return self.deployment(namespace, &owner.name).await;
        }

        let rs = self
            .replicaset(namespace, &owner.name)
            .await
            .map_err(|_| ClientError::NotFound(format!("replica set {} not found", owner.name)))?;
        let rs_owner = rs.metadata.owner_reference.as_ref().ok_or_else(|| {
            ClientError::NotFound(format!("replica set {} has no owner reference", rs.metadata.name))
        })?;
        self.deployment(namespace, &rs_owner.name)
            .await
            .map_err(|_| ClientError::NotFound(format!("deployment {} not found", rs_owner.name)))
    }

    /// Every pod of every replica set selected by the deployment.
    async fn pods_of(&self, deployment: &Deployment) -> Result<Vec<Pod>, ClientError> {
        let namespace = &deployment.metadata.namespace;
        let replicasets = self
            .replicasets(namespace, &deployment.spec.selector)
            .await?;
        if replicasets.is_empty() {
            return Err(ClientError::NotFound(format!(
                "deployment {} has no replica set",
                deployment.metadata.name
            )));
        }

        let mut pods = Vec::new();
        for rs in replicasets {
            match self.pods_matching(namespace, &rs.spec.selector).await {
                Ok(found) => pods.extend(found),
                Err(err) => {
                    tracing::warn!(replicaset=%rs.metadata.name, error=%err, "Failed to list pods")
                }
            }
        }
        Ok(pods)
    }
}

/// Location label of a node.
pub fn location_of(node: &Node) -> Result<&str, ClientError> {
    node.location().ok_or_else(|| {
        ClientError::NotFound(format!(
            "node {} has no label '{}'",
            node.name,
            shared::models::node::LOCATION_LABEL
        ))
    })
}

pub fn nodes_watch_uri(base_url: &str) -> String {
    format!("{}/nodes?watch=true", base_url.trim_end_matches('/'))
}

pub fn pods_watch_uri(base_url: &str, namespace: &str) -> String {
    format!(
        "{}/pods?namespace={}&watch=true",
        base_url.trim_end_matches('/'),
        namespace
    )
}

/// HTTP implementation of [`ClusterClient`].
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        check(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Maps non-success responses to errors.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().path().to_string();
    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(url));
    }
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ClusterClient for ApiClient {
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError> {
        self.get_json("/pods", &[("namespace", namespace)]).await
    }

    async fn pods_matching(
        &self,
        namespace: &str,
        selector: &Labels,
    ) -> Result<Vec<Pod>, ClientError> {
        let selector = selector_string(selector);
        self.get_json("/pods", &[("namespace", namespace), ("selector", &selector)])
            .await
    }

    async fn replicaset(&self, namespace: &str, name: &str) -> Result<ReplicaSet, ClientError> {
        self.get_json(&format!("/replicasets/{}", name), &[("namespace", namespace)])
            .await
    }

    async fn replicasets(
        &self,
        namespace: &str,
        selector: &Labels,
    ) -> Result<Vec<ReplicaSet>, ClientError> {
        let selector = selector_string(selector);
        self.get_json(
            "/replicasets",
            &[("namespace", namespace), ("selector", &selector)],
        )
        .await
    }

    async fn deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClientError> {
        self.get_json(&format!("/deployments/{}", name), &[("namespace", namespace)])
            .await
    }

    async fn bind(&self, namespace: &str, pod: &str, node: &str) -> Result<(), ClientError> {
        let patch = PodPatch {
            pod_field: PodField::NodeName,
            value: serde_json::Value::String(node.to_string()),
        };
        let resp = self
            .http
            .patch(format!("{}/pods/{}", self.base_url, pod))
            .query(&[("namespace", namespace)])
            .json(&patch)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn evict(&self, namespace: &str, pod: &str) -> Result<(), ClientError> {
        let eviction = Eviction {
            name: pod.to_string(),
            namespace: namespace.to_string(),
            grace_period_seconds: None,
        };
        let resp = self
            .http
            .post(format!("{}/pods/{}/eviction", self.base_url, pod))
            .json(&eviction)
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }
}
