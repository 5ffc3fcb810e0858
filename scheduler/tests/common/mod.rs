#![allow(dead_code)]

use std::sync::Arc;

use edge_scheduler::{
    client::ApiClient,
    config::{Config, InfluxConfig},
    pipeline::Context,
    state::SchedulerState,
    telemetry::{InfluxClient, TimeWindow, location_statement, total_statement},
};
use serde_json::json;
use shared::models::{Deployment, Node, Pod, metadata::selector_string};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use shared::fixtures::{deployment, located, pod_of, replicaset_of};

/// Api server serving one deployment, its replica set and `pods`, accepting
/// binds and evictions.
pub async fn api_server(deployment: &Deployment, pods: &[Pod]) -> MockServer {
    let server = MockServer::start().await;
    let rs = replicaset_of(deployment);

    Mock::given(method("GET"))
        .and(path(format!("/deployments/{}", deployment.metadata.name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployment))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/replicasets/{}", rs.metadata.name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&rs))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/replicasets"))
        .and(query_param("selector", selector_string(&deployment.spec.selector)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![&rs]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pods))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/pods/[^/]+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/pods/[^/]+/eviction$"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    server
}

fn count_body(count: u64) -> serde_json::Value {
    json!({"results": [{"statement_id": 0, "series": [{
        "name": "request",
        "columns": ["time", "count"],
        "values": [["1970-01-01T00:00:00Z", count]]
    }]}]})
}

/// Traffic store where `deployment` saw `percent` % of its requests from
/// `location` within `window`. Every other query finds no points.
pub async fn influx(
    deployment: &str,
    traffic: &[(&str, TimeWindow, u64)],
) -> MockServer {
    let server = MockServer::start().await;
    for (location, window, percent) in traffic {
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("q", location_statement(deployment, location, *window)))
            .respond_with(ResponseTemplate::new(200).set_body_json(count_body(*percent)))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("q", total_statement(deployment, *window)))
            .respond_with(ResponseTemplate::new(200).set_body_json(count_body(100)))
            .with_priority(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": [{"statement_id": 0}]})),
        )
        .with_priority(10)
        .mount(&server)
        .await;
    server
}

pub fn config(api: &MockServer, influx: &MockServer, default_location: Option<&str>) -> Config {
    Config {
        api_server_url: api.uri(),
        influx: InfluxConfig {
            addr: influx.uri(),
            ..Default::default()
        },
        default_location: default_location.map(str::to_string),
        ..Default::default()
    }
}

/// Context talking to the mock servers, with `nodes` already in the inventory.
pub async fn context(config: &Config, nodes: &[Node]) -> Context {
    let state = SchedulerState::new();
    for node in nodes {
        state.add_node(node).await;
    }
    Context {
        state,
        client: Arc::new(ApiClient::new(&config.api_server_url)),
        traffic: Arc::new(InfluxClient::new(&config.influx)),
    }
}

/// `(pod, node)` of every bind request the api server received.
pub async fn binds(api: &MockServer) -> Vec<(String, String)> {
    api.received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| {
            let pod = r.url.path().trim_start_matches("/pods/").to_string();
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            (pod, body["value"].as_str().unwrap_or_default().to_string())
        })
        .collect()
}

pub async fn evictions(api: &MockServer) -> Vec<String> {
    api.received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| {
            r.url
                .path()
                .trim_start_matches("/pods/")
                .trim_end_matches("/eviction")
                .to_string()
        })
        .collect()
}

pub async fn influx_queries(influx: &MockServer) -> usize {
    influx.received_requests().await.unwrap_or_default().len()
}
