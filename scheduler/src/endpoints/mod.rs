//! Read-only diagnostics: health, the node inventory and pending decisions.

use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use serde::Serialize;

use crate::{
    scores::Score,
    state::{SchedulerState, State},
};

type Data = web::Data<SchedulerState>;

#[derive(Debug, Serialize)]
struct NodeView {
    name: String,
    location: Option<String>,
}

#[derive(Debug, Serialize)]
struct DecisionView {
    deployment: String,
    pod: String,
    scores: Vec<(String, Score)>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(healthz))
        .route("/nodes", web::get().to(nodes))
        .route("/decisions", web::get().to(decisions));
}

pub async fn serve(state: State, port: u16) -> Result<(), String> {
    tracing::info!(port, "Starting status server");
    let data = web::Data::from(state);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(config))
        .workers(1)
        .bind(("0.0.0.0", port))
        .map_err(|e| e.to_string())?
        .run()
        .await
        .map_err(|e| e.to_string())
}

async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

async fn nodes(state: Data) -> impl Responder {
    let view = state.nodes.view().await;
    let mut nodes: Vec<NodeView> = view
        .iter()
        .map(|(name, node)| NodeView {
            name: name.clone(),
            location: node.location().map(str::to_string),
        })
        .collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    HttpResponse::Ok().json(nodes)
}

async fn decisions(state: Data) -> impl Responder {
    let view = state.decisions.view().await;
    let mut decisions: Vec<DecisionView> = view
        .iter()
        .map(|(deployment, d)| DecisionView {
            deployment: deployment.clone(),
            pod: d.pod.metadata.name.clone(),
            scores: d.scores.list_descending(),
        })
        .collect();
    decisions.sort_by(|a, b| a.deployment.cmp(&b.deployment));
    HttpResponse::Ok().json(decisions)
}
