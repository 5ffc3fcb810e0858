//! Edge scheduler
//!
//! Places pending pods on the node whose location best matches where their
//! traffic comes from, and periodically moves running pods when a better node
//! appears. Runs concurrently:
//! - scheduling engine (node and pod watches)
//! - drift corrector
//! - status server

use std::sync::Arc;

use edge_scheduler::{
    client::ApiClient, config::Config, controllers, endpoints, pipeline::Context,
    state::SchedulerState, telemetry::InfluxClient,
};
use tracing_subscriber::{self, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = Config::from_env().map_err(|e| e.to_string())?;

    let default_level = if config.debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},actix_server=warn,actix_web=warn",
            default_level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        name=%config.name,
        namespace=%config.namespace,
        api_server=%config.api_server_url,
        influx=%config.influx.addr,
        "Starting scheduler"
    );

    let ctx = Context {
        state: SchedulerState::new(),
        client: Arc::new(ApiClient::new(&config.api_server_url)),
        traffic: Arc::new(InfluxClient::new(&config.influx)),
    };

    tokio::try_join!(
        controllers::run(&config, ctx.clone()),
        endpoints::serve(ctx.state.clone(), config.status_port),
    )?;

    Ok(())
}
