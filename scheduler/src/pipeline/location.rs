//! Location scoring
//!
//! Per node, in order:
//! 1. traffic affinity: `(percent / 10) * multiplier` for the narrowest window in
//!    which the deployment saw traffic from the node's location
//! 2. a flat bonus when the node sits in the configured default location
//! 3. the pod's `deniedLocations` / `allowedLocations` labels, which disable nodes

use std::collections::HashMap;

use async_trait::async_trait;
use shared::models::Pod;

use super::{Context, Decision, Stage};
use crate::{
    client::location_of,
    telemetry::{TimeWindow, TrafficSource},
};

pub const DENIED_LOCATIONS_LABEL: &str = "deniedLocations";
pub const ALLOWED_LOCATIONS_LABEL: &str = "allowedLocations";
pub const DEFAULT_LOCATION_BONUS: i64 = 5;

pub struct LocationStage {
    default_location: Option<String>,
}

impl LocationStage {
    pub fn new(default_location: Option<String>) -> Self {
        Self {
            default_location: default_location.filter(|l| !l.is_empty()),
        }
    }
}

/// Score earned from recent traffic. Widens the window until some traffic shows
/// up; a failed query ends the search with no points.
pub async fn traffic_points(traffic: &dyn TrafficSource, deployment: &str, location: &str) -> i64 {
    for window in TimeWindow::ALL {
        match traffic.request_percentage(deployment, location, window).await {
            Ok(0) => continue,
            Ok(percent) => return i64::from(percent / 10) * window.multiplier(),
            Err(err) => {
                tracing::warn!(
                    deployment=%deployment,
                    location=%location,
                    window=window.as_duration(),
                    error=%err,
                    "Traffic query failed"
                );
                return 0;
            }
        }
    }
    0
}

/// Deny list first, then allow list. Without either label any location goes.
pub fn is_tolerated(pod: &Pod, location: &str) -> bool {
    if pod
        .label_list(DENIED_LOCATIONS_LABEL)
        .is_some_and(|denied| denied.contains(&location))
    {
        return false;
    }
    pod.label_list(ALLOWED_LOCATIONS_LABEL)
        .is_none_or(|allowed| allowed.contains(&location))
}

#[async_trait]
impl Stage for LocationStage {
    fn name(&self) -> &'static str {
        "location"
    }

    async fn apply(&self, ctx: &Context, decision: &Decision) {
        let deployment = decision.deployment.name();
        let pod = &decision.pod;
        let mut points: HashMap<String, i64> = HashMap::new();

        let nodes = ctx.state.nodes.view().await;
        for name in decision.scores.nodes() {
            let name = name.as_str();
            let Some(node) = nodes.get(name) else {
                tracing::debug!(node=%name, "Node left the inventory");
                let _ = decision.scores.disable(name);
                continue;
            };
            let location = match location_of(node) {
                Ok(location) => location,
                Err(err) => {
                    tracing::warn!(node=%name, error=%err, "Skipping node without location");
                    if pod.label_list(ALLOWED_LOCATIONS_LABEL).is_some() {
                        let _ = decision.scores.disable(name);
                    }
                    continue;
                }
            };

            if !decision.scores.is_disabled(name) {
                let earned = match points.get(location) {
                    Some(p) => *p,
                    None => {
                        let p = traffic_points(ctx.traffic.as_ref(), deployment, location).await;
                        points.insert(location.to_string(), p);
                        p
                    }
                };
                let bonus = match &self.default_location {
                    Some(default) if default == location => DEFAULT_LOCATION_BONUS,
                    _ => 0,
                };
                if earned + bonus > 0 {
                    match decision.scores.add(name, earned + bonus) {
                        Ok(score) => {
                            tracing::debug!(node=%name, location=%location, earned, bonus, score, "Location scored")
                        }
                        Err(err) => tracing::debug!(node=%name, error=%err, "Location score not applied"),
                    }
                }
            }

            if !is_tolerated(pod, location) {
                tracing::debug!(node=%name, location=%location, pod=%pod.metadata.name, "Location not allowed");
                let _ = decision.scores.disable(name);
            }
        }
    }
}
