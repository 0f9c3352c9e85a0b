use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::warn;

use opsdeck_api::VercelClient;

use super::{Depth, LineLimits, Outcome, Placeholder, Source, SourceId, transport_for};
use crate::config::VercelSettings;
use crate::convert;

/// Recent Vercel deployments (deployment host A).
pub struct VercelSource {
    client: Result<VercelClient, Placeholder>,
    timeout: Duration,
    limits: LineLimits,
}

impl VercelSource {
    pub fn new(settings: &VercelSettings, timeout: Duration, limits: LineLimits) -> Self {
        let client = match &settings.token {
            None => Err(Placeholder::not_configured(format!(
                "{} not set",
                settings.token_env
            ))),
            Some(token) => VercelClient::new(
                &settings.api_url,
                token,
                settings.team_id.clone(),
                &transport_for(timeout),
            )
            .map_err(|e| Placeholder::Failed {
                what: "API",
                reason: e.to_string(),
            }),
        };
        Self {
            client,
            timeout,
            limits,
        }
    }
}

impl Source for VercelSource {
    fn id(&self) -> SourceId {
        SourceId::Vercel
    }

    fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome> {
        async move {
            let client = match &self.client {
                Ok(client) => client,
                Err(placeholder) => return Outcome::Unavailable(placeholder.clone()),
            };
            match client.list_deployments(self.limits.for_depth(depth)).await {
                Ok(deployments) => {
                    Outcome::Lines(convert::deployment_lines(&deployments, depth, Utc::now()))
                }
                Err(e) => {
                    warn!(source = "vercel", error = %e, "deployments query failed");
                    Outcome::Unavailable(Placeholder::from_api_error(&e, self.timeout))
                }
            }
        }
        .boxed()
    }
}
