use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::warn;

use opsdeck_api::GithubClient;

use super::{Depth, LineLimits, Outcome, Placeholder, Source, SourceId, transport_for};
use crate::config::GithubSettings;
use crate::convert;

/// Recent workflow runs of one repository (the remote build host).
pub struct GithubSource {
    setup: Result<(GithubClient, String), Placeholder>,
    timeout: Duration,
    limits: LineLimits,
}

impl GithubSource {
    pub fn new(settings: &GithubSettings, timeout: Duration, limits: LineLimits) -> Self {
        let setup = match (&settings.token, settings.repo.as_deref()) {
            (None, _) => Err(Placeholder::not_configured(format!(
                "{} not set",
                settings.token_env
            ))),
            (Some(_), None) => Err(Placeholder::not_configured("github.repo not set")),
            (Some(token), Some(repo)) => {
                GithubClient::new(&settings.api_url, token, &transport_for(timeout))
                    .map(|client| (client, repo.to_owned()))
                    .map_err(|e| Placeholder::Failed {
                        what: "API",
                        reason: e.to_string(),
                    })
            }
        };
        Self {
            setup,
            timeout,
            limits,
        }
    }
}

impl Source for GithubSource {
    fn id(&self) -> SourceId {
        SourceId::Github
    }

    fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome> {
        async move {
            let (client, repo) = match &self.setup {
                Ok(ready) => ready,
                Err(placeholder) => return Outcome::Unavailable(placeholder.clone()),
            };
            match client
                .list_workflow_runs(repo, self.limits.for_depth(depth))
                .await
            {
                Ok(runs) => Outcome::Lines(convert::workflow_run_lines(&runs, depth, Utc::now())),
                Err(e) => {
                    warn!(
                        source = "github",
                        repo = %repo,
                        error = %e,
                        "workflow runs query failed"
                    );
                    Outcome::Unavailable(Placeholder::from_api_error(&e, self.timeout))
                }
            }
        }
        .boxed()
    }
}
