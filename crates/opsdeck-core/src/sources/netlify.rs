use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::warn;

use opsdeck_api::NetlifyClient;

use super::{Depth, LineLimits, Outcome, Placeholder, Source, SourceId, transport_for};
use crate::config::NetlifySettings;
use crate::convert;

/// Netlify deploys of one site, or the account's sites when no site is
/// pinned (deployment host B).
pub struct NetlifySource {
    client: Result<NetlifyClient, Placeholder>,
    site_id: Option<String>,
    timeout: Duration,
    limits: LineLimits,
}

impl NetlifySource {
    pub fn new(settings: &NetlifySettings, timeout: Duration, limits: LineLimits) -> Self {
        let client = match &settings.token {
            None => Err(Placeholder::not_configured(format!(
                "{} not set",
                settings.token_env
            ))),
            Some(token) => NetlifyClient::new(&settings.api_url, token, &transport_for(timeout))
                .map_err(|e| Placeholder::Failed {
                    what: "API",
                    reason: e.to_string(),
                }),
        };
        Self {
            client,
            site_id: settings.site_id.clone().filter(|s| !s.is_empty()),
            timeout,
            limits,
        }
    }
}

impl Source for NetlifySource {
    fn id(&self) -> SourceId {
        SourceId::Netlify
    }

    fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome> {
        async move {
            let client = match &self.client {
                Ok(client) => client,
                Err(placeholder) => return Outcome::Unavailable(placeholder.clone()),
            };
            let limit = self.limits.for_depth(depth);
            let now = Utc::now();
            let result = match self.site_id.as_deref() {
                Some(site_id) => client
                    .list_deploys(site_id, limit)
                    .await
                    .map(|deploys| convert::netlify_deploy_lines(&deploys, depth, now)),
                None => client
                    .list_sites(limit)
                    .await
                    .map(|sites| convert::netlify_site_lines(&sites, depth, now)),
            };
            match result {
                Ok(lines) => Outcome::Lines(lines),
                Err(e) => {
                    warn!(
                        source = "netlify",
                        site = ?self.site_id,
                        error = %e,
                        "netlify query failed"
                    );
                    Outcome::Unavailable(Placeholder::from_api_error(&e, self.timeout))
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const LIMITS: LineLimits = LineLimits { summary: 6, full: 30 };

    fn settings(api_url: &str, site_id: Option<&str>) -> NetlifySettings {
        NetlifySettings {
            api_url: api_url.into(),
            token: Some(SecretString::from("t".to_owned())),
            token_env: "NETLIFY_TOKEN".into(),
            site_id: site_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn pinned_site_lists_deploys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sites/abc/deploys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "1", "state": "ready", "branch": "main", "context": "production" }
            ])))
            .mount(&server)
            .await;
        let cfg = settings(&server.uri(), Some("abc"));
        let source = NetlifySource::new(&cfg, Duration::from_secs(5), LIMITS);
        assert_eq!(
            source.fetch(Depth::Summary).await.display_lines(),
            vec!["● main · ready · production · -"]
        );
    }

    #[tokio::test]
    async fn unpinned_lists_sites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "s1", "name": "marketing", "published_deploy": { "state": "ready" } }
            ])))
            .mount(&server)
            .await;
        let cfg = settings(&server.uri(), Some(""));
        let source = NetlifySource::new(&cfg, Duration::from_secs(5), LIMITS);
        assert_eq!(
            source.fetch(Depth::Summary).await.display_lines(),
            vec!["● marketing · ready · -"]
        );
    }

    #[tokio::test]
    async fn malformed_payload_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"a list\"}"))
            .mount(&server)
            .await;
        let cfg = settings(&server.uri(), None);
        let source = NetlifySource::new(&cfg, Duration::from_secs(5), LIMITS);
        assert_eq!(
            source.fetch(Depth::Summary).await.display_lines(),
            vec!["Failed to query API: malformed response"]
        );
    }
}
