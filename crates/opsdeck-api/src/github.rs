// GitHub Actions REST client
//
// Read-only access to workflow runs for a single repository. Authentication
// is a bearer token (classic PAT or fine-grained token with `actions:read`).

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::models::{WorkflowRun, WorkflowRunsResponse};
use crate::transport::{self, TransportConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Client for `GET /repos/{owner}/{repo}/actions/runs`.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GithubClient {
    /// Create a client authenticated with `token`.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        let http = transport.build_bearer_client(token, headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: transport::normalize_base(base_url)?,
        })
    }

    /// Most recent workflow runs for `repo` (`owner/name`), newest first.
    pub async fn list_workflow_runs(
        &self,
        repo: &str,
        per_page: usize,
    ) -> Result<Vec<WorkflowRun>, Error> {
        let mut url = self.base_url.join(&format!("repos/{repo}/actions/runs"))?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.clamp(1, 100).to_string());

        let resp: WorkflowRunsResponse = transport::get_json(&self.http, url).await?;
        Ok(resp.workflow_runs)
    }
}
