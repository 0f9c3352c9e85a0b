// Vercel REST client
//
// Lists recent deployments for the token's personal account or, when a
// team id is configured, for that team.

use reqwest::header::HeaderMap;
use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::models::{DeploymentsResponse, VercelDeployment};
use crate::transport::{self, TransportConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.vercel.com";

/// Client for `GET /v6/deployments`.
#[derive(Debug, Clone)]
pub struct VercelClient {
    http: reqwest::Client,
    base_url: Url,
    team_id: Option<String>,
}

impl VercelClient {
    pub fn new(
        base_url: &str,
        token: &SecretString,
        team_id: Option<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_bearer_client(token, HeaderMap::new())?;
        Ok(Self::from_reqwest(base_url, http)?.with_team(team_id))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: transport::normalize_base(base_url)?,
            team_id: None,
        })
    }

    /// Scope every request to a team.
    pub fn with_team(mut self, team_id: Option<String>) -> Self {
        self.team_id = team_id.filter(|t| !t.is_empty());
        self
    }

    /// Most recent deployments, newest first.
    pub async fn list_deployments(&self, limit: usize) -> Result<Vec<VercelDeployment>, Error> {
        let mut url = self.base_url.join("v6/deployments")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("limit", &limit.clamp(1, 100).to_string());
            if let Some(ref team) = self.team_id {
                q.append_pair("teamId", team);
            }
        }

        let resp: DeploymentsResponse = transport::get_json(&self.http, url).await?;
        Ok(resp.deployments)
    }
}
