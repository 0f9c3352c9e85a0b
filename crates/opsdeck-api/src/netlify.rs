// Netlify REST client
//
// Two read paths: the deploy history of one site, or the account's site
// list with each site's published deploy when no site is pinned.

use reqwest::header::HeaderMap;
use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::models::{NetlifyDeploy, NetlifySite};
use crate::transport::{self, TransportConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.netlify.com";

#[derive(Debug, Clone)]
pub struct NetlifyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetlifyClient {
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_bearer_client(token, HeaderMap::new())?;
        Self::from_reqwest(base_url, http)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: transport::normalize_base(base_url)?,
        })
    }

    /// `GET /api/v1/sites/{site_id}/deploys`
    pub async fn list_deploys(
        &self,
        site_id: &str,
        per_page: usize,
    ) -> Result<Vec<NetlifyDeploy>, Error> {
        let mut url = self
            .base_url
            .join(&format!("api/v1/sites/{site_id}/deploys"))?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.clamp(1, 100).to_string());
        transport::get_json(&self.http, url).await
    }

    /// `GET /api/v1/sites`
    pub async fn list_sites(&self, per_page: usize) -> Result<Vec<NetlifySite>, Error> {
        let mut url = self.base_url.join("api/v1/sites")?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.clamp(1, 100).to_string());
        transport::get_json(&self.http, url).await
    }
}
