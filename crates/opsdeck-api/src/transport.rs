// Shared transport configuration for building reqwest::Client instances.
//
// All three service clients share timeout and user-agent settings plus the
// status/size/decode handling of a single GET through this module.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Largest response body the clients will parse.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Bytes of body kept in `Error::Deserialization` / `Error::Api`.
const BODY_EXCERPT: usize = 200;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("opsdeck/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with additional default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Build a client that sends `Authorization: Bearer <token>` on every request.
    pub fn build_bearer_client(
        &self,
        token: &SecretString,
        mut extra: HeaderMap,
    ) -> Result<reqwest::Client, Error> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| Error::InvalidHeader {
                name: "authorization",
            })?;
        value.set_sensitive(true);
        extra.insert(AUTHORIZATION, value);
        self.build_client_with_headers(extra)
    }
}

/// Parse a base URL, making sure it ends in `/` so `Url::join` appends
/// rather than replacing the last path segment.
pub(crate) fn normalize_base(base_url: &str) -> Result<Url, Error> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Send a GET and decode the JSON body into `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: Url,
) -> Result<T, Error> {
    debug!("GET {}", url);

    let mut resp = http.get(url).send().await.map_err(Error::Transport)?;
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            status: status.as_u16(),
        });
    }

    if let Some(len) = resp.content_length() {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        if len > MAX_BODY_BYTES {
            return Err(Error::ResponseTooLarge {
                size: len,
                limit: MAX_BODY_BYTES,
            });
        }
    }

    // Content-Length is absent for chunked and decompressed bodies, so the
    // cap is enforced while reading.
    let mut bytes = Vec::new();
    while let Some(chunk) = resp.chunk().await.map_err(Error::Transport)? {
        let size = bytes.len() + chunk.len();
        if size > MAX_BODY_BYTES {
            return Err(Error::ResponseTooLarge {
                size,
                limit: MAX_BODY_BYTES,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: excerpt(&bytes),
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: excerpt(&bytes),
    })
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.chars().take(BODY_EXCERPT).collect()
}
