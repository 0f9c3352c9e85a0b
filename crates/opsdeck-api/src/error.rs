use thiserror::Error;

/// Top-level error type for the `opsdeck-api` crate.
///
/// Covers every failure mode of the three service clients: transport,
/// authentication, non-success HTTP status and payload decoding.
/// `opsdeck-core` turns these into placeholder lines; they never reach the
/// dashboard loop as errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The service rejected the token (HTTP 401/403).
    #[error("Authentication failed (HTTP {status})")]
    Authentication { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// A header value (usually the token) contained invalid characters.
    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success status that is not an auth failure.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Body exceeded the size we are willing to parse. `size` is the
    /// declared length, or the bytes read when the cap was crossed.
    #[error("Response too large: {size} bytes (limit {limit})")]
    ResponseTooLarge { size: usize, limit: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with a body excerpt for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-entering credentials might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the request timed out inside reqwest.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Short, single-line description suitable for a dashboard row.
    pub fn summary(&self) -> String {
        match self {
            Self::Authentication { status } => format!("unauthorized (HTTP {status})"),
            Self::Transport(e) if e.is_timeout() => "request timed out".into(),
            Self::Transport(e) if e.is_connect() => "connection failed".into(),
            Self::Transport(_) => "network error".into(),
            Self::Api { status, .. } => format!("HTTP {status}"),
            Self::Deserialization { .. } => "malformed response".into(),
            other => other.to_string(),
        }
    }
}
