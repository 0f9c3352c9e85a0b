// ── Runtime dashboard configuration ──
//
// These types describe *what* the dashboard polls and how often.
// They carry credential data and tuning, but never touch disk.
// The binary builds one `DashboardConfig` at startup and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Upper bound on the per-source fetch timeout.
pub const MAX_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default refresh interval between cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// `min(5s, interval / 2)`
pub fn default_fetch_timeout(refresh_interval: Duration) -> Duration {
    MAX_FETCH_TIMEOUT.min(refresh_interval / 2)
}

/// GitHub Actions source settings.
#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_url: String,
    pub token: Option<SecretString>,
    /// Name of the variable the token is expected in, for placeholders.
    pub token_env: String,
    /// `owner/name`
    pub repo: Option<String>,
}

/// Vercel source settings.
#[derive(Debug, Clone)]
pub struct VercelSettings {
    pub api_url: String,
    pub token: Option<SecretString>,
    pub token_env: String,
    pub team_id: Option<String>,
}

/// Netlify source settings.
#[derive(Debug, Clone)]
pub struct NetlifySettings {
    pub api_url: String,
    pub token: Option<SecretString>,
    pub token_env: String,
    /// When unset the source lists the account's sites instead of deploys.
    pub site_id: Option<String>,
}

/// The two optional helper programs bound to the `a` and `b` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSettings {
    pub tool_a: Option<PathBuf>,
    pub tool_b: Option<PathBuf>,
}

/// Command used by the raw packet-scan view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketScanSettings {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub timeout: Duration,
}

impl Default for PacketScanSettings {
    fn default() -> Self {
        Self {
            command: ["tcpdump", "-nn", "-l", "-c", "20"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Everything the polling engine needs, resolved once at startup.
///
/// Built by the binary from `opsdeck-config`; core never reads config files.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Wait between cycles when no key is pressed.
    pub refresh_interval: Duration,
    /// Upper bound on a single source fetch.
    pub fetch_timeout: Duration,
    /// Lines each source contributes to its panel.
    pub lines_per_source: usize,
    /// Lines a source contributes to its detail view.
    pub detail_lines: usize,
    pub github: GithubSettings,
    pub vercel: VercelSettings,
    pub netlify: NetlifySettings,
    pub tools: ToolSettings,
    pub packet_scan: PacketScanSettings,
    /// Directory holding the dated snapshot files.
    pub snapshot_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_timeout: default_fetch_timeout(DEFAULT_REFRESH_INTERVAL),
            lines_per_source: 6,
            detail_lines: 30,
            github: GithubSettings {
                api_url: opsdeck_api::github::DEFAULT_BASE_URL.into(),
                token: None,
                token_env: "GITHUB_TOKEN".into(),
                repo: None,
            },
            vercel: VercelSettings {
                api_url: opsdeck_api::vercel::DEFAULT_BASE_URL.into(),
                token: None,
                token_env: "VERCEL_TOKEN".into(),
                team_id: None,
            },
            netlify: NetlifySettings {
                api_url: opsdeck_api::netlify::DEFAULT_BASE_URL.into(),
                token: None,
                token_env: "NETLIFY_TOKEN".into(),
                site_id: None,
            },
            tools: ToolSettings::default(),
            packet_scan: PacketScanSettings::default(),
            snapshot_dir: std::env::temp_dir().join("opsdeck"),
        }
    }
}
