//! Configuration for the opsdeck dashboard.
//!
//! A TOML file layered under `OPSDECK_*` environment variables, credential
//! resolution (named env var, then plaintext), and translation to the
//! immutable `opsdeck_core::DashboardConfig` the engine runs on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opsdeck_core::config::default_fetch_timeout;
use opsdeck_core::{
    DashboardConfig, GithubSettings, NetlifySettings, PacketScanSettings, ToolSettings,
    VercelSettings,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Seconds between refresh cycles.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Per-source fetch bound; `min(5, interval / 2)` when unset.
    pub fetch_timeout_secs: Option<u64>,

    #[serde(default = "default_lines_per_source")]
    pub lines_per_source: usize,

    #[serde(default = "default_detail_lines")]
    pub detail_lines: usize,

    /// Directory for dated snapshot files.
    pub snapshot_dir: Option<PathBuf>,

    /// Diagnostics log written by the tracing subscriber.
    #[serde(default = "default_diagnostics_log")]
    pub diagnostics_log: PathBuf,

    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "ServiceSection::github")]
    pub github: ServiceSection,

    #[serde(default = "ServiceSection::vercel")]
    pub vercel: ServiceSection,

    #[serde(default = "ServiceSection::netlify")]
    pub netlify: ServiceSection,

    #[serde(default)]
    pub tools: ToolsSection,

    #[serde(default)]
    pub packet_scan: PacketScanSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            fetch_timeout_secs: None,
            lines_per_source: default_lines_per_source(),
            detail_lines: default_detail_lines(),
            snapshot_dir: None,
            diagnostics_log: default_diagnostics_log(),
            log_level: default_log_level(),
            github: ServiceSection::github(),
            vercel: ServiceSection::vercel(),
            netlify: ServiceSection::netlify(),
            tools: ToolsSection::default(),
            packet_scan: PacketScanSection::default(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    30
}
fn default_lines_per_source() -> usize {
    6
}
fn default_detail_lines() -> usize {
    30
}
fn default_diagnostics_log() -> PathBuf {
    std::env::temp_dir().join("opsdeck.log")
}
fn default_log_level() -> String {
    "info".into()
}

/// One remote service. Not every field applies to every service:
/// `repo` is GitHub's, `team_id` Vercel's, `site_id` Netlify's.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceSection {
    /// Override of the public API base URL.
    pub api_url: Option<String>,

    /// Plaintext token (prefer `token_env`).
    pub token: Option<String>,

    /// Environment variable holding the token.
    pub token_env: Option<String>,

    /// `owner/name`
    pub repo: Option<String>,

    pub team_id: Option<String>,

    pub site_id: Option<String>,
}

impl ServiceSection {
    fn with_env(name: &str) -> Self {
        Self {
            token_env: Some(name.into()),
            ..Self::default()
        }
    }

    fn github() -> Self {
        Self::with_env("GITHUB_TOKEN")
    }

    fn vercel() -> Self {
        Self::with_env("VERCEL_TOKEN")
    }

    fn netlify() -> Self {
        Self::with_env("NETLIFY_TOKEN")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsSection {
    pub tool_a: Option<PathBuf>,
    pub tool_b: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PacketScanSection {
    /// Program and arguments.
    #[serde(default = "default_scan_command")]
    pub command: Vec<String>,

    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,
}

impl Default for PacketScanSection {
    fn default() -> Self {
        Self {
            command: default_scan_command(),
            timeout_secs: default_scan_timeout(),
        }
    }
}

fn default_scan_command() -> Vec<String> {
    PacketScanSettings::default().command
}
fn default_scan_timeout() -> u64 {
    PacketScanSettings::default().timeout.as_secs()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "opsdeck", "opsdeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("opsdeck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OPSDECK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a token: the named environment variable, then plaintext.
///
/// Empty values count as absent.
pub fn resolve_token(token_env: Option<&str>, plaintext: Option<&str>) -> Option<SecretString> {
    resolve_token_with(token_env, plaintext, |name| std::env::var(name).ok())
}

/// [`resolve_token`] with an injectable environment lookup.
pub fn resolve_token_with(
    token_env: Option<&str>,
    plaintext: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    // 1. Named env var
    if let Some(val) = token_env.and_then(&lookup).filter(|v| !v.trim().is_empty()) {
        return Some(SecretString::from(val));
    }

    // 2. Plaintext in config
    plaintext
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.to_owned()))
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the engine configuration, resolving credentials from the
/// process environment.
pub fn to_dashboard_config(cfg: &Config) -> Result<DashboardConfig, ConfigError> {
    to_dashboard_config_with(cfg, |name| std::env::var(name).ok())
}

/// [`to_dashboard_config`] with an injectable environment lookup.
pub fn to_dashboard_config_with(
    cfg: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DashboardConfig, ConfigError> {
    let defaults = DashboardConfig::default();

    let refresh_interval = Duration::from_secs(cfg.refresh_interval_secs.max(1));
    let fetch_timeout = cfg.fetch_timeout_secs.map_or_else(
        || default_fetch_timeout(refresh_interval),
        |secs| Duration::from_secs(secs.max(1)),
    );

    if let Some(repo) = cfg.github.repo.as_deref() {
        validate_repo(repo)?;
    }

    let github = GithubSettings {
        api_url: api_url(
            "github.api_url",
            cfg.github.api_url.as_deref(),
            &defaults.github.api_url,
        )?,
        token: service_token(&cfg.github, &defaults.github.token_env, &lookup),
        token_env: token_env(&cfg.github, &defaults.github.token_env),
        repo: cfg.github.repo.clone(),
    };
    let vercel = VercelSettings {
        api_url: api_url(
            "vercel.api_url",
            cfg.vercel.api_url.as_deref(),
            &defaults.vercel.api_url,
        )?,
        token: service_token(&cfg.vercel, &defaults.vercel.token_env, &lookup),
        token_env: token_env(&cfg.vercel, &defaults.vercel.token_env),
        team_id: non_empty(cfg.vercel.team_id.as_deref()),
    };
    let netlify = NetlifySettings {
        api_url: api_url(
            "netlify.api_url",
            cfg.netlify.api_url.as_deref(),
            &defaults.netlify.api_url,
        )?,
        token: service_token(&cfg.netlify, &defaults.netlify.token_env, &lookup),
        token_env: token_env(&cfg.netlify, &defaults.netlify.token_env),
        site_id: non_empty(cfg.netlify.site_id.as_deref()),
    };

    if cfg.packet_scan.command.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation {
            field: "packet_scan.command".into(),
            reason: "must name a program".into(),
        });
    }

    Ok(DashboardConfig {
        refresh_interval,
        fetch_timeout,
        lines_per_source: cfg.lines_per_source.max(1),
        detail_lines: cfg.detail_lines.max(1),
        github,
        vercel,
        netlify,
        tools: ToolSettings {
            tool_a: cfg.tools.tool_a.clone(),
            tool_b: cfg.tools.tool_b.clone(),
        },
        packet_scan: PacketScanSettings {
            command: cfg.packet_scan.command.clone(),
            timeout: Duration::from_secs(cfg.packet_scan.timeout_secs.max(1)),
        },
        snapshot_dir: cfg.snapshot_dir.clone().unwrap_or(defaults.snapshot_dir),
    })
}

fn token_env(section: &ServiceSection, fallback: &str) -> String {
    section
        .token_env
        .clone()
        .unwrap_or_else(|| fallback.to_owned())
}

fn service_token(
    section: &ServiceSection,
    fallback_env: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    let env_name = token_env(section, fallback_env);
    resolve_token_with(Some(&env_name), section.token.as_deref(), lookup)
}

fn api_url(field: &str, configured: Option<&str>, default: &str) -> Result<String, ConfigError> {
    let Some(raw) = configured else {
        return Ok(default.to_owned());
    };
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected http(s) URL, got '{raw}'"),
        });
    }
    Ok(raw.to_owned())
}

fn validate_repo(repo: &str) -> Result<(), ConfigError> {
    let valid = matches!(
        repo.split('/').collect::<Vec<_>>().as_slice(),
        [owner, name] if !owner.is_empty() && !name.is_empty()
    );
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            field: "github.repo".into(),
            reason: format!("expected 'owner/name', got '{repo}'"),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn load(toml: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.refresh_interval_secs, 30);
        assert_eq!(cfg.lines_per_source, 6);
        assert_eq!(cfg.github.token_env.as_deref(), Some("GITHUB_TOKEN"));
        assert_eq!(cfg.packet_scan.command[0], "tcpdump");
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = load(
            r#"
            refresh_interval_secs = 4
            snapshot_dir = "/var/tmp/deck"

            [github]
            repo = "acme/web"
            token_env = "ACME_GH"

            [netlify]
            site_id = "abc"

            [tools]
            tool_a = "/usr/local/bin/wifi-scan"

            [packet_scan]
            command = ["tshark", "-c", "5"]
            timeout_secs = 3
            "#,
        );
        assert_eq!(cfg.refresh_interval_secs, 4);
        assert_eq!(cfg.github.repo.as_deref(), Some("acme/web"));
        // Sections given in the file still keep unrelated defaults.
        assert_eq!(cfg.vercel.token_env.as_deref(), Some("VERCEL_TOKEN"));

        let dash = to_dashboard_config_with(&cfg, env(&[])).unwrap();
        assert_eq!(dash.refresh_interval, Duration::from_secs(4));
        assert_eq!(dash.fetch_timeout, Duration::from_secs(2));
        assert_eq!(dash.github.token_env, "ACME_GH");
        assert_eq!(dash.netlify.site_id.as_deref(), Some("abc"));
        assert_eq!(dash.snapshot_dir, PathBuf::from("/var/tmp/deck"));
        assert_eq!(
            dash.tools.tool_a,
            Some(PathBuf::from("/usr/local/bin/wifi-scan"))
        );
        assert_eq!(dash.packet_scan.command, vec!["tshark", "-c", "5"]);
        assert_eq!(dash.packet_scan.timeout, Duration::from_secs(3));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_secs = \"soon\"").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn env_var_token_wins_over_plaintext() {
        let token = resolve_token_with(Some("GH"), Some("from-file"), env(&[("GH", "from-env")]));
        assert_eq!(token.unwrap().expose_secret(), "from-env");

        let token = resolve_token_with(Some("GH"), Some("from-file"), env(&[("GH", "  ")]));
        assert_eq!(token.unwrap().expose_secret(), "from-file");

        assert!(resolve_token_with(Some("GH"), Some(""), env(&[])).is_none());
        assert!(resolve_token_with(None, None, env(&[])).is_none());
    }

    #[test]
    fn no_credentials_anywhere() {
        let dash = to_dashboard_config_with(&Config::default(), env(&[])).unwrap();
        assert!(dash.github.token.is_none());
        assert!(dash.vercel.token.is_none());
        assert!(dash.netlify.token.is_none());
        assert_eq!(dash.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn default_token_env_names_are_consulted() {
        let dash = to_dashboard_config_with(
            &Config::default(),
            env(&[("VERCEL_TOKEN", "v"), ("NETLIFY_TOKEN", "n")]),
        )
        .unwrap();
        assert!(dash.github.token.is_none());
        assert_eq!(dash.vercel.token.unwrap().expose_secret(), "v");
        assert_eq!(dash.netlify.token.unwrap().expose_secret(), "n");
    }

    #[test]
    fn intervals_are_clamped() {
        let cfg = Config {
            refresh_interval_secs: 0,
            fetch_timeout_secs: Some(0),
            ..Config::default()
        };
        let dash = to_dashboard_config_with(&cfg, env(&[])).unwrap();
        assert_eq!(dash.refresh_interval, Duration::from_secs(1));
        assert_eq!(dash.fetch_timeout, Duration::from_secs(1));
    }

    #[test]
    fn bad_repo_is_rejected() {
        for repo in ["acme", "acme/", "/web", "a/b/c"] {
            let mut cfg = Config::default();
            cfg.github.repo = Some(repo.into());
            let err = to_dashboard_config_with(&cfg, env(&[])).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation { ref field, .. } if field == "github.repo"),
                "{repo}: {err}"
            );
        }
    }

    #[test]
    fn bad_api_url_is_rejected() {
        let mut cfg = Config::default();
        cfg.vercel.api_url = Some("not a url".into());
        let err = to_dashboard_config_with(&cfg, env(&[])).unwrap_err();
        assert_eq!(err.to_string(), "invalid vercel.api_url: invalid URL: not a url");

        cfg.vercel.api_url = Some("ftp://files.example.com".into());
        assert!(to_dashboard_config_with(&cfg, env(&[])).is_err());

        cfg.vercel.api_url = Some("http://127.0.0.1:9000".into());
        let dash = to_dashboard_config_with(&cfg, env(&[])).unwrap();
        assert_eq!(dash.vercel.api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn empty_scan_command_is_rejected() {
        let mut cfg = Config::default();
        cfg.packet_scan.command = vec![];
        assert!(to_dashboard_config_with(&cfg, env(&[])).is_err());
    }
}
