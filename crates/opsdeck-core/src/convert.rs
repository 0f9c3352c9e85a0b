// ── Response → display line conversion ──
//
// Each service payload is mapped to short, fixed-shape lines here so the
// adapters stay thin and the mapping is testable without a network.
// Every function takes `now` explicitly; ages are relative to it.

use chrono::{DateTime, Utc};

use opsdeck_api::models::{NetlifyDeploy, NetlifySite, VercelDeployment, WorkflowRun};

use crate::fmt::fmt_age_opt;
use crate::sources::Depth;

/// Status glyph shared by every source.
///
/// ● healthy, ○ failed, ◐ in progress, ◉ stopped/skipped, ? unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Good,
    Bad,
    Busy,
    Stopped,
    Unknown,
}

impl Health {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Good => "●",
            Self::Bad => "○",
            Self::Busy => "◐",
            Self::Stopped => "◉",
            Self::Unknown => "?",
        }
    }

    /// Health of a converted line, read from its leading glyph.
    pub fn of_line(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        [Self::Good, Self::Bad, Self::Busy, Self::Stopped, Self::Unknown]
            .into_iter()
            .find(|h| trimmed.starts_with(&format!("{} ", h.glyph())))
    }
}

// ── GitHub Actions ──────────────────────────────────────────────────

pub fn run_health(run: &WorkflowRun) -> Health {
    match run.status.as_deref() {
        Some("completed") => match run.conclusion.as_deref() {
            Some("success") => Health::Good,
            Some("failure" | "timed_out" | "startup_failure" | "action_required") => Health::Bad,
            Some("cancelled" | "skipped" | "neutral" | "stale") => Health::Stopped,
            _ => Health::Unknown,
        },
        Some("queued" | "in_progress" | "waiting" | "requested" | "pending") => Health::Busy,
        _ => Health::Unknown,
    }
}

pub fn workflow_run_lines(runs: &[WorkflowRun], depth: Depth, now: DateTime<Utc>) -> Vec<String> {
    if runs.is_empty() {
        return vec!["no workflow runs yet".into()];
    }
    runs.iter()
        .map(|run| {
            let name = run.name.as_deref().unwrap_or("workflow");
            let branch = run.head_branch.as_deref().unwrap_or("-");
            let number = run
                .run_number
                .map_or_else(|| "-".to_owned(), |n| format!("#{n}"));
            let age = fmt_age_opt(now, run.created_at);
            let mut line = format!(
                "{} {name} · {branch} · {number} · {age}",
                run_health(run).glyph()
            );
            if depth == Depth::Full {
                let state = run
                    .conclusion
                    .as_deref()
                    .or(run.status.as_deref())
                    .unwrap_or("unknown");
                line.push_str(&format!(" · {state}"));
                if let Some(event) = run.event.as_deref() {
                    line.push_str(&format!(" · {event}"));
                }
                if let Some(title) = run.display_title.as_deref() {
                    line.push_str(&format!(" · {title}"));
                }
            }
            line
        })
        .collect()
}

// ── Vercel ──────────────────────────────────────────────────────────

pub fn vercel_health(state: Option<&str>) -> Health {
    match state {
        Some("READY") => Health::Good,
        Some("ERROR") => Health::Bad,
        Some("BUILDING" | "INITIALIZING" | "QUEUED") => Health::Busy,
        Some("CANCELED") => Health::Stopped,
        _ => Health::Unknown,
    }
}

pub fn deployment_lines(
    deployments: &[VercelDeployment],
    depth: Depth,
    now: DateTime<Utc>,
) -> Vec<String> {
    if deployments.is_empty() {
        return vec!["no deployments".into()];
    }
    deployments
        .iter()
        .map(|dep| {
            let state = dep.status();
            let name = dep.name.as_deref().unwrap_or(&dep.uid);
            let git_ref = dep.meta.github_commit_ref.as_deref().unwrap_or("-");
            let target = if dep.target.as_deref() == Some("production") {
                "prod"
            } else {
                "preview"
            };
            let mut line = format!(
                "{} {name} · {} · {git_ref} · {target} · {}",
                vercel_health(state).glyph(),
                state.unwrap_or("UNKNOWN"),
                fmt_age_opt(now, dep.created_at()),
            );
            if depth == Depth::Full {
                if let Some(url) = dep.url.as_deref() {
                    line.push_str(&format!(" · {url}"));
                }
                if let Some(msg) = dep.meta.github_commit_message.as_deref() {
                    let first = msg.lines().next().unwrap_or_default();
                    line.push_str(&format!(" · {first}"));
                }
            }
            line
        })
        .collect()
}

// ── Netlify ─────────────────────────────────────────────────────────

pub fn netlify_health(state: Option<&str>) -> Health {
    match state {
        Some("ready") => Health::Good,
        Some("error" | "rejected") => Health::Bad,
        Some("new" | "pending_review" | "enqueued" | "building" | "uploading" | "uploaded"
        | "preparing" | "prepared" | "processing" | "processed") => Health::Busy,
        Some("skipped" | "cancelled") => Health::Stopped,
        _ => Health::Unknown,
    }
}

pub fn netlify_deploy_lines(
    deploys: &[NetlifyDeploy],
    depth: Depth,
    now: DateTime<Utc>,
) -> Vec<String> {
    if deploys.is_empty() {
        return vec!["no deploys".into()];
    }
    let mut lines = Vec::with_capacity(deploys.len());
    for deploy in deploys {
        let state = deploy.state.as_deref();
        let build = deploy
            .deploy_time
            .map_or_else(String::new, |secs| format!(" · {secs}s build"));
        lines.push(format!(
            "{} {} · {} · {}{build} · {}",
            netlify_health(state).glyph(),
            deploy.branch.as_deref().unwrap_or("-"),
            state.unwrap_or("unknown"),
            deploy.context.as_deref().unwrap_or("-"),
            fmt_age_opt(now, deploy.created_at),
        ));
        if depth == Depth::Full {
            if let Some(title) = deploy.title.as_deref() {
                lines.push(format!("    {title}"));
            }
            if let Some(err) = deploy.error_message.as_deref() {
                lines.push(format!("    error: {err}"));
            }
        }
    }
    lines
}

pub fn netlify_site_lines(sites: &[NetlifySite], depth: Depth, now: DateTime<Utc>) -> Vec<String> {
    if sites.is_empty() {
        return vec!["no sites".into()];
    }
    sites
        .iter()
        .map(|site| {
            let published = site.published_deploy.as_ref();
            let state = published.and_then(|p| p.state.as_deref());
            let when = published
                .and_then(|p| p.published_at)
                .or(site.updated_at);
            let mut line = format!(
                "{} {} · {} · {}",
                netlify_health(state).glyph(),
                site.name.as_deref().unwrap_or(&site.id),
                state.unwrap_or("never published"),
                fmt_age_opt(now, when),
            );
            if depth == Depth::Full {
                if let Some(url) = site.url.as_deref() {
                    line.push_str(&format!(" · {url}"));
                }
            }
            line
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn run(status: &str, conclusion: Option<&str>) -> WorkflowRun {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "CI",
            "head_branch": "main",
            "status": status,
            "conclusion": conclusion,
            "run_number": 42,
            "event": "push",
            "display_title": "Bump deps",
            "created_at": "2026-10-16T11:55:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn run_health_from_status_and_conclusion() {
        assert_eq!(run_health(&run("completed", Some("success"))), Health::Good);
        assert_eq!(run_health(&run("completed", Some("failure"))), Health::Bad);
        assert_eq!(run_health(&run("completed", Some("cancelled"))), Health::Stopped);
        assert_eq!(run_health(&run("in_progress", None)), Health::Busy);
        assert_eq!(run_health(&run("mystery", None)), Health::Unknown);
    }

    #[test]
    fn health_is_read_back_from_the_glyph() {
        assert_eq!(Health::of_line("● CI · main"), Some(Health::Good));
        assert_eq!(Health::of_line("  ○ site · 2m ago"), Some(Health::Bad));
        assert_eq!(Health::of_line("? preview"), Some(Health::Unknown));
        assert_eq!(Health::of_line("Failed to build"), None);
        assert_eq!(Health::of_line("?x"), None);
    }

    #[test]
    fn workflow_run_summary_line() {
        let lines = workflow_run_lines(&[run("completed", Some("success"))], Depth::Summary, now());
        assert_eq!(lines, vec!["● CI · main · #42 · 5m ago"]);
    }

    #[test]
    fn workflow_run_full_line_adds_context() {
        let lines = workflow_run_lines(&[run("completed", Some("failure"))], Depth::Full, now());
        assert_eq!(
            lines,
            vec!["○ CI · main · #42 · 5m ago · failure · push · Bump deps"]
        );
    }

    #[test]
    fn empty_payloads_have_explicit_lines() {
        assert_eq!(workflow_run_lines(&[], Depth::Summary, now()), vec!["no workflow runs yet"]);
        assert_eq!(deployment_lines(&[], Depth::Summary, now()), vec!["no deployments"]);
        assert_eq!(netlify_deploy_lines(&[], Depth::Summary, now()), vec!["no deploys"]);
        assert_eq!(netlify_site_lines(&[], Depth::Summary, now()), vec!["no sites"]);
    }

    #[test]
    fn vercel_deployment_line() {
        let dep: VercelDeployment = serde_json::from_value(serde_json::json!({
            "uid": "dpl_1",
            "name": "storefront",
            "state": "READY",
            "created": now().timestamp_millis() - 3 * 3_600_000,
            "target": "production",
            "url": "storefront-abc.vercel.app",
            "meta": { "githubCommitRef": "main", "githubCommitMessage": "Ship it\n\nlong body" }
        }))
        .unwrap();

        assert_eq!(
            deployment_lines(std::slice::from_ref(&dep), Depth::Summary, now()),
            vec!["● storefront · READY · main · prod · 3h ago"]
        );
        assert_eq!(
            deployment_lines(&[dep], Depth::Full, now()),
            vec![
                "● storefront · READY · main · prod · 3h ago · storefront-abc.vercel.app · Ship it"
            ]
        );
    }

    #[test]
    fn netlify_deploy_full_view_shows_error() {
        let deploy: NetlifyDeploy = serde_json::from_value(serde_json::json!({
            "id": "d2",
            "state": "error",
            "branch": "feat/x",
            "context": "deploy-preview",
            "error_message": "exit code 2",
            "created_at": "2026-10-14T12:00:00Z"
        }))
        .unwrap();

        let lines = netlify_deploy_lines(&[deploy], Depth::Full, now());
        assert_eq!(
            lines,
            vec!["○ feat/x · error · deploy-preview · 2d ago", "    error: exit code 2"]
        );
    }

    #[test]
    fn netlify_site_without_published_deploy() {
        let site: NetlifySite = serde_json::from_value(serde_json::json!({
            "id": "s2",
            "name": "blog",
            "published_deploy": null
        }))
        .unwrap();
        assert_eq!(
            netlify_site_lines(&[site], Depth::Summary, now()),
            vec!["? blog · never published · -"]
        );
    }
}
