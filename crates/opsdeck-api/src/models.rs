// Response shapes for the three services.
//
// Only the fields the dashboard renders are modelled; everything else in
// the payload is ignored by serde. Optional fields stay `Option` because
// every one of these APIs omits keys for in-progress or failed items.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ── GitHub Actions ──────────────────────────────────────────────────

/// `GET /repos/{owner}/{repo}/actions/runs`
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunsResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub display_title: Option<String>,
    pub head_branch: Option<String>,
    pub event: Option<String>,
    /// `queued`, `in_progress`, `completed`, ...
    pub status: Option<String>,
    /// `success`, `failure`, `cancelled`, ... (null until completed)
    pub conclusion: Option<String>,
    pub run_number: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
}

// ── Vercel ──────────────────────────────────────────────────────────

/// `GET /v6/deployments`
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentsResponse {
    #[serde(default)]
    pub deployments: Vec<VercelDeployment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelDeployment {
    pub uid: String,
    pub name: Option<String>,
    pub url: Option<String>,
    /// `BUILDING`, `ERROR`, `INITIALIZING`, `QUEUED`, `READY`, `CANCELED`
    pub state: Option<String>,
    /// Older payloads only carry `readyState`; newer ones carry both.
    pub ready_state: Option<String>,
    /// Milliseconds since the epoch.
    pub created: Option<i64>,
    /// `production` or null for previews.
    pub target: Option<String>,
    #[serde(default)]
    pub meta: VercelMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelMeta {
    pub github_commit_ref: Option<String>,
    pub github_commit_message: Option<String>,
}

impl VercelDeployment {
    pub fn status(&self) -> Option<&str> {
        self.state.as_deref().or(self.ready_state.as_deref())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

// ── Netlify ─────────────────────────────────────────────────────────

/// Element of `GET /api/v1/sites/{site_id}/deploys`
#[derive(Debug, Clone, Deserialize)]
pub struct NetlifyDeploy {
    pub id: String,
    pub name: Option<String>,
    /// `new`, `building`, `enqueued`, `ready`, `error`, ...
    pub state: Option<String>,
    pub branch: Option<String>,
    /// `production`, `deploy-preview`, `branch-deploy`
    pub context: Option<String>,
    pub title: Option<String>,
    pub error_message: Option<String>,
    /// Build duration in seconds.
    pub deploy_time: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Element of `GET /api/v1/sites`
#[derive(Debug, Clone, Deserialize)]
pub struct NetlifySite {
    pub id: String,
    pub name: Option<String>,
    pub url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_deploy: Option<PublishedDeploy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishedDeploy {
    pub state: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn vercel_ready_state_fallback() {
        let dep: VercelDeployment = serde_json::from_str(
            r#"{"uid":"dpl_1","name":"web","readyState":"READY","created":1700000000000}"#,
        )
        .unwrap();
        assert!(dep.state.is_none());
        assert_eq!(dep.status(), Some("READY"));
        assert!(dep.meta.github_commit_ref.is_none());
        assert_eq!(dep.created_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn vercel_state_and_ready_state_together() {
        let dep: VercelDeployment = serde_json::from_str(
            r#"{"uid":"dpl_2","state":"ERROR","readyState":"ERROR","target":"production"}"#,
        )
        .unwrap();
        assert_eq!(dep.status(), Some("ERROR"));
        assert_eq!(dep.target.as_deref(), Some("production"));
    }

    #[test]
    fn workflow_run_tolerates_missing_conclusion() {
        let run: WorkflowRun = serde_json::from_str(
            r#"{"id":7,"name":"CI","status":"in_progress","conclusion":null}"#,
        )
        .unwrap();
        assert_eq!(run.status.as_deref(), Some("in_progress"));
        assert!(run.conclusion.is_none());
        assert!(run.created_at.is_none());
    }
}
