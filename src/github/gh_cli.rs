use crate::github::{
    ActionsPermissions, ControlPlane, ControlPlaneError, PagesWriteMethod, PermissionsRequest,
    RepoSlug, RunFilter, WorkflowRun,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Control plane backed by the `gh` CLI. Every call is a single synchronous
/// subprocess invocation; error detail is the first stderr line.
#[derive(Debug, Clone)]
pub struct GhCli {
    repo: String,
}

impl GhCli {
    pub fn new(repo: &RepoSlug) -> Self {
        Self {
            repo: repo.as_slug(),
        }
    }

    /// Verifies `gh` is installed and authenticated. Both conditions are
    /// fatal to the run; nothing downstream works without them.
    pub fn preflight() -> Result<(), ControlPlaneError> {
        let status = run_gh(&["auth", "status"], None)?;
        if !status.status.success() {
            return Err(ControlPlaneError::NotAuthenticated);
        }
        Ok(())
    }

    /// Confirms the authenticated context can see the target repository.
    pub fn assert_repo_access(repo: &RepoSlug) -> Result<(), ControlPlaneError> {
        let output = run_gh(
            &["repo", "view", &repo.as_slug(), "--json", "nameWithOwner"],
            None,
        )?;
        if !output.status.success() {
            return Err(ControlPlaneError::RepoAccess {
                repo: repo.as_slug(),
                detail: first_stderr_line(&output),
            });
        }
        Ok(())
    }

    /// Repository slug from the current `gh` context, if any.
    pub fn context_repo_slug() -> Option<RepoSlug> {
        let output = run_gh(
            &[
                "repo",
                "view",
                "--json",
                "nameWithOwner",
                "--jq",
                ".nameWithOwner",
            ],
            None,
        )
        .ok()?;
        if !output.status.success() {
            return None;
        }
        RepoSlug::parse(String::from_utf8_lossy(&output.stdout).trim())
    }

    /// Repository slug from the local git remote, if any.
    pub fn git_remote_repo_slug() -> Option<RepoSlug> {
        let output = Command::new("git")
            .args(["config", "--get", "remote.origin.url"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        RepoSlug::parse(String::from_utf8_lossy(&output.stdout).trim())
    }

    fn api_path(&self, suffix: &str) -> String {
        format!("repos/{}/{suffix}", self.repo)
    }

    fn checked(&self, args: &[&str], stdin: Option<&str>) -> Result<Output, ControlPlaneError> {
        let output = run_gh(args, stdin)?;
        if !output.status.success() {
            return Err(ControlPlaneError::Command(first_stderr_line(&output)));
        }
        Ok(output)
    }
}

impl ControlPlane for GhCli {
    fn set_secret(&self, name: &str, value: &str) -> Result<(), ControlPlaneError> {
        self.checked(&["secret", "set", name, "--repo", &self.repo], Some(value))
            .map_err(|err| match err {
                ControlPlaneError::Command(detail) => ControlPlaneError::Command(format!(
                    "Failed to set GitHub secret {name}: {detail}"
                )),
                other => other,
            })?;
        Ok(())
    }

    fn set_variable(&self, name: &str, value: &str) -> Result<(), ControlPlaneError> {
        self.checked(
            &[
                "variable", "set", name, "--repo", &self.repo, "--body", value,
            ],
            None,
        )
        .map_err(|err| match err {
            ControlPlaneError::Command(detail) => ControlPlaneError::Command(format!(
                "Failed to set GitHub variable {name}: {detail}"
            )),
            other => other,
        })?;
        Ok(())
    }

    fn actions_permissions(&self) -> Result<ActionsPermissions, ControlPlaneError> {
        let path = self.api_path("actions/permissions");
        let output = self.checked(&["api", &path], None)?;
        let payload: PermissionsPayload = serde_json::from_slice(&output.stdout)
            .map_err(|err| ControlPlaneError::ParseOutput(err.to_string()))?;
        Ok(ActionsPermissions {
            enabled: payload.enabled.unwrap_or(false),
            allowed_actions: payload.allowed_actions,
        })
    }

    fn put_actions_permissions(
        &self,
        request: &PermissionsRequest,
    ) -> Result<(), ControlPlaneError> {
        let path = self.api_path("actions/permissions");
        let enabled = format!("enabled={}", request.enabled);
        let mut args = vec!["api", "-X", "PUT", path.as_str(), "-F", enabled.as_str()];
        let allowed;
        if let Some(value) = &request.allowed_actions {
            allowed = format!("allowed_actions={value}");
            args.push("-f");
            args.push(allowed.as_str());
        }
        self.checked(&args, None)?;
        Ok(())
    }

    fn enable_workflow(&self, workflow: &str) -> Result<(), ControlPlaneError> {
        self.checked(&["workflow", "enable", workflow, "--repo", &self.repo], None)?;
        Ok(())
    }

    fn pages_build_type(&self) -> Result<Option<String>, ControlPlaneError> {
        let path = self.api_path("pages");
        let output = run_gh(&["api", &path, "--jq", ".build_type"], None)?;
        if !output.status.success() {
            // Pages not configured yet reads as a 404 from the API.
            return Ok(None);
        }
        let value = String::from_utf8_lossy(&output.stdout)
            .trim()
            .to_lowercase();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    fn put_pages_build_type(
        &self,
        method: PagesWriteMethod,
        build_type: &str,
    ) -> Result<(), ControlPlaneError> {
        let path = self.api_path("pages");
        let verb = match method {
            PagesWriteMethod::Update => "PUT",
            PagesWriteMethod::Create => "POST",
        };
        let field = format!("build_type={build_type}");
        self.checked(&["api", "-X", verb, &path, "-f", &field], None)?;
        Ok(())
    }

    fn dispatch_workflow(&self, workflow: &str) -> Result<(), ControlPlaneError> {
        self.checked(&["workflow", "run", workflow, "--repo", &self.repo], None)?;
        Ok(())
    }

    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<WorkflowRun>, ControlPlaneError> {
        let limit = filter.limit.to_string();
        let output = self.checked(
            &[
                "run",
                "list",
                "--repo",
                &self.repo,
                "--workflow",
                &filter.workflow,
                "--event",
                &filter.event,
                "--limit",
                &limit,
                "--json",
                "databaseId,url,createdAt",
            ],
            None,
        )?;
        let rows: Vec<RunRow> = serde_json::from_slice(&output.stdout)
            .map_err(|err| ControlPlaneError::ParseOutput(err.to_string()))?;
        Ok(rows.into_iter().filter_map(RunRow::into_run).collect())
    }

    fn watch_run(&self, run_id: u64) -> Result<bool, ControlPlaneError> {
        // Inherits stdio so the user sees gh's live progress view.
        let status = Command::new("gh")
            .args(["run", "watch", &run_id.to_string(), "--repo", &self.repo])
            .status()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    ControlPlaneError::GhUnavailable
                } else {
                    ControlPlaneError::Spawn(err.to_string())
                }
            })?;
        Ok(status.success())
    }
}

#[derive(Debug, Deserialize)]
struct PermissionsPayload {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    allowed_actions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunRow {
    #[serde(default, rename = "databaseId")]
    database_id: Option<u64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "createdAt")]
    created_at: String,
}

impl RunRow {
    fn into_run(self) -> Option<WorkflowRun> {
        let id = self.database_id?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .ok()?
            .with_timezone(&Utc);
        Some(WorkflowRun {
            id,
            url: self.url,
            created_at,
        })
    }
}

fn run_gh(args: &[&str], stdin: Option<&str>) -> Result<Output, ControlPlaneError> {
    let mut command = Command::new("gh");
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ControlPlaneError::GhUnavailable)
        }
        Err(err) => return Err(ControlPlaneError::Spawn(err.to_string())),
    };

    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(input.as_bytes())
                .map_err(|err| ControlPlaneError::Spawn(err.to_string()))?;
        }
    }

    child
        .wait_with_output()
        .map_err(|err| ControlPlaneError::Spawn(err.to_string()))
}

fn first_stderr_line(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = stderr.trim();
    if text.is_empty() {
        return "Unknown error.".to_string();
    }
    text.lines().next().unwrap_or("Unknown error.").to_string()
}
