pub mod gh_cli;
pub mod slug;

pub use gh_cli::GhCli;
pub use slug::RepoSlug;

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ControlPlaneError {
    #[error(
        "GitHub CLI (`gh`) is required. Install it from https://cli.github.com/ and run `gh auth login`."
    )]
    GhUnavailable,
    #[error("GitHub CLI is not authenticated. Run `gh auth login` and re-run setup.")]
    NotAuthenticated,
    #[error("Unable to access repository '{repo}' with current gh auth context: {detail}")]
    RepoAccess { repo: String, detail: String },
    #[error("failed to launch gh: {0}")]
    Spawn(String),
    #[error("{0}")]
    Command(String),
    #[error("unexpected gh output: {0}")]
    ParseOutput(String),
}

/// Current repository Actions permission state as reported by the control
/// plane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionsPermissions {
    pub enabled: bool,
    pub allowed_actions: Option<String>,
}

/// A mutation request for Actions permissions. The broad request also pins
/// `allowed_actions`; the reduced request leaves it untouched for org
/// policies that reject the broad form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsRequest {
    pub enabled: bool,
    pub allowed_actions: Option<String>,
}

impl PermissionsRequest {
    pub fn broad() -> Self {
        Self {
            enabled: true,
            allowed_actions: Some("all".to_string()),
        }
    }

    pub fn reduced() -> Self {
        Self {
            enabled: true,
            allowed_actions: None,
        }
    }
}

/// Write strategy for the Pages configuration; the control plane exposes
/// both an update and a create call and neither is trusted without a
/// confirming re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagesWriteMethod {
    Update,
    Create,
}

/// Filter for the eventually-consistent run listing.
#[derive(Debug, Clone)]
pub struct RunFilter {
    pub workflow: String,
    pub event: String,
    pub limit: u32,
}

/// Identity of an asynchronously-triggered workflow run, discovered by
/// polling the run listing (dispatch acknowledges intent, not creation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub id: u64,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Abstract interface over the repository's secret storage, variable
/// storage, and workflow control. The production implementation shells out
/// to `gh`; tests substitute scripted fakes.
pub trait ControlPlane {
    fn set_secret(&self, name: &str, value: &str) -> Result<(), ControlPlaneError>;
    fn set_variable(&self, name: &str, value: &str) -> Result<(), ControlPlaneError>;
    fn actions_permissions(&self) -> Result<ActionsPermissions, ControlPlaneError>;
    fn put_actions_permissions(
        &self,
        request: &PermissionsRequest,
    ) -> Result<(), ControlPlaneError>;
    fn enable_workflow(&self, workflow: &str) -> Result<(), ControlPlaneError>;
    fn pages_build_type(&self) -> Result<Option<String>, ControlPlaneError>;
    fn put_pages_build_type(
        &self,
        method: PagesWriteMethod,
        build_type: &str,
    ) -> Result<(), ControlPlaneError>;
    fn dispatch_workflow(&self, workflow: &str) -> Result<(), ControlPlaneError>;
    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<WorkflowRun>, ControlPlaneError>;
    fn watch_run(&self, run_id: u64) -> Result<bool, ControlPlaneError>;
}
