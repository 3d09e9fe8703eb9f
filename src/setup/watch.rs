use crate::github::{ControlPlane, RunFilter, WorkflowRun};
use chrono::{DateTime, Utc};
use std::thread;
use std::time::Duration;

/// Bounded fixed-interval poll budget for run discovery. The listing is
/// eventually consistent, so absence within the budget is "not found", never
/// proof the run does not exist.
#[derive(Debug, Clone, Copy)]
pub struct PollPlan {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPlan {
    pub fn dispatch_discovery() -> Self {
        Self {
            attempts: 12,
            interval: Duration::from_secs(2),
        }
    }

    /// The dependent deploy run is triggered by the first run's completion
    /// event and may lag well behind it.
    pub fn downstream_discovery() -> Self {
        Self {
            attempts: 45,
            interval: Duration::from_secs(2),
        }
    }
}

/// Polls the run listing for the first run matching the filter that was
/// created at or after `not_before`.
pub fn find_latest_run(
    control_plane: &dyn ControlPlane,
    filter: &RunFilter,
    not_before: DateTime<Utc>,
    plan: PollPlan,
) -> Option<WorkflowRun> {
    for attempt in 0..plan.attempts {
        if let Ok(runs) = control_plane.list_runs(filter) {
            if let Some(run) = runs.into_iter().find(|run| run.created_at >= not_before) {
                return Some(run);
            }
        }
        if attempt + 1 < plan.attempts {
            thread::sleep(plan.interval);
        }
    }
    None
}

/// Blocks on a discovered run until the control plane reports a terminal
/// state. Success is never inferred from silence: only an explicit success
/// signal counts.
pub fn watch_run(control_plane: &dyn ControlPlane, run_id: u64) -> (bool, String) {
    println!("\nWatching workflow run {run_id}...");
    match control_plane.watch_run(run_id) {
        Ok(true) => (true, "Workflow run completed (see output above).".to_string()),
        Ok(false) | Err(_) => (
            false,
            "Could not watch the workflow run automatically.".to_string(),
        ),
    }
}
