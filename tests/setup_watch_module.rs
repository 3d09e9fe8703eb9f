use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;
use strava_setup::github::{
    ActionsPermissions, ControlPlane, ControlPlaneError, PagesWriteMethod, PermissionsRequest,
    RunFilter, WorkflowRun,
};
use strava_setup::setup::{find_latest_run, watch_run, PollPlan};

/// Control plane whose run listing returns a scripted page per poll. Only
/// the listing and watch calls are expected to be reached.
#[derive(Default)]
struct ListingPlane {
    pages: RefCell<VecDeque<Vec<WorkflowRun>>>,
    list_calls: RefCell<u32>,
    watch_result: Option<bool>,
}

impl ControlPlane for ListingPlane {
    fn set_secret(&self, _name: &str, _value: &str) -> Result<(), ControlPlaneError> {
        unreachable!("set_secret is not part of run discovery")
    }

    fn set_variable(&self, _name: &str, _value: &str) -> Result<(), ControlPlaneError> {
        unreachable!("set_variable is not part of run discovery")
    }

    fn actions_permissions(&self) -> Result<ActionsPermissions, ControlPlaneError> {
        unreachable!("actions_permissions is not part of run discovery")
    }

    fn put_actions_permissions(
        &self,
        _request: &PermissionsRequest,
    ) -> Result<(), ControlPlaneError> {
        unreachable!("put_actions_permissions is not part of run discovery")
    }

    fn enable_workflow(&self, _workflow: &str) -> Result<(), ControlPlaneError> {
        unreachable!("enable_workflow is not part of run discovery")
    }

    fn pages_build_type(&self) -> Result<Option<String>, ControlPlaneError> {
        unreachable!("pages_build_type is not part of run discovery")
    }

    fn put_pages_build_type(
        &self,
        _method: PagesWriteMethod,
        _build_type: &str,
    ) -> Result<(), ControlPlaneError> {
        unreachable!("put_pages_build_type is not part of run discovery")
    }

    fn dispatch_workflow(&self, _workflow: &str) -> Result<(), ControlPlaneError> {
        unreachable!("dispatch_workflow is not part of run discovery")
    }

    fn list_runs(&self, _filter: &RunFilter) -> Result<Vec<WorkflowRun>, ControlPlaneError> {
        *self.list_calls.borrow_mut() += 1;
        Ok(self.pages.borrow_mut().pop_front().unwrap_or_default())
    }

    fn watch_run(&self, _run_id: u64) -> Result<bool, ControlPlaneError> {
        match self.watch_result {
            Some(result) => Ok(result),
            None => Err(ControlPlaneError::Command("watch failed".to_string())),
        }
    }
}

fn run_at(id: u64, offset_seconds: i64) -> WorkflowRun {
    WorkflowRun {
        id,
        url: None,
        created_at: Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
            + ChronoDuration::seconds(offset_seconds),
    }
}

fn sync_filter() -> RunFilter {
    RunFilter {
        workflow: "sync.yml".to_string(),
        event: "workflow_dispatch".to_string(),
        limit: 10,
    }
}

fn instant_plan(attempts: u32) -> PollPlan {
    PollPlan {
        attempts,
        interval: Duration::ZERO,
    }
}

#[test]
fn discovery_keeps_polling_until_a_run_appears() {
    let plane = ListingPlane {
        pages: RefCell::new(VecDeque::from([
            vec![],
            vec![],
            vec![run_at(42, 30)],
        ])),
        ..ListingPlane::default()
    };
    let not_before = run_at(0, 0).created_at;

    let found = find_latest_run(&plane, &sync_filter(), not_before, instant_plan(5));
    assert_eq!(found.map(|run| run.id), Some(42));
    assert_eq!(*plane.list_calls.borrow(), 3);
}

#[test]
fn runs_created_before_the_cutoff_are_ignored() {
    let plane = ListingPlane {
        pages: RefCell::new(VecDeque::from([vec![run_at(7, -300), run_at(8, 10)]])),
        ..ListingPlane::default()
    };
    let not_before = run_at(0, 0).created_at;

    let found = find_latest_run(&plane, &sync_filter(), not_before, instant_plan(1));
    assert_eq!(found.map(|run| run.id), Some(8));
}

#[test]
fn a_run_created_exactly_at_the_cutoff_counts() {
    let plane = ListingPlane {
        pages: RefCell::new(VecDeque::from([vec![run_at(9, 0)]])),
        ..ListingPlane::default()
    };
    let not_before = run_at(0, 0).created_at;

    let found = find_latest_run(&plane, &sync_filter(), not_before, instant_plan(1));
    assert_eq!(found.map(|run| run.id), Some(9));
}

#[test]
fn exhausted_attempts_yield_none_after_the_full_budget() {
    let plane = ListingPlane::default();
    let not_before = run_at(0, 0).created_at;

    let found = find_latest_run(&plane, &sync_filter(), not_before, instant_plan(4));
    assert!(found.is_none());
    assert_eq!(*plane.list_calls.borrow(), 4);
}

#[test]
fn watch_reports_success_only_on_an_explicit_success_signal() {
    let plane = ListingPlane {
        watch_result: Some(true),
        ..ListingPlane::default()
    };
    let (watched, detail) = watch_run(&plane, 42);
    assert!(watched);
    assert_eq!(detail, "Workflow run completed (see output above).");
}

#[test]
fn watch_treats_failure_and_errors_alike() {
    let failed = ListingPlane {
        watch_result: Some(false),
        ..ListingPlane::default()
    };
    let (watched, detail) = watch_run(&failed, 42);
    assert!(!watched);
    assert_eq!(detail, "Could not watch the workflow run automatically.");

    let errored = ListingPlane::default();
    let (watched, _) = watch_run(&errored, 42);
    assert!(!watched);
}

#[test]
fn default_poll_budgets_cover_the_expected_windows() {
    let dispatch = PollPlan::dispatch_discovery();
    assert_eq!(dispatch.attempts, 12);
    assert_eq!(dispatch.interval, Duration::from_secs(2));

    let downstream = PollPlan::downstream_discovery();
    assert_eq!(downstream.attempts, 45);
    assert_eq!(downstream.interval, Duration::from_secs(2));
}
