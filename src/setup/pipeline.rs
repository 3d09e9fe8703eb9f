use crate::github::{
    ActionsPermissions, ControlPlane, PagesWriteMethod, PermissionsRequest, RepoSlug, RunFilter,
};
use crate::setup::report::StepReport;
use crate::setup::watch::{find_latest_run, watch_run, PollPlan};
use crate::shared::errors::SetupError;
use chrono::Utc;

pub const SYNC_WORKFLOW: &str = "sync.yml";
pub const PAGES_WORKFLOW: &str = "pages.yml";

pub const SECRET_CLIENT_ID: &str = "STRAVA_CLIENT_ID";
pub const SECRET_CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
pub const SECRET_REFRESH_TOKEN: &str = "STRAVA_REFRESH_TOKEN";
pub const VAR_DISTANCE_UNIT: &str = "DASHBOARD_DISTANCE_UNIT";
pub const VAR_ELEVATION_UNIT: &str = "DASHBOARD_ELEVATION_UNIT";

pub struct PipelineInputs<'a> {
    pub control_plane: &'a dyn ControlPlane,
    pub repo: &'a RepoSlug,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub auto_github: bool,
    pub watch: bool,
    pub distance_unit: String,
    pub elevation_unit: String,
    pub dispatch_discovery: PollPlan,
    pub downstream_discovery: PollPlan,
}

impl PipelineOptions {
    pub fn new(distance_unit: &str, elevation_unit: &str) -> Self {
        Self {
            auto_github: true,
            watch: true,
            distance_unit: distance_unit.to_string(),
            elevation_unit: elevation_unit.to_string(),
            dispatch_discovery: PollPlan::dispatch_discovery(),
            downstream_discovery: PollPlan::downstream_discovery(),
        }
    }
}

/// Executes the fixed configuration pipeline. Credential persistence is the
/// only fatal stage; every later stage degrades to a report entry and the
/// pipeline keeps going. Returns one StepReport per stage, in order.
pub fn run_pipeline(
    inputs: &PipelineInputs<'_>,
    options: &PipelineOptions,
) -> Result<Vec<StepReport>, SetupError> {
    let mut reports = Vec::new();

    persist_credentials(inputs, &mut reports)?;
    persist_unit_preferences(inputs, options, &mut reports);

    if options.auto_github {
        run_github_automation(inputs, options, &mut reports);
    } else {
        skip_github_automation(inputs.repo, &mut reports);
    }

    Ok(reports)
}

/// Stage 1. Downstream automation is meaningless without the secrets, so
/// any failure here aborts the whole run instead of degrading.
fn persist_credentials(
    inputs: &PipelineInputs<'_>,
    reports: &mut Vec<StepReport>,
) -> Result<(), SetupError> {
    println!("\nUpdating repository secrets via gh...");
    for (name, value) in [
        (SECRET_CLIENT_ID, inputs.client_id),
        (SECRET_CLIENT_SECRET, inputs.client_secret),
        (SECRET_REFRESH_TOKEN, inputs.refresh_token),
    ] {
        inputs.control_plane.set_secret(name, value)?;
    }
    reports.push(StepReport::succeeded(
        "Persist credentials",
        format!(
            "Secrets set: {SECRET_CLIENT_ID}, {SECRET_CLIENT_SECRET}, {SECRET_REFRESH_TOKEN}."
        ),
    ));
    Ok(())
}

/// Stage 2. Failures carry the exact values the user must set by hand.
fn persist_unit_preferences(
    inputs: &PipelineInputs<'_>,
    options: &PipelineOptions,
    reports: &mut Vec<StepReport>,
) {
    println!("Updating repository unit variables via gh...");
    let mut errors = Vec::new();
    for (name, value) in [
        (VAR_DISTANCE_UNIT, options.distance_unit.as_str()),
        (VAR_ELEVATION_UNIT, options.elevation_unit.as_str()),
    ] {
        if let Err(err) = inputs.control_plane.set_variable(name, value) {
            errors.push(err.to_string());
        }
    }

    if let Some(first) = errors.first() {
        reports.push(StepReport::manual(
            "Store unit preferences",
            format!("Could not store one or more unit variables automatically: {first}"),
            format!(
                "Open {} and set {VAR_DISTANCE_UNIT}={} and {VAR_ELEVATION_UNIT}={}.",
                inputs.repo.variables_settings_url(),
                options.distance_unit,
                options.elevation_unit
            ),
        ));
    } else {
        reports.push(StepReport::succeeded(
            "Store unit preferences",
            format!(
                "Saved {VAR_DISTANCE_UNIT}={} and {VAR_ELEVATION_UNIT}={}.",
                options.distance_unit, options.elevation_unit
            ),
        ));
    }
}

fn run_github_automation(
    inputs: &PipelineInputs<'_>,
    options: &PipelineOptions,
    reports: &mut Vec<StepReport>,
) {
    let control_plane = inputs.control_plane;
    let repo = inputs.repo;
    let workflow_url = repo.workflow_url(SYNC_WORKFLOW);
    let pages_workflow_url = repo.workflow_url(PAGES_WORKFLOW);

    // Stage 3: Actions permissions.
    let (enabled, detail) = try_enable_actions_permissions(control_plane);
    reports.push(if enabled {
        StepReport::succeeded("Actions permissions", detail)
    } else {
        StepReport::manual(
            "Actions permissions",
            format!("Could not configure automatically: {detail}"),
            format!(
                "Open {} and allow Actions/workflows.",
                repo.actions_settings_url()
            ),
        )
    });

    // Stage 4: enable the two workflow definitions.
    let (workflows_enabled, workflow_detail) =
        try_enable_workflows(control_plane, &[SYNC_WORKFLOW, PAGES_WORKFLOW]);
    reports.push(if workflows_enabled {
        StepReport::succeeded("Enable workflows", workflow_detail)
    } else {
        StepReport::manual(
            "Enable workflows",
            format!("Could not enable automatically: {workflow_detail}"),
            format!(
                "Open {} and click 'Enable workflows' if shown.",
                repo.actions_url()
            ),
        )
    });

    // Stage 5: Pages build type.
    let (pages_configured, pages_detail) = try_configure_pages(control_plane);
    reports.push(if pages_configured {
        StepReport::succeeded("GitHub Pages source", pages_detail)
    } else {
        StepReport::manual(
            "GitHub Pages source",
            format!("Could not configure automatically: {pages_detail}"),
            format!(
                "Open {} and set Source to 'GitHub Actions'.",
                repo.pages_settings_url()
            ),
        )
    });

    // Stage 6: dispatch the first sync. The dispatch acknowledges intent
    // only; the run itself is discovered by polling afterwards.
    let dispatch_started_at = Utc::now();
    let dispatched = match control_plane.dispatch_workflow(SYNC_WORKFLOW) {
        Ok(()) => {
            reports.push(StepReport::succeeded(
                "Run first sync workflow",
                format!("Dispatched {SYNC_WORKFLOW} via workflow_dispatch."),
            ));
            true
        }
        Err(err) => {
            reports.push(StepReport::manual(
                "Run first sync workflow",
                format!("Could not dispatch automatically: {err}"),
                format!("Open {workflow_url} and click 'Run workflow'."),
            ));
            false
        }
    };

    if !dispatched {
        let detail = "Skipped because the sync workflow was not dispatched.";
        reports.push(StepReport::skipped(
            "Locate run URL",
            detail,
            Some(workflow_url.clone()),
        ));
        reports.push(StepReport::skipped(
            "Watch workflow run",
            detail,
            Some(workflow_url),
        ));
        reports.push(StepReport::skipped(
            "Locate Pages deploy run",
            detail,
            Some(pages_workflow_url.clone()),
        ));
        reports.push(StepReport::skipped(
            "Watch Pages deploy",
            detail,
            Some(pages_workflow_url),
        ));
        return;
    }

    // Stage 7: discover the dispatched run.
    let sync_run = find_latest_run(
        control_plane,
        &RunFilter {
            workflow: SYNC_WORKFLOW.to_string(),
            event: "workflow_dispatch".to_string(),
            limit: 10,
        },
        dispatch_started_at,
        options.dispatch_discovery,
    );
    match &sync_run {
        Some(run) => {
            let location = run
                .url
                .clone()
                .unwrap_or_else(|| format!("run id {}", run.id));
            reports.push(StepReport::succeeded(
                "Locate run URL",
                format!("Workflow run URL: {location}"),
            ));
        }
        None => reports.push(StepReport::manual(
            "Locate run URL",
            "Dispatched workflow but could not resolve run URL automatically.",
            format!("Open {workflow_url} to view the latest run."),
        )),
    }

    // Stage 8: watch the sync run.
    let mut sync_watch_ok = false;
    if !options.watch {
        reports.push(StepReport::skipped(
            "Watch workflow run",
            "Skipped (--no-watch).",
            Some(run_link(&sync_run).unwrap_or_else(|| workflow_url.clone())),
        ));
    } else if let Some(run) = &sync_run {
        let (watched, watch_detail) = watch_run(control_plane, run.id);
        sync_watch_ok = watched;
        reports.push(if watched {
            StepReport::succeeded("Watch workflow run", watch_detail)
        } else {
            StepReport::manual(
                "Watch workflow run",
                watch_detail,
                run_link(&sync_run).unwrap_or_else(|| workflow_url.clone()),
            )
        });
    } else {
        reports.push(StepReport::skipped(
            "Watch workflow run",
            "Skipped because run ID could not be determined.",
            Some(workflow_url.clone()),
        ));
    }

    // Stage 9: the dependent Pages deploy, only once the sync run finished
    // cleanly under watch.
    if !options.watch {
        reports.push(StepReport::skipped(
            "Locate Pages deploy run",
            "Skipped (--no-watch).",
            Some(pages_workflow_url.clone()),
        ));
        reports.push(StepReport::skipped(
            "Watch Pages deploy",
            "Skipped (--no-watch).",
            Some(pages_workflow_url),
        ));
        return;
    }
    if sync_run.is_none() {
        let detail = "Skipped because sync run ID could not be determined.";
        reports.push(StepReport::skipped(
            "Locate Pages deploy run",
            detail,
            Some(pages_workflow_url.clone()),
        ));
        reports.push(StepReport::skipped(
            "Watch Pages deploy",
            detail,
            Some(pages_workflow_url),
        ));
        return;
    }
    if !sync_watch_ok {
        let detail = "Skipped because sync run did not finish cleanly in CLI watch.";
        reports.push(StepReport::skipped(
            "Locate Pages deploy run",
            detail,
            Some(pages_workflow_url.clone()),
        ));
        reports.push(StepReport::skipped(
            "Watch Pages deploy",
            detail,
            Some(pages_workflow_url),
        ));
        return;
    }

    let pages_run = find_latest_run(
        control_plane,
        &RunFilter {
            workflow: PAGES_WORKFLOW.to_string(),
            event: "workflow_run".to_string(),
            limit: 10,
        },
        dispatch_started_at,
        options.downstream_discovery,
    );
    match &pages_run {
        Some(run) => {
            let location = run
                .url
                .clone()
                .unwrap_or_else(|| format!("run id {}", run.id));
            reports.push(StepReport::succeeded(
                "Locate Pages deploy run",
                format!("Deploy Pages run URL: {location}"),
            ));
        }
        None => reports.push(StepReport::manual(
            "Locate Pages deploy run",
            "Could not find a Deploy Pages run after sync completed.",
            pages_workflow_url.clone(),
        )),
    }

    match &pages_run {
        Some(run) => {
            let (watched, watch_detail) = watch_run(control_plane, run.id);
            reports.push(if watched {
                StepReport::succeeded("Watch Pages deploy", watch_detail)
            } else {
                StepReport::manual(
                    "Watch Pages deploy",
                    "Could not monitor Deploy Pages to completion.",
                    run_link(&pages_run).unwrap_or(pages_workflow_url),
                )
            });
        }
        None => reports.push(StepReport::skipped(
            "Watch Pages deploy",
            "Skipped because the Deploy Pages run could not be located.",
            Some(pages_workflow_url),
        )),
    }
}

/// Stages 3-9 with `--no-auto-github`: each gets its own skip entry so no
/// stage is silently absent from the summary.
fn skip_github_automation(repo: &RepoSlug, reports: &mut Vec<StepReport>) {
    let detail = "Skipped (--no-auto-github).";
    let workflow_url = repo.workflow_url(SYNC_WORKFLOW);
    let pages_workflow_url = repo.workflow_url(PAGES_WORKFLOW);

    reports.push(StepReport::skipped("Actions permissions", detail, None));
    reports.push(StepReport::skipped("Enable workflows", detail, None));
    reports.push(StepReport::skipped("GitHub Pages source", detail, None));
    reports.push(StepReport::skipped(
        "Run first sync workflow",
        detail,
        Some(format!("Run the workflow manually: {workflow_url}")),
    ));
    reports.push(StepReport::skipped("Locate run URL", detail, None));
    reports.push(StepReport::skipped(
        "Watch workflow run",
        detail,
        Some(workflow_url),
    ));
    reports.push(StepReport::skipped("Locate Pages deploy run", detail, None));
    reports.push(StepReport::skipped(
        "Watch Pages deploy",
        detail,
        Some(pages_workflow_url),
    ));
}

fn run_link(run: &Option<crate::github::WorkflowRun>) -> Option<String> {
    run.as_ref().and_then(|run| run.url.clone())
}

/// Check-before-write, then verify. A pre-read that already satisfies the
/// goal succeeds without issuing any mutation, so repeated runs are safe and
/// an org policy that forbids the broad request cannot mask an
/// already-enabled repository.
fn try_enable_actions_permissions(control_plane: &dyn ControlPlane) -> (bool, String) {
    if let Ok(current) = control_plane.actions_permissions() {
        if current.enabled && current.allowed_actions.as_deref() == Some("all") {
            return (
                true,
                "Repository Actions are already enabled (allowed_actions=all); no update was required."
                    .to_string(),
            );
        }
    }

    let mut errors = Vec::new();
    for request in [PermissionsRequest::broad(), PermissionsRequest::reduced()] {
        match control_plane.put_actions_permissions(&request) {
            Ok(()) => match control_plane.actions_permissions() {
                Ok(current) if current.enabled => {
                    return (true, configured_detail(&current));
                }
                _ => errors
                    .push("Permissions update was accepted but could not be confirmed.".to_string()),
            },
            Err(err) => errors.push(err.to_string()),
        }
    }

    // A rejected mutation does not mean a misconfigured repository; re-read
    // before giving up.
    if let Ok(current) = control_plane.actions_permissions() {
        if current.enabled {
            let detail = match &current.allowed_actions {
                Some(allowed) => format!(
                    "Repository Actions are already enabled (allowed_actions={allowed}); API update was not required."
                ),
                None => {
                    "Repository Actions are already enabled; API update was not required."
                        .to_string()
                }
            };
            return (true, detail);
        }
    }

    if errors.is_empty() {
        (
            false,
            "Unable to configure repository Actions permissions automatically.".to_string(),
        )
    } else {
        (false, dedup_join(&errors))
    }
}

fn configured_detail(current: &ActionsPermissions) -> String {
    match &current.allowed_actions {
        Some(allowed) => format!("Repository Actions are enabled (allowed_actions={allowed})."),
        None => "Repository Actions permissions configured.".to_string(),
    }
}

fn try_enable_workflows(control_plane: &dyn ControlPlane, workflows: &[&str]) -> (bool, String) {
    let mut failures = Vec::new();
    for workflow in workflows {
        if let Err(err) = control_plane.enable_workflow(workflow) {
            failures.push(format!("{workflow}: {err}"));
        }
    }
    if failures.is_empty() {
        (true, format!("{} are enabled.", workflows.join(" and ")))
    } else {
        (false, failures.join("; "))
    }
}

/// Idempotent Pages configuration: short-circuit on a matching pre-read,
/// otherwise try both write strategies and trust only a confirming re-read,
/// never the mutation's own return code.
fn try_configure_pages(control_plane: &dyn ControlPlane) -> (bool, String) {
    let confirmed = |control_plane: &dyn ControlPlane| {
        matches!(
            control_plane.pages_build_type(),
            Ok(Some(value)) if value == "workflow"
        )
    };

    if confirmed(control_plane) {
        return (
            true,
            "GitHub Pages already configured for GitHub Actions.".to_string(),
        );
    }

    let mut errors = Vec::new();
    for method in [PagesWriteMethod::Update, PagesWriteMethod::Create] {
        match control_plane.put_pages_build_type(method, "workflow") {
            Ok(()) => {
                if confirmed(control_plane) {
                    return (
                        true,
                        "GitHub Pages configured to deploy from GitHub Actions.".to_string(),
                    );
                }
            }
            Err(err) => errors.push(err.to_string()),
        }
    }

    // The write and read paths are not assumed consistent on a single call.
    if confirmed(control_plane) {
        return (
            true,
            "GitHub Pages configured to deploy from GitHub Actions.".to_string(),
        );
    }

    if errors.is_empty() {
        (
            false,
            "Unable to configure GitHub Pages build type automatically.".to_string(),
        )
    } else {
        (false, errors.join("; "))
    }
}

// Deduplicate while preserving order for concise summaries.
fn dedup_join(errors: &[String]) -> String {
    let mut seen = Vec::new();
    for error in errors {
        if !seen.contains(error) {
            seen.push(error.clone());
        }
    }
    seen.join("; ")
}
