use crate::app::cli::{help_text, parse_cli_args, CliArgs};
use crate::app::prompt;
use crate::app::units::resolve_units;
use crate::auth::{run_authorization_flow, AuthFlowConfig, TokenExchanger};
use crate::github::{GhCli, RepoSlug};
use crate::setup::report::{has_manual_steps, render_summary};
use crate::setup::{run_pipeline, PipelineInputs, PipelineOptions};
use crate::shared::errors::SetupError;
use crate::shared::logging::{append_setup_log_line, default_state_root};
use std::time::Duration;

/// End-to-end bootstrap: preflight, repository resolution, credential
/// gathering, OAuth authorization, token exchange, configuration pipeline,
/// summary.
pub fn run(raw_args: Vec<String>) -> Result<(), SetupError> {
    let args = parse_cli_args(&raw_args).map_err(SetupError::InvalidArguments)?;
    if args.help {
        println!("{}", help_text());
        return Ok(());
    }

    let interactive = prompt::is_interactive();

    GhCli::preflight()?;
    let repo = resolve_repo(&args, interactive)?;
    GhCli::assert_repo_access(&repo)?;

    let (client_id, client_secret) = resolve_credentials(&args, interactive)?;
    let (distance_unit, elevation_unit) = resolve_units(&args, interactive)?;

    let code = run_authorization_flow(&AuthFlowConfig {
        client_id: client_id.clone(),
        scope: args.scope.clone(),
        port: args.port,
        timeout: Duration::from_secs(args.timeout_seconds),
        open_browser: !args.no_browser,
    })?;

    let tokens = TokenExchanger::new(&client_id, &client_secret).exchange(&code)?;
    println!("\nCredentials configured.");
    if let Some(name) = &tokens.athlete_name {
        println!("Authorized athlete: {name}");
    }

    let control_plane = GhCli::new(&repo);
    let inputs = PipelineInputs {
        control_plane: &control_plane,
        repo: &repo,
        client_id: &client_id,
        client_secret: &client_secret,
        refresh_token: &tokens.refresh_token,
    };
    let mut options = PipelineOptions::new(&distance_unit, &elevation_unit);
    options.auto_github = !args.no_auto_github;
    options.watch = !args.no_watch;

    let reports = run_pipeline(&inputs, &options)?;

    println!("\n{}", render_summary(&reports));
    log_reports(&reports);

    let dashboard_url = repo.pages_site_url();
    if has_manual_steps(&reports) {
        println!("\nSetup completed with manual steps remaining.");
        println!("Dashboard URL: {dashboard_url}");
    } else if args.no_auto_github {
        println!("\nSetup completed. GitHub automation was skipped (--no-auto-github).");
        println!("Run sync.yml to publish, then open: {dashboard_url}");
    } else if args.no_watch {
        println!("\nSetup completed. Workflows were started but not watched (--no-watch).");
        println!("Check Actions for completion, then open: {dashboard_url}");
    } else {
        println!("\nYour dashboard is now live at {dashboard_url}");
    }

    Ok(())
}

fn resolve_repo(args: &CliArgs, interactive: bool) -> Result<RepoSlug, SetupError> {
    let candidates = [
        args.repo.clone(),
        std::env::var("GH_REPO").ok(),
    ];
    for candidate in candidates.iter().flatten() {
        if let Some(slug) = RepoSlug::parse(candidate) {
            return Ok(slug);
        }
    }
    if let Some(slug) = GhCli::context_repo_slug() {
        return Ok(slug);
    }
    if let Some(slug) = GhCli::git_remote_repo_slug() {
        return Ok(slug);
    }

    if !interactive {
        return Err(SetupError::InvalidArguments(
            "Unable to determine repository in non-interactive mode. Re-run with --repo OWNER/REPO."
                .to_string(),
        ));
    }
    loop {
        let answer = prompt::prompt_line("GitHub repository (OWNER/REPO)")?;
        if let Some(slug) = RepoSlug::parse(&answer) {
            return Ok(slug);
        }
        println!("Please enter repository as OWNER/REPO.");
    }
}

fn resolve_credentials(args: &CliArgs, interactive: bool) -> Result<(String, String), SetupError> {
    if !interactive {
        let client_id = args.client_id.clone().ok_or_else(|| {
            SetupError::InvalidArguments(
                "Missing STRAVA_CLIENT_ID in non-interactive mode. Re-run with --client-id."
                    .to_string(),
            )
        })?;
        let client_secret = args.client_secret.clone().ok_or_else(|| {
            SetupError::InvalidArguments(
                "Missing STRAVA_CLIENT_SECRET in non-interactive mode. Re-run with --client-secret."
                    .to_string(),
            )
        })?;
        return Ok((client_id.trim().to_string(), client_secret.trim().to_string()));
    }

    if args.client_id.is_none() {
        println!("\nEnter your Strava API credentials from https://www.strava.com/settings/api");
    }
    let client_id = match &args.client_id {
        Some(value) => value.trim().to_string(),
        None => prompt::prompt_line("STRAVA_CLIENT_ID")?,
    };
    let client_secret = match &args.client_secret {
        Some(value) => value.trim().to_string(),
        None => prompt::prompt_secret("STRAVA_CLIENT_SECRET")?,
    };
    if client_id.is_empty() || client_secret.is_empty() {
        return Err(SetupError::InvalidArguments(
            "Both STRAVA_CLIENT_ID and STRAVA_CLIENT_SECRET are required.".to_string(),
        ));
    }
    Ok((client_id, client_secret))
}

fn log_reports(reports: &[crate::setup::StepReport]) {
    let Some(state_root) = default_state_root() else {
        return;
    };
    for report in reports {
        let line = format!(
            "[{}] {}: {}",
            report.status.label(),
            report.name,
            report.detail
        );
        let _ = append_setup_log_line(&state_root, &line);
    }
}
