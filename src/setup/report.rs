/// Outcome class of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    SkippedByUser,
    RequiresManualAction,
}

impl StepStatus {
    pub fn label(self) -> &'static str {
        match self {
            StepStatus::Succeeded => "OK",
            StepStatus::SkippedByUser => "SKIPPED",
            StepStatus::RequiresManualAction => "MANUAL_REQUIRED",
        }
    }
}

/// One entry of the final itemized report. Every stage that executes, and
/// every stage skipped because an upstream output is missing, produces
/// exactly one of these.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub detail: String,
    pub manual_action: Option<String>,
}

impl StepReport {
    pub fn succeeded(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Succeeded,
            detail: detail.into(),
            manual_action: None,
        }
    }

    pub fn skipped(name: &str, detail: impl Into<String>, manual_action: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::SkippedByUser,
            detail: detail.into(),
            manual_action,
        }
    }

    pub fn manual(name: &str, detail: impl Into<String>, manual_action: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::RequiresManualAction,
            detail: detail.into(),
            manual_action: Some(manual_action.into()),
        }
    }
}

pub fn render_summary(reports: &[StepReport]) -> String {
    let mut lines = vec!["Setup summary:".to_string()];
    for report in reports {
        lines.push(format!(
            "- [{}] {}: {}",
            report.status.label(),
            report.name,
            report.detail
        ));
        if report.status == StepStatus::RequiresManualAction {
            if let Some(action) = &report.manual_action {
                lines.push(format!("  Manual: {action}"));
            }
        }
    }
    lines.join("\n")
}

pub fn has_manual_steps(reports: &[StepReport]) -> bool {
    reports
        .iter()
        .any(|report| report.status == StepStatus::RequiresManualAction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_step_and_manual_hints() {
        let reports = vec![
            StepReport::succeeded("Store unit preferences", "Saved units."),
            StepReport::manual(
                "GitHub Pages source",
                "Could not configure automatically: boom",
                "Open https://example/settings/pages and set Source to 'GitHub Actions'.",
            ),
            StepReport::skipped("Watch workflow run", "Skipped (--no-watch).", None),
        ];

        let summary = render_summary(&reports);
        assert!(summary.starts_with("Setup summary:"));
        assert!(summary.contains("- [OK] Store unit preferences: Saved units."));
        assert!(summary.contains("- [MANUAL_REQUIRED] GitHub Pages source:"));
        assert!(summary.contains("  Manual: Open https://example/settings/pages"));
        assert!(summary.contains("- [SKIPPED] Watch workflow run: Skipped (--no-watch)."));
        assert!(has_manual_steps(&reports));
    }

    #[test]
    fn manual_hint_is_only_rendered_for_manual_entries() {
        let reports = vec![StepReport::skipped(
            "Watch Pages deploy",
            "Skipped (--no-watch).",
            Some("https://example/actions/workflows/pages.yml".to_string()),
        )];
        let summary = render_summary(&reports);
        assert!(!summary.contains("  Manual:"));
        assert!(!has_manual_steps(&reports));
    }
}
