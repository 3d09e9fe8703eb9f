/// A normalized `OWNER/REPO` repository reference plus the URLs derived from
/// it for manual-remediation instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    owner: String,
    repo: String,
}

impl RepoSlug {
    /// Accepts `https://github.com/OWNER/REPO`, `git@github.com:OWNER/REPO`
    /// (with or without a `.git` suffix) and bare `OWNER/REPO` forms.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let rest = strip_url_prefix(trimmed)
            .or_else(|| strip_ssh_prefix(trimmed))
            .unwrap_or(trimmed);
        let rest = rest.trim_end_matches('/');

        let (owner, repo) = rest.split_once('/')?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        if !valid_segment(owner) || !valid_segment(repo) {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn repo_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    pub fn workflow_url(&self, workflow: &str) -> String {
        format!("{}/actions/workflows/{workflow}", self.repo_url())
    }

    pub fn actions_url(&self) -> String {
        format!("{}/actions", self.repo_url())
    }

    pub fn actions_settings_url(&self) -> String {
        format!("{}/settings/actions", self.repo_url())
    }

    pub fn pages_settings_url(&self) -> String {
        format!("{}/settings/pages", self.repo_url())
    }

    pub fn variables_settings_url(&self) -> String {
        format!("{}/settings/variables/actions", self.repo_url())
    }

    /// Published dashboard URL; the `OWNER.github.io` repository publishes
    /// at the domain root.
    pub fn pages_site_url(&self) -> String {
        let user_site = format!("{}.github.io", self.owner.to_lowercase());
        if self.repo.to_lowercase() == user_site {
            format!("https://{}.github.io/", self.owner.to_lowercase())
        } else {
            format!(
                "https://{}.github.io/{}/",
                self.owner.to_lowercase(),
                self.repo
            )
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn strip_url_prefix(raw: &str) -> Option<&str> {
    let lower = raw.to_lowercase();
    for prefix in ["https://github.com/", "http://github.com/"] {
        if lower.starts_with(prefix) {
            return Some(&raw[prefix.len()..]);
        }
    }
    None
}

fn strip_ssh_prefix(raw: &str) -> Option<&str> {
    let prefix = "git@github.com:";
    if raw.to_lowercase().starts_with(prefix) {
        return Some(&raw[prefix.len()..]);
    }
    None
}

fn valid_segment(segment: &str) -> bool {
    !segment.contains('/') && !segment.contains(char::is_whitespace)
}
