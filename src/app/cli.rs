pub const DEFAULT_PORT: u16 = 8765;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 180;
pub const DEFAULT_SCOPE: &str = "read,activity:read_all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Us,
    Metric,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub repo: Option<String>,
    pub unit_system: Option<UnitSystem>,
    pub distance_unit: Option<String>,
    pub elevation_unit: Option<String>,
    pub port: u16,
    pub timeout_seconds: u64,
    pub scope: String,
    pub no_browser: bool,
    pub no_auto_github: bool,
    pub no_watch: bool,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            repo: None,
            unit_system: None,
            distance_unit: None,
            elevation_unit: None,
            port: DEFAULT_PORT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            scope: DEFAULT_SCOPE.to_string(),
            no_browser: false,
            no_auto_github: false,
            no_watch: false,
            help: false,
        }
    }
}

pub fn parse_cli_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--no-browser" => parsed.no_browser = true,
            "--no-auto-github" => parsed.no_auto_github = true,
            "--no-watch" => parsed.no_watch = true,
            "--client-id" => parsed.client_id = Some(take_value(arg, iter.next())?),
            "--client-secret" => parsed.client_secret = Some(take_value(arg, iter.next())?),
            "--repo" => parsed.repo = Some(take_value(arg, iter.next())?),
            "--scope" => parsed.scope = take_value(arg, iter.next())?,
            "--unit-system" => {
                parsed.unit_system = Some(match take_value(arg, iter.next())?.as_str() {
                    "us" => UnitSystem::Us,
                    "metric" => UnitSystem::Metric,
                    other => return Err(format!("--unit-system must be us or metric, got `{other}`")),
                })
            }
            "--distance-unit" => {
                let value = take_value(arg, iter.next())?;
                if value != "mi" && value != "km" {
                    return Err(format!("--distance-unit must be mi or km, got `{value}`"));
                }
                parsed.distance_unit = Some(value);
            }
            "--elevation-unit" => {
                let value = take_value(arg, iter.next())?;
                if value != "ft" && value != "m" {
                    return Err(format!("--elevation-unit must be ft or m, got `{value}`"));
                }
                parsed.elevation_unit = Some(value);
            }
            "--port" => {
                let value = take_value(arg, iter.next())?;
                parsed.port = value
                    .parse::<u16>()
                    .ok()
                    .filter(|port| *port >= 1)
                    .ok_or_else(|| "--port must be between 1 and 65535.".to_string())?;
            }
            "--timeout" => {
                let value = take_value(arg, iter.next())?;
                parsed.timeout_seconds = value
                    .parse::<u64>()
                    .ok()
                    .filter(|seconds| *seconds > 0)
                    .ok_or_else(|| "--timeout must be a positive number of seconds.".to_string())?;
            }
            other => return Err(format!("unknown flag `{other}`")),
        }
    }

    Ok(parsed)
}

fn take_value(flag: &str, value: Option<&String>) -> Result<String, String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(format!("{flag} requires a value")),
    }
}

pub fn help_text() -> String {
    [
        "strava-setup: bootstrap Strava OAuth and automate GitHub setup for a dashboard repo.",
        "",
        "Options:",
        "  --client-id <id>          Strava client ID",
        "  --client-secret <secret>  Strava client secret",
        "  --repo <OWNER/REPO>       Target GitHub repository (auto-detected if omitted)",
        "  --unit-system <us|metric> Units preset for dashboard metrics",
        "  --distance-unit <mi|km>   Distance unit override",
        "  --elevation-unit <ft|m>   Elevation unit override",
        "  --port <port>             Local callback port (default: 8765)",
        "  --timeout <seconds>       Seconds to wait for the OAuth callback (default: 180)",
        "  --scope <scopes>          Strava OAuth scopes (default: read,activity:read_all)",
        "  --no-browser              Do not auto-open a browser; print the auth URL only",
        "  --no-auto-github          Skip GitHub Pages/workflow automation",
        "  --no-watch                Do not watch workflow runs after dispatching",
        "  --help                    Show this help",
    ]
    .join("\n")
}
