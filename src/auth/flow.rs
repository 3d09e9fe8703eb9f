use crate::auth::callback::{CallbackListener, CallbackOutcome, CALLBACK_PATH};
use crate::auth::state::generate_state_token;
use crate::auth::AuthError;
use std::time::Duration;

pub const AUTHORIZE_ENDPOINT: &str = "https://www.strava.com/oauth/authorize";

#[derive(Debug, Clone)]
pub struct AuthFlowConfig {
    pub client_id: String,
    pub scope: String,
    pub port: u16,
    pub timeout: Duration,
    pub open_browser: bool,
}

/// Runs the browser-based authorization flow to completion and returns the
/// single-use authorization code.
///
/// The listener is bound before the authorize URL is constructed so the
/// redirect URI always carries the actually-bound port. Launching the
/// browser is best effort; the URL is printed either way.
pub fn run_authorization_flow(config: &AuthFlowConfig) -> Result<String, AuthError> {
    let state = generate_state_token()?;
    let listener = CallbackListener::bind(config.port, &state)?;
    let redirect_uri = format!("http://localhost:{}{}", listener.port(), CALLBACK_PATH);
    let auth_url = authorize_url(config, &redirect_uri, &state);

    println!("\nOpen this URL to authorize Strava access:");
    println!("{auth_url}");

    if config.open_browser {
        if let Err(err) = open::that(&auth_url) {
            println!("Could not open a browser automatically ({err}); use the URL above.");
        }
    }

    println!(
        "\nWaiting for callback on {redirect_uri} (timeout: {}s)...",
        config.timeout.as_secs()
    );

    match listener.run(config.timeout) {
        CallbackOutcome::Code(code) => Ok(code),
        CallbackOutcome::Error(message) => Err(AuthError::AuthorizationDenied(message)),
        CallbackOutcome::Pending => Err(AuthError::AuthorizationTimedOut),
    }
}

fn authorize_url(config: &AuthFlowConfig, redirect_uri: &str, state: &str) -> String {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", redirect_uri),
        ("approval_prompt", "force"),
        ("scope", config.scope.as_str()),
        ("state", state),
    ];
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{AUTHORIZE_ENDPOINT}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_encodes_every_parameter() {
        let config = AuthFlowConfig {
            client_id: "123".to_string(),
            scope: "read,activity:read_all".to_string(),
            port: 8765,
            timeout: Duration::from_secs(180),
            open_browser: false,
        };
        let url = authorize_url(&config, "http://localhost:8765/exchange_token", "tok en");

        assert!(url.starts_with(AUTHORIZE_ENDPOINT));
        assert!(url.contains("client_id=123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("approval_prompt=force"));
        assert!(url.contains("scope=read%2Cactivity%3Aread_all"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8765%2Fexchange_token"));
        assert!(url.contains("state=tok%20en"));
    }
}
