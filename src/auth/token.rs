use serde::Deserialize;
use std::time::Duration;

pub const TOKEN_ENDPOINT: &str = "https://www.strava.com/oauth/token";

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Strava token exchange request failed: {0}.")]
    Transport(String),
    #[error("Strava token exchange failed with HTTP status {status}.")]
    Rejected { status: u16 },
    #[error("Unexpected token response format from Strava.")]
    MalformedResponse,
    #[error("Strava response did not include refresh_token.")]
    IncompleteGrant,
}

/// The credential set obtained from a successful exchange. The refresh token
/// is required; a grant without one is rejected before anything downstream
/// can persist it.
#[derive(Debug, Clone)]
pub struct TokenBundle {
    pub access_token: Option<String>,
    pub refresh_token: String,
    pub token_type: Option<String>,
    pub expires_at: Option<i64>,
    pub athlete_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    athlete: Option<AthleteIdentity>,
}

#[derive(Debug, Deserialize)]
struct AthleteIdentity {
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
}

/// One-shot authorization-code-for-token exchange. Never retries: a failed
/// exchange consumes the code and the whole authorization flow must be
/// restarted to obtain a new one.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    endpoint: String,
    client_id: String,
    client_secret: String,
}

impl TokenExchanger {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            endpoint: TOKEN_ENDPOINT.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn exchange(&self, code: &str) -> Result<TokenBundle, ExchangeError> {
        let response = match ureq::post(&self.endpoint)
            .timeout(EXCHANGE_TIMEOUT)
            .send_form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ]) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(ExchangeError::Rejected { status })
            }
            Err(err) => return Err(ExchangeError::Transport(err.to_string())),
        };

        let payload = response
            .into_json::<TokenResponse>()
            .map_err(|_| ExchangeError::MalformedResponse)?;

        let refresh_token = match payload.refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ExchangeError::IncompleteGrant),
        };

        Ok(TokenBundle {
            access_token: payload.access_token,
            refresh_token,
            token_type: payload.token_type,
            expires_at: payload.expires_at,
            athlete_name: payload.athlete.and_then(athlete_display_name),
        })
    }
}

fn athlete_display_name(athlete: AthleteIdentity) -> Option<String> {
    let first = athlete.firstname.unwrap_or_default();
    let last = athlete.lastname.unwrap_or_default();
    let name = format!("{} {}", first.trim(), last.trim())
        .trim()
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn athlete_name_joins_and_trims_parts() {
        let name = athlete_display_name(AthleteIdentity {
            firstname: Some(" Ada ".to_string()),
            lastname: Some("Lovelace".to_string()),
        });
        assert_eq!(name.as_deref(), Some("Ada Lovelace"));

        let missing = athlete_display_name(AthleteIdentity {
            firstname: None,
            lastname: Some("  ".to_string()),
        });
        assert_eq!(missing, None);
    }
}
