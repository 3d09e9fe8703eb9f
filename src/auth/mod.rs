pub mod callback;
pub mod flow;
pub mod state;
pub mod token;

pub use callback::{CallbackListener, CallbackOutcome, CALLBACK_PATH};
pub use flow::{run_authorization_flow, AuthFlowConfig};
pub use state::generate_state_token;
pub use token::{ExchangeError, TokenBundle, TokenExchanger};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to generate state token randomness: {0}")]
    Entropy(String),
    #[error("callback port {port} is unavailable: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    AuthorizationDenied(String),
    #[error("Timed out waiting for Strava OAuth callback.")]
    AuthorizationTimedOut,
}
