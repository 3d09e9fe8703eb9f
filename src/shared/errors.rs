use crate::auth::token::ExchangeError;
use crate::auth::AuthError;
use crate::github::ControlPlaneError;

/// Top-level failure taxonomy. Everything here is fatal: degraded
/// conditions never surface as errors, they become StepReport entries and
/// the run keeps going.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
    #[error("cancelled")]
    Cancelled,
}

impl SetupError {
    /// Observable process exit contract: 0 full success, 1 any failure,
    /// 130 user cancellation.
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::Cancelled => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_maps_to_130_and_failures_to_1() {
        assert_eq!(SetupError::Cancelled.exit_code(), 130);
        assert_eq!(
            SetupError::InvalidArguments("--port must be between 1 and 65535.".to_string())
                .exit_code(),
            1
        );
        assert_eq!(
            SetupError::Auth(AuthError::AuthorizationTimedOut).exit_code(),
            1
        );
    }
}
