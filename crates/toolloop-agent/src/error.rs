//! Turn-level errors.

use thiserror::Error;
use toolloop_core::error::ModelError;
use toolloop_core::session::SessionState;

/// Why a turn ended without an answer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TurnError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("turn cancelled")]
    Cancelled,
}

/// A failed turn. The session is handed back as it stood when the failure
/// happened: the user message and every completed acting step are kept.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct TurnFailure {
    pub session: SessionState,
    pub error: TurnError,
}
