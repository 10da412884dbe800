use thiserror::Error;

use crate::api::ApiError;

/// Failure of a user action. By the time a controller returns one of these
/// the user has already been told through the `Ui`.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    Validation(String),

    #[error("cancelled")]
    Declined,

    #[error("RFP {0} not found")]
    UnknownRfp(i64),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActionError {
    pub fn is_declined(&self) -> bool {
        matches!(self, ActionError::Declined)
    }
}
