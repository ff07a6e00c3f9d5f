// Errors surfaced by the status controller.

use crate::hours::HoursError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// The caller is not in the allow-list. State is left untouched.
    #[error("caller is not authorized to change court status")]
    Unauthorized,
    #[error("invalid operating hours: {0}")]
    InvalidHours(#[from] HoursError),
}
