use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// A confidence value fell outside `[0, 100]` or was not a number.
    #[error("confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),

    /// A verdict string did not name one of the known verdicts.
    #[error("unknown verdict: {0}")]
    UnknownVerdict(String),
}
