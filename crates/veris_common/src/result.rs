//! Common result and error types for the veris front-end.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial or degraded after
/// error recovery). `Err` indicates an unrecoverable internal error (a bug
/// in veris), not a user-facing error. User errors are reported through the
/// diagnostic sink and the operation still returns `Ok`.
pub type VerisResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in veris, not a user input
/// problem.
///
/// These errors should never occur during normal operation. If one does
/// occur, it means there is a logic error in the front-end that should be
/// fixed.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("scope vanished");
        assert_eq!(format!("{err}"), "internal compiler error: scope vanished");
    }

    #[test]
    fn ok_and_err_paths() {
        let ok: VerisResult<u32> = Ok(7);
        assert_eq!(ok.ok(), Some(7));

        let err: VerisResult<u32> = Err(InternalError::new("bad"));
        assert_eq!(err.err().unwrap().message, "bad");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "converted".to_string().into();
        assert_eq!(err.message, "converted");
    }
}
