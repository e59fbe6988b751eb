//! Error primitives for the typed facade.

use thiserror::Error;

/// Error raised by typed dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Strict mode found a payload whose intrinsic name differs from the
    /// dispatch key.
    #[error("event name mismatch")]
    NameMismatch {
        /// Name the dispatch key expects.
        expected: &'static str,
        /// Name the payload actually carries.
        found: String,
    },
}

/// Convenience alias for typed dispatch results.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_mismatch_exposes_fields() {
        let err = DispatchError::NameMismatch {
            expected: "time",
            found: "tick".to_owned(),
        };
        assert_eq!(err.to_string(), "event name mismatch");
        let DispatchError::NameMismatch { expected, found } = err;
        assert_eq!(expected, "time");
        assert_eq!(found, "tick");
    }
}
