//! Error types for tabguard-core

use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tabguard-core.
///
/// Expected control-flow rejections (throttled, blocked, loop broken) are
/// [`crate::events::NavOutcome`] values, never errors. Only failures with
/// no recovery strategy land here.
#[derive(Error, Debug)]
pub enum Error {
    /// The injected navigation primitive itself failed
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A request named a tab the registry does not declare
    #[error("unknown tab: {0}")]
    UnknownTab(String),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_failure() {
        let err = Error::Navigation("router offline".to_string());
        assert!(err.to_string().contains("router offline"));

        let err = Error::UnknownTab("payroll".to_string());
        assert_eq!(err.to_string(), "unknown tab: payroll");
    }
}
