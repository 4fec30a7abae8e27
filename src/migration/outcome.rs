// ABOUTME: Terminal result of one backup or restore run
// ABOUTME: Carries the transferred record count even when the run failed part way

use crate::error::{ErrorKind, MigrationError};

/// Outcome handed back to the caller at the end of a run.
///
/// A failed outcome always carries the error that ended the run. The record
/// count of a failed run tells the caller how far it got: records written
/// before the failure are not rolled back.
#[derive(Debug)]
pub struct RunOutcome {
    records_transferred: u64,
    failure: Option<MigrationError>,
}

impl RunOutcome {
    pub fn success(records_transferred: u64) -> Self {
        Self {
            records_transferred,
            failure: None,
        }
    }

    pub fn failed(error: MigrationError, records_transferred: u64) -> Self {
        Self {
            records_transferred,
            failure: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn records_transferred(&self) -> u64 {
        self.records_transferred
    }

    pub fn failure(&self) -> Option<&MigrationError> {
        self.failure.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(MigrationError::kind)
    }

    /// Human-readable reason, prefixed with the error kind. `None` on success.
    pub fn failure_reason(&self) -> Option<String> {
        self.failure
            .as_ref()
            .map(|error| format!("{}: {}", error.kind(), error))
    }

    /// Record count on success, the error that ended the run otherwise.
    pub fn into_result(self) -> Result<u64, MigrationError> {
        match self.failure {
            None => Ok(self.records_transferred),
            Some(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_reason() {
        let outcome = RunOutcome::success(3);
        assert!(outcome.succeeded());
        assert_eq!(outcome.records_transferred(), 3);
        assert!(outcome.failure_reason().is_none());
        assert_eq!(outcome.into_result().unwrap(), 3);
    }

    #[test]
    fn test_failure_reason_is_never_empty() {
        let outcome = RunOutcome::failed(
            MigrationError::TableNotFound {
                table: "Orders".to_string(),
            },
            0,
        );
        assert!(!outcome.succeeded());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::TableNotFound));

        let reason = outcome.failure_reason().unwrap();
        assert!(reason.starts_with("TableNotFound: "));
        assert!(reason.contains("Orders"));
    }

    #[test]
    fn test_into_result_returns_failure() {
        let outcome = RunOutcome::failed(
            MigrationError::TableNotEmpty {
                table: "Orders".to_string(),
                item_count: 4,
            },
            0,
        );
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TableNotEmpty);
    }
}
