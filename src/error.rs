// ABOUTME: Error taxonomy for backup and restore runs
// ABOUTME: Every variant is terminal and carries enough context to diagnose a failed run

use crate::dynamo::converter::CodecError;
use std::fmt;
use std::path::PathBuf;

/// Failure reported by a table store collaborator (transport, auth, throttling, validation).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A run-ending failure of the migration engine.
///
/// There is no local recovery for any of these: the run stops, and whatever was
/// written before the failure stays written.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Table {table} doesn't exist")]
    TableNotFound { table: String },

    #[error(
        "Cannot restore data into table {table} because it contains {item_count} records already. \
         You can only restore data in empty tables"
    )]
    TableNotEmpty { table: String, item_count: u64 },

    #[error("Failed to get table {table}'s details: {source}")]
    StoreUnreachable {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error(
        "File {} already exists. To avoid overwriting data, delete it first or pass --overwrite",
        path.display()
    )]
    DestinationExists { path: PathBuf },

    #[error("Cannot write backup file {}: {source}", path.display())]
    DestinationNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan of table {table} failed after {written} records: {source}")]
    ScanFailed {
        table: String,
        written: u64,
        #[source]
        source: StoreError,
    },

    #[error("Could not read data from file {}: {message}", path.display())]
    SourceFileInvalid { path: PathBuf, message: String },

    #[error("Record #{index} is malformed: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("Error writing record #{index} to table {table}: {source}")]
    RecordWriteFailed {
        index: usize,
        table: String,
        #[source]
        source: StoreError,
    },
}

/// Tag identifying which kind of failure ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TableNotFound,
    TableNotEmpty,
    StoreUnreachable,
    DestinationExists,
    DestinationNotWritable,
    ScanFailed,
    SourceFileInvalid,
    MalformedRecord,
    RecordWriteFailed,
}

impl MigrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrationError::TableNotFound { .. } => ErrorKind::TableNotFound,
            MigrationError::TableNotEmpty { .. } => ErrorKind::TableNotEmpty,
            MigrationError::StoreUnreachable { .. } => ErrorKind::StoreUnreachable,
            MigrationError::DestinationExists { .. } => ErrorKind::DestinationExists,
            MigrationError::DestinationNotWritable { .. } => ErrorKind::DestinationNotWritable,
            MigrationError::ScanFailed { .. } => ErrorKind::ScanFailed,
            MigrationError::SourceFileInvalid { .. } => ErrorKind::SourceFileInvalid,
            MigrationError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            MigrationError::RecordWriteFailed { .. } => ErrorKind::RecordWriteFailed,
        }
    }

    /// Index of the record that ended the run, for per-record failures.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            MigrationError::MalformedRecord { index, .. }
            | MigrationError::RecordWriteFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TableNotFound => "TableNotFound",
            ErrorKind::TableNotEmpty => "TableNotEmpty",
            ErrorKind::StoreUnreachable => "StoreUnreachable",
            ErrorKind::DestinationExists => "DestinationExists",
            ErrorKind::DestinationNotWritable => "DestinationNotWritable",
            ErrorKind::ScanFailed => "ScanFailed",
            ErrorKind::SourceFileInvalid => "SourceFileInvalid",
            ErrorKind::MalformedRecord => "MalformedRecord",
            ErrorKind::RecordWriteFailed => "RecordWriteFailed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = MigrationError::TableNotEmpty {
            table: "Orders".to_string(),
            item_count: 3,
        };
        assert_eq!(err.kind(), ErrorKind::TableNotEmpty);
        assert_eq!(err.kind().to_string(), "TableNotEmpty");
        assert!(err.to_string().contains("Orders"));
        assert!(err.to_string().contains("3 records"));
    }

    #[test]
    fn test_record_index_only_for_record_failures() {
        let write = MigrationError::RecordWriteFailed {
            index: 7,
            table: "Orders".to_string(),
            source: StoreError::new("ValidationException"),
        };
        assert_eq!(write.record_index(), Some(7));
        assert!(write.to_string().contains("#7"));
        assert!(write.to_string().contains("ValidationException"));

        let missing = MigrationError::TableNotFound {
            table: "Orders".to_string(),
        };
        assert_eq!(missing.record_index(), None);
    }

    #[test]
    fn test_destination_messages_name_the_path() {
        let err = MigrationError::DestinationExists {
            path: PathBuf::from("out.json"),
        };
        assert!(err.to_string().contains("out.json"));
    }
}
