//! Error types shared by the profile store, the question bank and the quiz
//! engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::bank::CategoryFilter;

/// Failures talking to the host key-value store.
///
/// These never escape the profile manager: they are logged and folded into a
/// [`crate::profile::PersistOutcome::Degraded`] or treated as "no profile".
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be read or written at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A value was present but could not be decoded.
    #[error("stored value for `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    /// A value could not be turned into its stored form.
    #[error("could not encode value for `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

/// Profile operations that were refused without changing anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("no active profile")]
    NoActiveProfile,

    #[error("display name must not be empty")]
    EmptyName,
}

/// Rejected quiz engine transitions. The engine state is untouched whenever
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("no questions available for {0}")]
    EmptyResultSet(CategoryFilter),

    #[error("the current question has already been answered")]
    AlreadyAnswered,

    #[error("the current question has not been answered yet")]
    NotAnswered,

    #[error("no session in progress")]
    NotInProgress,

    #[error("option {index} is out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },
}

/// Problems loading a question bank.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse question bank {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("question `{id}` is invalid: {reason}")]
    Invalid { id: String, reason: String },

    #[error("built-in question bank `{0}` is missing")]
    Missing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_unavailable() {
        let err: StorageError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, StorageError::Unavailable(ref m) if m.contains("denied")));
    }

    #[test]
    fn encode_errors_keep_their_source() {
        use std::error::Error as _;

        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = StorageError::Encode {
            key: "tvde_pro_user".into(),
            source,
        };
        assert_eq!(err.to_string(), "could not encode value for `tvde_pro_user`");
        assert!(err.source().is_some());
    }

    #[test]
    fn quiz_error_messages_name_the_category() {
        let err = QuizError::EmptyResultSet(CategoryFilter::All);
        assert_eq!(err.to_string(), "no questions available for Todos");
    }
}
