use snafu::Snafu;

use o2ims_common::error::CoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DictionaryError {
    #[snafu(display("failed to list monitoring rules: {details}"))]
    RuleSource { details: String },

    #[snafu(display("repository error: {source}"))]
    Repository { source: o2ims_repository::RepositoryError },

    #[snafu(display("node cluster type {id} missing required extension keys"))]
    MissingExtensions { id: uuid::Uuid },

    #[snafu(display("synchronization deadline exceeded"))]
    DeadlineExceeded,

    /// "Expected 1 record, got N" and similar: this type's sync pass aborts
    /// and is retried on the next run (spec.md §7).
    #[snafu(display("invariant violated: {details}"))]
    FatalInvariant { details: String },
}

impl From<o2ims_repository::RepositoryError> for DictionaryError {
    fn from(source: o2ims_repository::RepositoryError) -> Self {
        Self::Repository { source }
    }
}

impl From<DictionaryError> for CoreError {
    fn from(error: DictionaryError) -> Self {
        match error {
            DictionaryError::Repository { source } => source.into(),
            DictionaryError::MissingExtensions { id } => CoreError::input(format!("node cluster type {id}")),
            DictionaryError::DeadlineExceeded => CoreError::fatal_invariant("alarm dictionary sync deadline exceeded"),
            DictionaryError::RuleSource { details } => CoreError::transient(details),
            DictionaryError::FatalInvariant { details } => CoreError::fatal_invariant(details),
        }
    }
}
