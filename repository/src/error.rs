use snafu::Snafu;

use o2ims_common::error::CoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RepositoryError {
    #[snafu(display("database error: {source}"))]
    Database { source: sqlx::Error },

    /// `Get`-style wrappers translate an empty `Find` result into this
    /// variant (spec.md §4.2).
    #[snafu(display("{resource} not found"))]
    NotFound { resource: String },

    /// A unique-constraint violation surfaced to the caller rather than
    /// treated as a retryable transient error (spec.md §7).
    #[snafu(display("conflict: {details}"))]
    Conflict { details: String },
}

impl From<sqlx::Error> for RepositoryError {
    fn from(source: sqlx::Error) -> Self {
        match &source {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => Self::Conflict {
                details: db_error.message().to_string(),
            },
            _ => Self::Database { source },
        }
    }
}

impl From<RepositoryError> for CoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { resource } => CoreError::not_found(resource),
            RepositoryError::Conflict { details } => CoreError::conflict(details),
            RepositoryError::Database { source } => CoreError::transient(source.to_string()),
        }
    }
}
