use snafu::Snafu;

use o2ims_common::error::CoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IngestError {
    #[snafu(display("repository error: {source}"))]
    Repository { source: o2ims_repository::RepositoryError },

    #[snafu(display("malformed alert notification: {details}"))]
    Input { details: String },
}

impl From<o2ims_repository::RepositoryError> for IngestError {
    fn from(source: o2ims_repository::RepositoryError) -> Self {
        Self::Repository { source }
    }
}

impl From<IngestError> for CoreError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::Repository { source } => source.into(),
            IngestError::Input { details } => CoreError::input(details),
        }
    }
}
