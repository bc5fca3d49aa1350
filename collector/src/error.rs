use snafu::Snafu;

use o2ims_common::error::CoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CollectorError {
    #[snafu(display("data source list failed: {source}"))]
    Transport { source: o2ims_transport::TransportError },

    #[snafu(display("repository error: {source}"))]
    Repository { source: o2ims_repository::RepositoryError },

    #[snafu(display("malformed object from data source: {details}"))]
    Input { details: String },
}

impl From<o2ims_transport::TransportError> for CollectorError {
    fn from(source: o2ims_transport::TransportError) -> Self {
        Self::Transport { source }
    }
}

impl From<o2ims_repository::RepositoryError> for CollectorError {
    fn from(source: o2ims_repository::RepositoryError) -> Self {
        Self::Repository { source }
    }
}

impl From<CollectorError> for CoreError {
    fn from(error: CollectorError) -> Self {
        match error {
            CollectorError::Transport { source } => source.into(),
            CollectorError::Repository { source } => source.into(),
            CollectorError::Input { details } => CoreError::input(details),
        }
    }
}
