use snafu::Snafu;

use o2ims_common::error::CoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NotifyError {
    #[snafu(display("repository error: {source}"))]
    Repository { source: o2ims_repository::RepositoryError },

    #[snafu(display("delivery error: {source}"))]
    Delivery { source: o2ims_transport::TransportError },

    #[snafu(display("listener error: {source}"))]
    Listen { source: sqlx::Error },
}

impl From<o2ims_repository::RepositoryError> for NotifyError {
    fn from(source: o2ims_repository::RepositoryError) -> Self {
        Self::Repository { source }
    }
}

impl From<o2ims_transport::TransportError> for NotifyError {
    fn from(source: o2ims_transport::TransportError) -> Self {
        Self::Delivery { source }
    }
}

impl From<sqlx::Error> for NotifyError {
    fn from(source: sqlx::Error) -> Self {
        Self::Listen { source }
    }
}

impl From<NotifyError> for CoreError {
    fn from(error: NotifyError) -> Self {
        match error {
            NotifyError::Repository { source } => source.into(),
            NotifyError::Delivery { source } => source.into(),
            NotifyError::Listen { source } => CoreError::transient(source.to_string()),
        }
    }
}
