use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use color_eyre::eyre;
use tracing::error;

pub type Result<T, E = Error> = color_eyre::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] snippetbox_config::Error),
    /// Could not render template
    ///
    /// Return `500 Internal Server Error` on a template rendering error.
    #[error("could not render template")]
    ViewEngine(#[from] snippetbox_ui::Error),
    /// An error occured while interacting with the database.
    ///
    /// Return `404 Not Found` for missing records, `422 Unprocessable Entity`
    /// for rejected input and `500 Internal Server Error` otherwise.
    #[error("an error occured while interacting with the database")]
    Database(#[from] snippetbox_db::Error),
    /// The session could not be read from or written to its store.
    ///
    /// Return `500 Internal Server Error` on a session error.
    #[error("an error occured while accessing the session")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Tls(#[from] crate::tls::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Enumerate any possible app arrors here.
    ///
    /// Return `500 Internal Server Error` on a `eyre::Error`.
    #[error("Error: {0}")]
    Unexpected(#[from] eyre::Error),
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Database(snippetbox_db::Error::NoRecordFound) => StatusCode::NOT_FOUND,
            Error::Database(snippetbox_db::Error::UniqueConstraint(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::Database(snippetbox_db::Error::ValidationError(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Error::Database(snippetbox_db::Error::NoRecordFound) => {}
            Error::Database(snippetbox_db::Error::UniqueConstraint(ref fields)) => {
                tracing::debug!("unique constraint violated: {:?}", fields);
            }
            Error::Database(snippetbox_db::Error::ValidationError(ref err)) => {
                tracing::debug!("rejected invalid input: {}", err);
            }
            Error::Database(ref err) => {
                error!(
                    "an error occured while interacting with the database: {:?}",
                    err
                );
            }
            Error::ViewEngine(ref err) => {
                error!("an error occured while rendering a template: {:?}", err);
            }
            Error::Session(ref err) => {
                error!("an error occured while accessing the session: {:?}", err);
            }
            Error::Config(ref err) => {
                error!("an error occured while loading configuration: {:?}", err);
            }
            Error::Tls(ref err) => {
                error!("an error occured while configuring tls: {:?}", err);
            }
            Error::Io(ref err) => {
                error!("an io error occured: {:?}", err);
            }
            Error::Unexpected(ref err) => {
                error!("an internal server error occured: {:?}", err);
            }
        }

        // Internals never reach the client, only the status text does.
        let reason = status.canonical_reason().unwrap_or("Internal Server Error");
        (status, reason).into_response()
    }
}
