pub mod static_assets;
pub mod view_engine;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Could not render template
    ///
    /// Return `500 Internal Server Error` on a template rendering error.
    #[error("could not render template")]
    Template(#[from] minijinja::Error),
    /// File io error while reading a template or asset file
    ///
    /// Return a `500 Internal Server Error` on a file io error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
