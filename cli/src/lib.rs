//! The snippetbox-cli crate implements the project's `db` CLI tool as well as functionality for displaying information in a console UI.

/// Utilities for CLIs
pub mod util;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] snippetbox_config::Error),
    #[error("Database error")]
    Database(#[from] snippetbox_db::Error),
    #[error("Database error")]
    Sqlx(#[from] sqlx::Error),
    #[error("Filesystem io error")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] color_eyre::Report),
}
