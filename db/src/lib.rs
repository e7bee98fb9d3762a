use std::borrow::Cow;

use snippetbox_config::Config;
use sqlx::migrate::MigrateDatabase as _;
use sqlx::{Sqlite, Transaction, sqlite::SqlitePoolOptions};

pub use sqlx::SqlitePool as DbPool;
pub use sqlx::test as db_test;
pub use validator::{Validate, ValidationErrors};

/// Entity definitions and related general queries.
pub mod entities;
/// Idempotent schema bootstrap run on every start.
pub mod schema;
/// Durable storage for `tower-sessions`.
pub mod session_store;

/// Starts a new database transaction.
///
/// Example:
/// ```
/// let mut tx = transaction(&app_state.db_pool).await?;
/// let user = User::create(form, &mut *tx).await?;
/// tx.commit().await?;
/// ```
///
/// Transactions are rolled back automatically when they are dropped without having been committed.
pub async fn transaction(db_pool: &DbPool) -> Result<Transaction<'static, Sqlite>, Error> {
    let tx = db_pool.begin().await?;

    Ok(tx)
}

/// Creates a connection pool to the database specified in the passed [`snippetbox_config::DatabaseConfig`]
pub async fn connect_pool(config: &Config) -> Result<DbPool, Error> {
    let mut options = SqlitePoolOptions::new();
    // Every connection to `sqlite::memory:` opens a database of its own.
    if config.database.url.contains(":memory:") {
        options = options.max_connections(1).idle_timeout(None).max_lifetime(None);
    }

    let pool = options.connect(&config.database.url).await?;

    Ok(pool)
}

/// Create a database if it does not exist.
/// Used by the `db` CLI and wherever a database
/// file is expected before the app boots.
pub async fn create_database_if_not_exists(config: &Config) -> Result<(), Error> {
    if !Sqlite::database_exists(&config.database.url).await? {
        Sqlite::create_database(&config.database.url).await?
    };
    Ok(())
}

/// Errors that can occur as a result of a data layer operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No record was found, e.g. when loading a record by ID. This variant is different from
    /// `Error::DatabaseError(sqlx::Error::RowNotFound)` in that the latter indicates a bug, and
    /// `Error::NoRecordFound` does not. It merely originates from [sqlx::Executor::fetch_optional]
    /// returning `None`.
    #[error("no record found")]
    NoRecordFound,
    /// Return `422 Unprocessable Entity` on a unique constraint error.
    #[error("unique constraint error")]
    UniqueConstraint(Vec<(String, String)>),
    /// General database error, e.g. communicating with the database failed
    #[error("database query failed")]
    DatabaseError(#[from] sqlx::Error),
    /// An invalid changeset was passed to a writing operation such as creating or updating a record.
    #[error("validation failed")]
    ValidationError(#[from] validator::ValidationErrors),
    /// An error occurred while hashing a password.
    #[error("password hashing failed")]
    PasswordHashError(#[from] argon2::password_hash::Error),
}

impl Error {
    /// Whether this is a unique constraint violation on the given column.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        match self {
            Error::UniqueConstraint(fields) => fields.iter().any(|(field, _)| field == column),
            _ => false,
        }
    }
}

/// ------------------------------------------------------------------------------------------
/// A little helper trait for more easily converting database constraint errors into API errors.
/// ------------------------------------------------------------------------------------------
/// ```rust,ignore
/// let user = sqlx::query_as::<_, User>(
///     "insert into users (name, email, hashed_password, created) values (?, ?, ?, ?) returning *",
/// )
/// .bind(name)
/// .bind(email)
/// .bind(hashed_password)
/// .bind(created)
/// .fetch_one(executor)
/// .await
/// .map_constraint_err()?;
/// ```
pub trait ResultExt<T> {
    /// If `self` contains a SQLx database unique constraint error,
    /// transform the error into [`Error::UniqueConstraint`].
    ///
    /// Otherwise, the result is passed through unchanged.
    fn map_constraint_err(self) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn map_constraint_err(self) -> Result<T, Error> {
        self.map_err(|e| match e.into() {
            Error::DatabaseError(sqlx::Error::Database(dbe))
                if dbe.code() == Some(Cow::Borrowed("2067")) =>
            {
                let (_, field) = dbe
                    .message()
                    .strip_prefix("UNIQUE constraint failed: ") // strip down to table.field
                    .and_then(|s| s.split_once('.'))
                    .unwrap_or_default(); // return an empty string if parsing fails

                Error::UniqueConstraint(vec![(field.to_string(), dbe.message().to_string())])
            }
            e => e, // Pass the error through unchanged if not a sqlx error
        })
    }
}
