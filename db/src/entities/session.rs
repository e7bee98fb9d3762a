use sqlx::prelude::FromRow;

/// A raw row of the `sessions` table.
///
/// Only [`crate::session_store::SqliteSessionStore`] writes these; the struct
/// exists so the rows can be inspected directly, e.g. in tests.
#[derive(Clone, FromRow, Debug)]
pub struct Session {
    pub token: String,
    pub data: Vec<u8>,
    pub expiry: i64,
}
