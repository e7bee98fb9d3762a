use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection};
use time::OffsetDateTime;
use tower_sessions::{
    ExpiredDeletion, SessionStore,
    session::{Id, Record},
    session_store,
};
use tracing::{debug, error};

use crate::DbPool;

/// Session payload as persisted in `sessions.data`.
type Data = HashMap<String, serde_json::Value>;

#[derive(thiserror::Error, Debug)]
pub enum SessionStoreError {
    /// A sqlx error.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    /// The session payload could not be encoded or decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The stored expiry is not a valid timestamp.
    #[error(transparent)]
    Timestamp(#[from] time::error::ComponentRange),
}

impl From<SessionStoreError> for session_store::Error {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::Json(inner) => session_store::Error::Decode(inner.to_string()),
            SessionStoreError::Timestamp(inner) => session_store::Error::Decode(inner.to_string()),
            SessionStoreError::Sqlx(inner) => session_store::Error::Backend(inner.to_string()),
        }
    }
}

/// ------------------------------------------------------------------------
/// A `tower-sessions` store backed by the `sessions` table.
/// ------------------------------------------------------------------------
///
/// Tokens are generated by `tower-sessions` and treated as opaque here. The
/// session payload is stored as JSON in `data`, the absolute expiry as a unix
/// timestamp in `expiry`. Rows past their expiry are never returned by
/// [`SessionStore::load`] and are purged by [`ExpiredDeletion::delete_expired`].
///
/// The table itself is created by [`crate::schema::initialize`].
/// ------------------------------------------------------------------------
#[derive(Clone, Debug)]
pub struct SqliteSessionStore {
    pool: DbPool,
}

impl SqliteSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs [`ExpiredDeletion::delete_expired`] every `period` until the task
    /// is aborted or a sweep fails.
    pub async fn delete_expired_every(
        self,
        period: std::time::Duration,
    ) -> session_store::Result<()> {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(err) = self.delete_expired().await {
                error!("failed to purge expired sessions: {:?}", err);
                return Err(err);
            }
        }
    }

    async fn token_exists(
        &self,
        conn: &mut SqliteConnection,
        token: &Id,
    ) -> Result<bool, SessionStoreError> {
        let exists: bool =
            sqlx::query_scalar("select exists(select 1 from sessions where token = ?)")
                .bind(token.to_string())
                .fetch_one(conn)
                .await?;

        Ok(exists)
    }

    async fn upsert(
        &self,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        record: &Record,
    ) -> Result<(), SessionStoreError> {
        let data = serde_json::to_vec(&record.data)?;

        sqlx::query(
            r#"
            insert into sessions (token, data, expiry) values (?, ?, ?)
            on conflict(token) do update set
                data = excluded.data,
                expiry = excluded.expiry
            "#,
        )
        .bind(record.id.to_string())
        .bind(data)
        .bind(record.expiry_date.unix_timestamp())
        .execute(executor)
        .await?;

        Ok(())
    }

    async fn load_record(&self, token: &Id) -> Result<Option<Record>, SessionStoreError> {
        let row: Option<(Vec<u8>, i64)> =
            sqlx::query_as("select data, expiry from sessions where token = ? and expiry > ?")
                .bind(token.to_string())
                .bind(OffsetDateTime::now_utc().unix_timestamp())
                .fetch_optional(&self.pool)
                .await?;

        let Some((data, expiry)) = row else {
            return Ok(None);
        };

        Ok(Some(Record {
            id: *token,
            data: serde_json::from_slice::<Data>(&data)?,
            expiry_date: OffsetDateTime::from_unix_timestamp(expiry)?,
        }))
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut tx = self.pool.begin().await.map_err(SessionStoreError::Sqlx)?;

        while self.token_exists(&mut tx, &record.id).await? {
            record.id = Id::default();
        }
        self.upsert(&mut *tx, record).await?;

        tx.commit().await.map_err(SessionStoreError::Sqlx)?;

        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.upsert(&self.pool, record).await?;

        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self.load_record(session_id).await?)
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        sqlx::query("delete from sessions where token = ?")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(SessionStoreError::Sqlx)?;

        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SqliteSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let result = sqlx::query("delete from sessions where expiry <= ?")
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await
            .map_err(SessionStoreError::Sqlx)?;

        debug!("purged {} expired sessions", result.rows_affected());

        Ok(())
    }
}
