use chrono::{Duration, Utc};
use sqlx::{Executor as _, Sqlite};
use tracing::info;

use crate::{DbPool, Error, entities::snippet::Snippet, transaction};

/// A snippet inserted when the `snippets` table is first found empty.
pub struct SeedSnippet {
    pub title: &'static str,
    pub content: &'static str,
    pub lifetime_days: i64,
}

pub const SEED_SNIPPETS: [SeedSnippet; 3] = [
    SeedSnippet {
        title: "An old silent pond",
        content: "An old silent pond...\nA frog jumps into the pond,\nsplash! Silence again.\n\n– Matsuo Bashō",
        lifetime_days: 365,
    },
    SeedSnippet {
        title: "Over the wintry forest",
        content: "Over the wintry\nforest, winds howl in rage\nwith no leaves to blow.\n\n– Natsume Soseki",
        lifetime_days: 365,
    },
    SeedSnippet {
        title: "First autumn morning",
        content: "First autumn morning\nthe mirror I stare into\nshows my father's face.\n\n– Murakami Kijo",
        lifetime_days: 7,
    },
];

const CREATE_SNIPPETS: &str = r#"
    CREATE TABLE IF NOT EXISTS snippets (
        id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(100) NOT NULL,
        content TEXT NOT NULL,
        created DATETIME NOT NULL,
        expires DATETIME NOT NULL
    )
"#;

const CREATE_SESSIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token CHAR(22) NOT NULL PRIMARY KEY,
        data BLOB NOT NULL,
        expiry INTEGER NOT NULL
    )
"#;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        hashed_password TEXT NOT NULL,
        created DATETIME NOT NULL,
        CONSTRAINT users_uc_email UNIQUE (email)
    )
"#;

/// Brings the schema into the shape the app expects.
///
/// Every step is idempotent on its own, so this runs on each start regardless
/// of what a previous run left behind:
///
/// 1. tables are created with `IF NOT EXISTS`
/// 2. indexes are created only when `sqlite_master` does not list them yet
/// 3. seed snippets are inserted only into an empty `snippets` table
///
/// The first failing step aborts initialization and its error is returned.
pub async fn initialize(pool: &DbPool) -> Result<(), Error> {
    pool.execute(CREATE_SNIPPETS).await?;

    if create_index_if_missing(pool, "idx_snippets_created", "snippets(created)").await? {
        info!("created index on snippets.created");
    }

    if seed_snippets_if_empty(pool).await? {
        info!("inserted sample data into snippets table");
    }

    pool.execute(CREATE_SESSIONS).await?;

    if create_index_if_missing(pool, "sessions_expiry_idx", "sessions(expiry)").await? {
        info!("created index on sessions.expiry");
    }

    pool.execute(CREATE_USERS).await?;

    info!("database schema initialized successfully");

    Ok(())
}

/// Whether an index with the given name is present in the catalog.
pub async fn index_exists(
    name: &str,
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
) -> Result<bool, Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?)",
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(exists)
}

async fn create_index_if_missing(pool: &DbPool, name: &str, target: &str) -> Result<bool, Error> {
    if index_exists(name, pool).await? {
        return Ok(false);
    }

    // Index and table names are compile time constants; they cannot be bound.
    pool.execute(format!("CREATE INDEX {name} ON {target}").as_str())
        .await?;

    Ok(true)
}

async fn seed_snippets_if_empty(pool: &DbPool) -> Result<bool, Error> {
    let mut tx = transaction(pool).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snippets")
        .fetch_one(&mut *tx)
        .await?;

    if count > 0 {
        return Ok(false);
    }

    let now = Utc::now();
    for seed in &SEED_SNIPPETS {
        Snippet::insert(
            seed.title,
            seed.content,
            Duration::days(seed.lifetime_days),
            now,
            &mut *tx,
        )
        .await?;
    }

    tx.commit().await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count_snippets(pool: &DbPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM snippets")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn count_indexes(pool: &DbPool) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name IN ('idx_snippets_created', 'sessions_expiry_idx')",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn initialize_creates_tables_indexes_and_seed_data(pool: DbPool) {
        initialize(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('snippets', 'sessions', 'users') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["sessions", "snippets", "users"]);
        assert!(index_exists("idx_snippets_created", &pool).await.unwrap());
        assert!(index_exists("sessions_expiry_idx", &pool).await.unwrap());
        assert_eq!(count_snippets(&pool).await, 3);
    }

    #[sqlx::test]
    async fn initialize_twice_does_not_reseed_or_duplicate_indexes(pool: DbPool) {
        initialize(&pool).await.unwrap();
        initialize(&pool).await.unwrap();

        assert_eq!(count_snippets(&pool).await, 3);
        assert_eq!(count_indexes(&pool).await, 2);
    }

    #[sqlx::test]
    async fn initialize_does_not_seed_a_non_empty_table(pool: DbPool) {
        pool.execute(CREATE_SNIPPETS).await.unwrap();
        Snippet::insert("Mine", "kept", Duration::days(1), Utc::now(), &pool)
            .await
            .unwrap();

        initialize(&pool).await.unwrap();

        let titles: Vec<String> = sqlx::query_scalar("SELECT title FROM snippets")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(titles, vec!["Mine"]);
    }

    #[sqlx::test]
    async fn seeded_snippets_expire_as_configured(pool: DbPool) {
        initialize(&pool).await.unwrap();

        let lifetimes: Vec<(String, i64)> = sqlx::query_as(
            "SELECT title, CAST(ROUND(julianday(expires) - julianday(created)) AS INTEGER) FROM snippets ORDER BY id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(
            lifetimes,
            vec![
                ("An old silent pond".to_string(), 365),
                ("Over the wintry forest".to_string(), 365),
                ("First autumn morning".to_string(), 7),
            ]
        );
    }
}
