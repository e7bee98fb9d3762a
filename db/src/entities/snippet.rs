#[cfg(feature = "test-helpers")]
use fake::{Dummy, faker::lorem::en::*};

use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, prelude::FromRow};
use validator::{Validate, ValidationError};

use crate::Error;

/// How many snippets [`Snippet::latest`] returns at most.
pub const LATEST_LIMIT: i64 = 10;

/// The lifetimes, in days, a snippet can be created with.
pub const PERMITTED_EXPIRES_DAYS: [i64; 3] = [1, 7, 365];

/// A titled piece of text that stops being visible once it expires.
///
/// Snippets are never updated or deleted. Expiry is applied when querying:
/// an expired snippet stays in the table but is indistinguishable from a
/// missing one for every read in this module.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow, PartialEq)]
pub struct Snippet {
    /// The id of the record, assigned in ascending order.
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// A changeset representing a snippet submitted through the create form.
///
/// Changesets are validated in [`Snippet::create`] which returns an [Result::Err] if validation fails.
///
/// Changesets can also be used to generate fake data for tests when the `test-helpers` feature is enabled:
///
/// ```
/// let snippet_changeset: SnippetChangeset = Faker.fake();
/// ```
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
#[cfg_attr(feature = "test-helpers", derive(Dummy))]
pub struct SnippetChangeset {
    #[cfg_attr(feature = "test-helpers", dummy(faker = "Sentence(2..6)"))]
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "This field cannot be more than 100 characters long")
    )]
    pub title: String,
    #[cfg_attr(feature = "test-helpers", dummy(faker = "Sentence(6..12)"))]
    #[validate(custom(function = "not_blank"))]
    pub content: String,
    /// Lifetime in days, one of [`PERMITTED_EXPIRES_DAYS`].
    #[cfg_attr(feature = "test-helpers", dummy(expr = "7"))]
    #[validate(custom(function = "permitted_expires"))]
    pub expires: i64,
}

impl Default for SnippetChangeset {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: 365,
        }
    }
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank")
            .with_message(Cow::Borrowed("This field cannot be blank")));
    }
    Ok(())
}

fn permitted_expires(value: i64) -> Result<(), ValidationError> {
    if !PERMITTED_EXPIRES_DAYS.contains(&value) {
        return Err(ValidationError::new("permitted_expires")
            .with_message(Cow::Borrowed("This field must equal 1, 7 or 365")));
    }
    Ok(())
}

impl Snippet {
    /// Validates the changeset and stores it as a snippet created now.
    pub async fn create(
        snippet: SnippetChangeset,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Snippet, Error> {
        snippet.validate()?;

        Self::insert(
            &snippet.title,
            &snippet.content,
            Duration::days(snippet.expires),
            Utc::now(),
            executor,
        )
        .await
    }

    /// Stores a snippet that expires `lifetime` after `created`.
    pub async fn insert(
        title: &str,
        content: &str,
        lifetime: Duration,
        created: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Snippet, Error> {
        let expires = created + lifetime;

        let snippet = sqlx::query_as::<_, Snippet>(
            r#"
            insert into snippets (title, content, created, expires)
            values (?, ?, ?, ?)
            returning id, title, content, created, expires
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(created)
        .bind(expires)
        .fetch_one(executor)
        .await?;

        Ok(snippet)
    }

    /// Loads an active snippet by id.
    pub async fn load(
        id: i64,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Snippet, Error> {
        Self::load_at(id, Utc::now(), executor).await
    }

    /// Loads a snippet by id if it is still active at `now`.
    pub async fn load_at(
        id: i64,
        now: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Snippet, Error> {
        // Timestamps are stored as UTC RFC 3339 text, which compares in time order.
        let snippet = sqlx::query_as::<_, Snippet>(
            r#"
            select id, title, content, created, expires from snippets
            where expires > ? and id = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(Error::NoRecordFound)?;

        Ok(snippet)
    }

    /// The [`LATEST_LIMIT`] most recently created active snippets, newest first.
    pub async fn latest(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Vec<Snippet>, Error> {
        Self::latest_at(LATEST_LIMIT, Utc::now(), executor).await
    }

    pub async fn latest_at(
        limit: i64,
        now: DateTime<Utc>,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Vec<Snippet>, Error> {
        let snippets = sqlx::query_as::<_, Snippet>(
            r#"
            select id, title, content, created, expires from snippets
            where expires > ?
            order by id desc
            limit ?
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(snippets)
    }
}
