use argon2::{
    Argon2, PasswordHasher,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use axum_login::AuthUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, prelude::FromRow};
use validator::Validate;

#[cfg(feature = "test-helpers")]
use fake::{
    Dummy, Fake, Faker,
    faker::{
        internet::en::{Password, SafeEmail},
        name::en::Name,
    },
};

use super::snippet::not_blank;
use crate::{Error, ResultExt};

#[derive(Clone, FromRow, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

// Here we've implemented `Debug` manually to avoid accidentally logging the
// password hash.
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("hashed_password", &"[redacted]")
            .field("created", &self.created)
            .finish()
    }
}

/// RegisterUser is a changeset for creating a new user.
///
/// Changesets can also be used to generate fake data for tests when the `test-helpers` feature is enabled:
///
/// ```
/// let user: RegisterUser = Faker.fake();
/// ```
#[derive(Deserialize, Validate, Clone, Default)]
#[cfg_attr(feature = "test-helpers", derive(serde::Serialize))]
pub struct RegisterUser {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(
        custom(function = "not_blank"),
        email(message = "This field must be a valid email address")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "This field must be at least 8 characters long"))]
    pub password: String,
}

impl std::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[cfg(feature = "test-helpers")]
impl Dummy<Faker> for RegisterUser {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_: &Faker, rng: &mut R) -> Self {
        Self {
            name: Name().fake_with_rng(rng),
            email: SafeEmail().fake_with_rng(rng),
            password: Password(8..16).fake_with_rng(rng),
        }
    }
}

/// UserCredentials is a changeset for logging in a user.
///
/// `next` carries the page the user originally asked for, so the login form
/// can send them there afterwards.
#[derive(Deserialize, Validate, Clone, Default)]
#[cfg_attr(feature = "test-helpers", derive(serde::Serialize))]
pub struct UserCredentials {
    #[validate(
        custom(function = "not_blank"),
        email(message = "This field must be a valid email address")
    )]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    pub next: Option<String>,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("next", &self.next)
            .finish()
    }
}

/// ------------------------------------------------------------------------
/// Authentication specific implementations for axum_login.
/// ------------------------------------------------------------------------
impl AuthUser for User {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        self.hashed_password.as_bytes()
        // We use the password hash as the auth
        // hash--what this means
        // is when the user changes their password the
        // auth session becomes invalid.
    }
}

impl User {
    pub async fn try_get_by_email(
        email: &str,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"select id, name, email, hashed_password, created from users where email = ?"#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn try_get_by_id(
        id: &i64,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"select id, name, email, hashed_password, created from users where id = ?"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Registers a new user.
    ///
    /// Fails with [`Error::ValidationError`] for malformed input and with
    /// [`Error::UniqueConstraint`] on `email` when the address is taken.
    pub async fn create(
        user: RegisterUser,
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
    ) -> Result<User, Error> {
        user.validate()?;

        let hashed_password = generate_password_hash(&user.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            insert into users (name, email, hashed_password, created)
            values (?, ?, ?, ?)
            returning id, name, email, hashed_password, created
            "#,
        )
        .bind(user.name.trim())
        .bind(user.email.trim())
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
        .map_constraint_err()?; // return an app error if user already exists

        Ok(user)
    }
}

/// ------------------------------------------------------------------------
/// Helper function to generate a password hash using argon2.
/// ------------------------------------------------------------------------
/// # Returns
///
/// A hashed password string in PHC format, salted per call.
/// ------------------------------------------------------------------------
pub fn generate_password_hash(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hashed_password = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(hashed_password)
}
