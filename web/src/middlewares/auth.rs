use std::sync::LazyLock;

use async_trait::async_trait;
use axum_login::{AuthManagerLayer, AuthManagerLayerBuilder, AuthnBackend, UserId};
use password_auth::{generate_hash, verify_password};
use snippetbox_db::{
    DbPool,
    entities::user::{User, UserCredentials},
    session_store::SqliteSessionStore,
};
use tokio::task::{self, JoinHandle};
use tower_sessions::{
    Expiry, Session, SessionManagerLayer,
    cookie::{Key, SameSite, time::Duration},
    service::SignedCookie,
    session_store,
};

use crate::{error::Error, middlewares::flash::FLASH_KEY, state::AppState};

// We use a type alias for convenience.
//
// Note that we've supplied our concrete backend here.
pub type AuthSession = axum_login::AuthSession<AuthBackend>;

pub type AuthLayer = AuthManagerLayer<AuthBackend, SqliteSessionStore, SignedCookie>;

/// Verified against when the email is unknown, so that a failed login costs
/// one Argon2 verification whether or not the account exists.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| generate_hash("snippetbox-dummy-password"));

/// Computes the dummy hash up front instead of on the first failed login.
pub fn precompute_dummy_hash() {
    LazyLock::force(&DUMMY_HASH);
}

#[derive(Debug, Clone)]
pub struct AuthBackend {
    db: DbPool,
}

impl AuthBackend {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

// ------------------------------------------------------------------------
/// Specific authentication related queries for the User entity.
/// ------------------------------------------------------------------------
#[async_trait]
impl AuthnBackend for AuthBackend {
    type User = User;
    type Credentials = UserCredentials;
    type Error = Error;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let user: Option<Self::User> = User::try_get_by_email(creds.email.trim(), &self.db).await?;
        // Verifying the password is blocking and potentially slow, so we'll do so via
        // `spawn_blocking`.
        task::spawn_blocking(move || {
            let hash = user
                .as_ref()
                .map_or(DUMMY_HASH.as_str(), |user| user.hashed_password.as_str());
            let verified = verify_password(creds.password, hash).is_ok();

            Ok(user.filter(|_| verified))
        })
        .await
        .map_err(|e| Error::Unexpected(e.into()))?
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        let user = User::try_get_by_id(user_id, &self.db).await?;
        Ok(user)
    }
}

/// Ends the authenticated session.
///
/// `session` must be the session `auth_session` was extracted from. The old
/// session row is deleted and the response carries a fresh token. Pending
/// flash messages move over to the new session; everything else, including
/// the authenticated user id, is gone.
pub async fn sign_out(auth_session: &mut AuthSession, session: &Session) -> Result<(), Error> {
    let flashes: Option<serde_json::Value> = session.get(FLASH_KEY).await?;

    auth_session
        .logout()
        .await
        .map_err(|e| Error::Unexpected(e.into()))?;
    // `logout` flushes the session but keeps the cached record's id, cycling
    // makes sure the next save goes through `SessionStore::create`.
    session.cycle_id().await?;

    if let Some(flashes) = flashes {
        session.insert(FLASH_KEY, flashes).await?;
    }

    Ok(())
}

/// ------------------------------------------------------------------------
/// A convenience struct to build and manage the authentication session.
/// ------------------------------------------------------------------------
/// # Returns
///
/// A struct that contains the deletion task for cleanup
/// and the auth layer middleware for our router.
///
/// ------------------------------------------------------------------------
pub struct AuthSessionManager {
    pub deletion_task: JoinHandle<Result<(), session_store::Error>>,
    pub auth_layer: AuthLayer,
}

impl AuthSessionManager {
    pub fn new(app_state: &AppState) -> Self {
        let session_config = &app_state.config.session;
        let session_store = SqliteSessionStore::new(app_state.db_pool.clone());

        let deletion_task = tokio::task::spawn(
            session_store
                .clone()
                .delete_expired_every(session_config.cleanup_interval()),
        );

        // Generate a cryptographic key to sign the session cookie.
        let key = Key::generate();

        let session_layer = SessionManagerLayer::new(session_store)
            .with_name("id")
            .with_secure(session_config.secure_cookie)
            .with_http_only(true)
            .with_same_site(SameSite::Strict)
            .with_expiry(Expiry::OnInactivity(Duration::hours(
                session_config.lifetime_hours,
            )))
            .with_signed(key);

        // Auth service.
        //
        // This combines the session layer with our backend to establish the auth
        // service which will provide the auth session as a request extension.
        let backend = AuthBackend::new(app_state.db_pool.clone());
        let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

        Self {
            deletion_task,
            auth_layer,
        }
    }
}
