//! One-time notifications (aka flash messages) kept in the session.
//!
//! # Example
//!
//! ```
//! async fn root(flashes: IncomingFlashes) -> String {
//!     flashes
//!         .iter()
//!         .map(|(level, text)| format!("{level}: {text}"))
//!         .collect()
//! }
//!
//! async fn set_flash(flash: Flash) -> Result<Redirect, Error> {
//!     flash.info("Hi from flash!").await?;
//!     Ok(Redirect::to("/"))
//! }
//! ```
//!
//! Messages survive until the next request that extracts [`IncomingFlashes`].
//! Because they live in the session they are carried over when the session
//! token is regenerated on login and logout.

use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session};

/// Session key the pending messages are stored under.
pub const FLASH_KEY: &str = "flash";

/// Extractor for setting outgoing flash messages.
#[derive(Clone, Debug)]
pub struct Flash {
    session: Session,
}

impl Flash {
    /// Push an `Info` flash message.
    pub async fn info(&self, message: impl Into<String>) -> Result<(), session::Error> {
        self.push(Level::Info, message).await
    }

    /// Push a `Success` flash message.
    pub async fn success(&self, message: impl Into<String>) -> Result<(), session::Error> {
        self.push(Level::Success, message).await
    }

    /// Push an `Error` flash message.
    pub async fn error(&self, message: impl Into<String>) -> Result<(), session::Error> {
        self.push(Level::Error, message).await
    }

    /// Push a flash message with the given level and message.
    pub async fn push(&self, level: Level, message: impl Into<String>) -> Result<(), session::Error> {
        let mut flashes: Vec<FlashMessage> =
            self.session.get(FLASH_KEY).await?.unwrap_or_default();
        flashes.push(FlashMessage {
            level,
            message: message.into(),
        });

        self.session.insert(FLASH_KEY, flashes).await
    }

    /// Like [`Flash::push`], for when the work the message reports on is
    /// already done and losing the message must not fail the request.
    pub async fn push_or_log(&self, level: Level, message: impl Into<String>) {
        if let Err(err) = self.push(level, message).await {
            tracing::error!("failed to store flash message: {:?}", err);
        }
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        Ok(Self { session })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

/// Verbosity level of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Allow the level to be printed or rendered as text
impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Success => write!(f, "success"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// Extractor for incoming flash messages.
///
/// Extracting removes the messages from the session, so each one is shown once.
#[derive(Clone, Debug, Default)]
pub struct IncomingFlashes {
    pub flashes: Vec<FlashMessage>,
}

impl IncomingFlashes {
    /// Get an iterator over the flash messages.
    pub fn iter(&self) -> impl Iterator<Item = (Level, &str)> {
        self.flashes
            .iter()
            .map(|flash| (flash.level, flash.message.as_str()))
    }

    /// Whether there are any flash messages or not.
    pub fn is_empty(&self) -> bool {
        self.flashes.is_empty()
    }
}

impl<S> FromRequestParts<S> for IncomingFlashes
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let flashes = session
            .remove::<Vec<FlashMessage>>(FLASH_KEY)
            .await
            .map_err(|err| {
                tracing::error!("failed to read flash messages: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to read flash messages")
            })?
            .unwrap_or_default();

        Ok(Self { flashes })
    }
}
