pub mod auth;
pub mod home;
pub mod ping;
pub mod snippets;
