pub mod auth;
pub mod flash;
pub mod headers;
