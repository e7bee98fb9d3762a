pub mod session;
pub mod snippet;
pub mod user;
