pub mod app;
pub mod controllers;
pub mod error;
pub mod format;
pub mod middlewares;
pub mod router;
pub mod state;
pub mod tls;
pub mod tracing;
pub mod views;
