/// Console output for the CLI binaries.
pub mod ui;
