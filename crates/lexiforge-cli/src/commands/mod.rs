//! CLI command handlers. Each returns the process exit code.

pub mod run;
pub mod validate;
