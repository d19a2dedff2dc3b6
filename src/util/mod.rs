//! Shared utilities

pub mod config;
pub mod diagnostic;

pub use config::{Config, LoaderSettings};
pub use diagnostic::Diagnostic;
