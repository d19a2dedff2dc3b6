//! Extval - shader compiler loading with optional external validation
//!
//! This crate loads the shader compiler module and, when configured, a
//! substitute validator module, and presents both behind one object that
//! answers every interface either of them supports.

pub mod core;
pub mod loader;
pub mod util;

/// Test utilities and mocks for extval unit tests.
///
/// Only compiled for tests. Provides in-memory modules and backends that
/// record every call and drop.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{ClassId, Interface};
pub use loader::{ExtValError, ExtValLoader, Instance};
pub use util::config::LoaderSettings;
