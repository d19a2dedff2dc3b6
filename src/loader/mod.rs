//! Module loading and external-validator composition.
//!
//! # Architecture
//!
//! ```text
//!                 ┌────────────────┐
//!                 │  ExtValLoader  │ obtain(class, interface)
//!                 └───────┬────────┘
//!          substitution   │   disabled or failed
//!          active         │
//!        ┌────────────────┴────────────────┐
//!        ▼                                 ▼
//!  ┌──────────────────────────┐    ┌───────────────┐
//!  │ ExternalValidationRouter │    │ compiler      │
//!  │  primary    secondary    │    │ module object │
//!  └──────────────────────────┘    └───────────────┘
//! ```
//!
//! - **DllSupport** - loads one module and binds its factory (in `dll.rs`)
//! - **BackendHandle** - owns one backend object (in `handle.rs`)
//! - **ExternalValidationRouter** - routes per interface (in `router.rs`)
//! - **Instance** - reference-counted capability view (in `instance.rs`)
//! - **ExtValLoader** - the entry point (in `extval.rs`)

pub mod args;
pub mod dll;
pub mod errors;
pub mod extval;
pub mod handle;
pub mod instance;
pub mod router;

pub use args::{add_disable_validation_arg, DISABLE_VALIDATION_ARG};
pub use dll::{
    resolve_module_path, BackendFactory, CreateInstanceFn, CreateInstanceResult, DllSupport,
    DylibLoader, InstanceFactory, LibraryLoader, ENTRY_POINT,
};
pub use errors::{ConfigError, ExtValError, ExtValResult, LoadError};
pub use extval::{ExtValLoader, LoaderConfig, LoaderStatus};
pub use handle::{BackendHandle, Role};
pub use instance::Instance;
pub use router::ExternalValidationRouter;
