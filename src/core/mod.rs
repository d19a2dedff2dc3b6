//! Core data structures shared by the host and by backend modules.
//!
//! - Class and interface identifiers (`ClassId`, `Interface`)
//! - Capability sets
//! - The `Backend` object trait and its per-interface operation traits

pub mod interface;
pub mod object;

pub use interface::{CapabilitySet, ClassId, Interface};
pub use object::{
    Backend, Compile3Request, CompileRequest, Compiler, Compiler3, Define, IncludeHandler,
    OperationResult, PreprocessRequest, Validator, Validator2, ValidatorFlags, VersionInfo,
};
