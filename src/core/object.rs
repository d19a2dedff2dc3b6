//! Backend object trait and per-interface operation traits.
//!
//! A module's factory hands back a `Box<dyn Backend>`. The object reports
//! the interfaces it answers and exposes each one through an `as_*`
//! accessor. Operations return `anyhow::Result` because they cross into
//! module code the host does not control.

use anyhow::Result;

use crate::core::interface::CapabilitySet;

/// A preprocessor define passed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    /// Macro name
    pub name: String,

    /// Optional value (None means defined without a value)
    pub value: Option<String>,
}

impl Define {
    /// Create a define without a value.
    pub fn simple(name: impl Into<String>) -> Self {
        Define {
            name: name.into(),
            value: None,
        }
    }

    /// Create a define with a value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Define {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Parse `NAME` or `NAME=VALUE`.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((name, value)) => Define::with_value(name, value),
            None => Define::simple(spec),
        }
    }
}

impl std::fmt::Display for Define {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value {
            Some(ref value) => write!(f, "{}={}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Loads files named by `#include` directives.
pub trait IncludeHandler: Send + Sync {
    fn load_source(&self, filename: &str) -> Result<Vec<u8>>;
}

/// Arguments to a classic compile call.
#[derive(Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a [u8],
    pub source_name: &'a str,
    pub entry_point: &'a str,
    pub target_profile: &'a str,
    pub arguments: &'a [String],
    pub defines: &'a [Define],
    pub include_handler: Option<&'a dyn IncludeHandler>,
}

impl<'a> CompileRequest<'a> {
    /// Same request with a different argument list.
    pub fn with_arguments<'b>(&self, arguments: &'b [String]) -> CompileRequest<'b>
    where
        'a: 'b,
    {
        CompileRequest { arguments, ..*self }
    }
}

/// Arguments to a classic preprocess call.
#[derive(Clone, Copy)]
pub struct PreprocessRequest<'a> {
    pub source: &'a [u8],
    pub source_name: &'a str,
    pub arguments: &'a [String],
    pub defines: &'a [Define],
    pub include_handler: Option<&'a dyn IncludeHandler>,
}

/// Arguments to a modern compile call. Entry point, profile and defines
/// travel inside `arguments`.
#[derive(Clone, Copy)]
pub struct Compile3Request<'a> {
    pub source: &'a [u8],
    pub arguments: &'a [String],
    pub include_handler: Option<&'a dyn IncludeHandler>,
}

impl<'a> Compile3Request<'a> {
    /// Same request with a different argument list.
    pub fn with_arguments<'b>(&self, arguments: &'b [String]) -> Compile3Request<'b>
    where
        'a: 'b,
    {
        Compile3Request { arguments, ..*self }
    }
}

/// Outcome of a compile, preprocess or validate call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub succeeded: bool,

    /// Primary output (object code, preprocessed text, signed container)
    pub output: Vec<u8>,

    /// Error and warning text
    pub errors: String,
}

impl OperationResult {
    pub fn success(output: impl Into<Vec<u8>>) -> Self {
        OperationResult {
            succeeded: true,
            output: output.into(),
            errors: String::new(),
        }
    }

    pub fn failure(errors: impl Into<String>) -> Self {
        OperationResult {
            succeeded: false,
            output: Vec::new(),
            errors: errors.into(),
        }
    }
}

/// Flags accepted by `Validator::validate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ValidatorFlags(pub u32);

impl ValidatorFlags {
    pub const DEFAULT: ValidatorFlags = ValidatorFlags(0);
    /// Validator may modify the container in place (signing)
    pub const IN_PLACE_EDIT: ValidatorFlags = ValidatorFlags(1);
    pub const ROOT_SIGNATURE_ONLY: ValidatorFlags = ValidatorFlags(2);
    pub const MODULE_ONLY: ValidatorFlags = ValidatorFlags(4);

    pub fn contains(self, other: ValidatorFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ValidatorFlags {
    type Output = ValidatorFlags;

    fn bitor(self, rhs: ValidatorFlags) -> ValidatorFlags {
        ValidatorFlags(self.0 | rhs.0)
    }
}

/// Classic compiler interface.
pub trait Compiler: Send + Sync {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<OperationResult>;

    fn preprocess(&self, request: &PreprocessRequest<'_>) -> Result<OperationResult>;

    /// Disassemble compiled object code to text.
    fn disassemble(&self, object: &[u8]) -> Result<String>;
}

/// Modern compiler interface.
pub trait Compiler3: Send + Sync {
    fn compile(&self, request: &Compile3Request<'_>) -> Result<OperationResult>;

    fn disassemble(&self, object: &[u8]) -> Result<OperationResult>;
}

/// Basic validator interface.
pub trait Validator: Send + Sync {
    fn validate(&self, shader: &[u8], flags: ValidatorFlags) -> Result<OperationResult>;
}

/// Validator interface that also accepts debug bitcode.
pub trait Validator2: Send + Sync {
    fn validate_with_debug(
        &self,
        shader: &[u8],
        flags: ValidatorFlags,
        debug_bitcode: Option<&[u8]>,
    ) -> Result<OperationResult>;
}

/// Version query.
pub trait VersionInfo: Send + Sync {
    fn version(&self) -> Result<semver::Version>;
}

/// An instantiated backend object.
///
/// `interfaces` must list exactly the interfaces whose accessor returns
/// `Some`, plus `Interface::Unknown`.
pub trait Backend: Send + Sync {
    /// Interfaces this object answers.
    fn interfaces(&self) -> CapabilitySet;

    fn as_compiler(&self) -> Option<&dyn Compiler> {
        None
    }

    fn as_compiler3(&self) -> Option<&dyn Compiler3> {
        None
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        None
    }

    fn as_validator2(&self) -> Option<&dyn Validator2> {
        None
    }

    fn as_version_info(&self) -> Option<&dyn VersionInfo> {
        None
    }
}
