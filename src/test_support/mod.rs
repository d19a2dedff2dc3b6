//! Test utilities and mocks for extval unit tests.
//!
//! Real modules are native libraries, which unit tests cannot build. These
//! mocks stand in for both sides of the module boundary:
//!
//! - `MockLibraryLoader` - in-memory modules keyed by path, with scripted
//!   load failures and a count of every open attempt
//! - `MockBackend` - a backend answering a chosen interface set, recording
//!   each call and its own drop into a shared `EventLog`
//!
//! # Example
//!
//! ```rust,ignore
//! let log = event_log();
//! let modules = MockLibraryLoader::new();
//! modules.add_module("/lib/libdxcompiler.so", compiler_module(&log));
//!
//! // ... exercise the loader ...
//!
//! assert_eq!(*log.lock().unwrap(), vec!["compiler.compile(-O2 -Vd)"]);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::core::{
    Backend, CapabilitySet, ClassId, Compile3Request, CompileRequest, Compiler, Compiler3,
    Interface, OperationResult, PreprocessRequest, Validator, Validator2, ValidatorFlags,
    VersionInfo,
};
use crate::loader::dll::{BackendFactory, CreateInstanceResult, LibraryLoader};
use crate::loader::errors::LoadError;

/// Version reported by `MockBackend::compiler`.
pub const COMPILER_VERSION: semver::Version = semver::Version::new(1, 8, 2505);

/// Version reported by `MockBackend::validator`.
pub const VALIDATOR_VERSION: semver::Version = semver::Version::new(1, 9, 2602);

/// Ordered record of calls and drops, shared between mocks.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Create an empty event log.
pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Backend that records every call as `name.operation(detail)` and its
/// drop as `name.drop`.
pub struct MockBackend {
    pub name: String,
    pub version: semver::Version,
    interfaces: CapabilitySet,
    log: EventLog,
}

impl MockBackend {
    /// A backend answering exactly `interfaces`.
    pub fn with_interfaces(name: impl Into<String>, interfaces: &[Interface], log: &EventLog) -> Self {
        MockBackend {
            name: name.into(),
            version: semver::Version::new(0, 1, 0),
            interfaces: CapabilitySet::from_interfaces(interfaces),
            log: Arc::clone(log),
        }
    }

    /// A compiler object: both compiler APIs plus version info.
    pub fn compiler(log: &EventLog) -> Self {
        let mut backend = Self::with_interfaces(
            "compiler",
            &[
                Interface::Unknown,
                Interface::Compiler,
                Interface::Compiler3,
                Interface::VersionInfo,
            ],
            log,
        );
        backend.version = COMPILER_VERSION;
        backend
    }

    /// A validator object: both validator APIs plus version info.
    pub fn validator(log: &EventLog) -> Self {
        let mut backend = Self::with_interfaces(
            "validator",
            &[
                Interface::Unknown,
                Interface::Validator,
                Interface::Validator2,
                Interface::VersionInfo,
            ],
            log,
        );
        backend.version = VALIDATOR_VERSION;
        backend
    }

    /// Rename the backend in recorded events.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn record(&self, operation: &str, detail: String) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.{}({})", self.name, operation, detail));
    }

    fn answers(&self, interface: Interface) -> bool {
        self.interfaces.contains(&interface)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.push(format!("{}.drop", self.name));
        }
    }
}

impl Backend for MockBackend {
    fn interfaces(&self) -> CapabilitySet {
        self.interfaces.clone()
    }

    fn as_compiler(&self) -> Option<&dyn Compiler> {
        self.answers(Interface::Compiler)
            .then_some(self as &dyn Compiler)
    }

    fn as_compiler3(&self) -> Option<&dyn Compiler3> {
        self.answers(Interface::Compiler3)
            .then_some(self as &dyn Compiler3)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        self.answers(Interface::Validator)
            .then_some(self as &dyn Validator)
    }

    fn as_validator2(&self) -> Option<&dyn Validator2> {
        self.answers(Interface::Validator2)
            .then_some(self as &dyn Validator2)
    }

    fn as_version_info(&self) -> Option<&dyn VersionInfo> {
        self.answers(Interface::VersionInfo)
            .then_some(self as &dyn VersionInfo)
    }
}

impl Compiler for MockBackend {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<OperationResult> {
        self.record("compile", request.arguments.join(" "));
        Ok(OperationResult::success(
            format!("{}:{}", request.entry_point, request.target_profile).into_bytes(),
        ))
    }

    fn preprocess(&self, request: &PreprocessRequest<'_>) -> Result<OperationResult> {
        self.record("preprocess", request.arguments.join(" "));
        Ok(OperationResult::success(request.source.to_vec()))
    }

    fn disassemble(&self, object: &[u8]) -> Result<String> {
        self.record("disassemble", String::new());
        Ok(format!("; {} bytes", object.len()))
    }
}

impl Compiler3 for MockBackend {
    fn compile(&self, request: &Compile3Request<'_>) -> Result<OperationResult> {
        self.record("compile3", request.arguments.join(" "));
        Ok(OperationResult::success(request.source.to_vec()))
    }

    fn disassemble(&self, object: &[u8]) -> Result<OperationResult> {
        self.record("disassemble3", String::new());
        Ok(OperationResult::success(format!("; {} bytes", object.len())))
    }
}

impl Validator for MockBackend {
    fn validate(&self, shader: &[u8], flags: ValidatorFlags) -> Result<OperationResult> {
        self.record("validate", format!("flags={}", flags.0));
        Ok(OperationResult::success(shader.to_vec()))
    }
}

impl Validator2 for MockBackend {
    fn validate_with_debug(
        &self,
        shader: &[u8],
        flags: ValidatorFlags,
        debug_bitcode: Option<&[u8]>,
    ) -> Result<OperationResult> {
        self.record(
            "validate2",
            format!(
                "flags={}, debug={}",
                flags.0,
                debug_bitcode.map_or(0, <[u8]>::len)
            ),
        );
        Ok(OperationResult::success(shader.to_vec()))
    }
}

impl VersionInfo for MockBackend {
    fn version(&self) -> Result<semver::Version> {
        Ok(self.version.clone())
    }
}

/// Factory standing in for the compiler module.
///
/// Creates compilers, a built-in validator named `builtin-validator`, and
/// bare objects for the helper classes. `ClassId::Other` fails.
pub fn compiler_module(log: &EventLog) -> BackendFactory {
    let log = Arc::clone(log);
    Arc::new(move |class: &ClassId| -> CreateInstanceResult {
        match class {
            ClassId::Compiler => Ok(Box::new(MockBackend::compiler(&log))),
            ClassId::Validator => Ok(Box::new(
                MockBackend::validator(&log).named("builtin-validator"),
            )),
            ClassId::Utils | ClassId::Library | ClassId::ContainerReflection => Ok(Box::new(
                MockBackend::with_interfaces(class.as_str(), &[Interface::Unknown], &log),
            )),
            ClassId::Other(name) => anyhow::bail!("class {} not available", name),
        }
    })
}

/// Factory standing in for an external validator module.
pub fn validator_module(log: &EventLog) -> BackendFactory {
    let log = Arc::clone(log);
    Arc::new(move |class: &ClassId| -> CreateInstanceResult {
        match class {
            ClassId::Validator => Ok(Box::new(MockBackend::validator(&log))),
            other => anyhow::bail!("class {} not available", other),
        }
    })
}

/// In-memory module table.
///
/// Paths that were never registered fail with `LoadError::ModuleNotFound`.
#[derive(Default)]
pub struct MockLibraryLoader {
    modules: Mutex<HashMap<PathBuf, Result<BackendFactory, LoadError>>>,
    opens: Mutex<Vec<PathBuf>>,
}

impl MockLibraryLoader {
    pub fn new() -> Self {
        MockLibraryLoader::default()
    }

    /// Register a module that loads successfully.
    pub fn add_module(&self, path: impl AsRef<Path>, factory: BackendFactory) {
        self.modules
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), Ok(factory));
    }

    /// Register a module whose load fails.
    pub fn add_failure(&self, path: impl AsRef<Path>, error: LoadError) {
        self.modules
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), Err(error));
    }

    /// Number of times `path` was opened.
    pub fn open_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.opens
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() == path)
            .count()
    }
}

impl LibraryLoader for MockLibraryLoader {
    fn open(&self, path: &Path, _symbol: &str) -> Result<BackendFactory, LoadError> {
        self.opens.lock().unwrap().push(path.to_path_buf());

        match self.modules.lock().unwrap().get(path) {
            Some(Ok(factory)) => Ok(Arc::clone(factory)),
            Some(Err(e)) => Err(e.clone()),
            None => Err(LoadError::ModuleNotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}
