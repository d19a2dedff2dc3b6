//! Loader facade: the single entry point for obtaining compiler objects.
//!
//! When no substitute validator is configured, or the configured one
//! failed, every request goes straight to the compiler module. Otherwise
//! a request for the compiler class is answered by a fresh
//! `ExternalValidationRouter` over a compiler object and a validator
//! object from the substitute module.
//!
//! Substitution is resolved once per loader. A bad path or a module that
//! does not load disables substitution for the loader's lifetime and is
//! reported once.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::{ClassId, Interface};
use crate::loader::dll::{DllSupport, DylibLoader, LibraryLoader, ENTRY_POINT};
use crate::loader::errors::{ExtValError, ExtValResult};
use crate::loader::handle::{BackendHandle, Role};
use crate::loader::instance::Instance;
use crate::loader::router::ExternalValidationRouter;
use crate::util::config::{resolve_substitute_path, LoaderSettings};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Outcome of resolving the substitute validator.
#[derive(Debug)]
enum Substitution {
    Disabled,
    Active(DllSupport),
    Failed(ExtValError),
}

/// Resolved, latched substitution state.
#[derive(Debug)]
pub struct LoaderConfig {
    dxil_dll_path: Option<PathBuf>,
    substitution: Substitution,
    log: Vec<Diagnostic>,
}

impl LoaderConfig {
    /// Configured substitute path, whether or not it turned out usable.
    pub fn dxil_dll_path(&self) -> Option<&Path> {
        self.dxil_dll_path.as_deref()
    }

    /// Whether compiler requests are being composed.
    pub fn is_active(&self) -> bool {
        matches!(self.substitution, Substitution::Active(_))
    }

    /// Whether substitution was requested but could not be set up.
    pub fn failed_to_load(&self) -> bool {
        matches!(self.substitution, Substitution::Failed(_))
    }

    /// Why substitution was disabled, if it failed.
    pub fn failure(&self) -> Option<&ExtValError> {
        match &self.substitution {
            Substitution::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Diagnostics recorded while resolving.
    pub fn log(&self) -> &[Diagnostic] {
        &self.log
    }

    fn validator(&self) -> Option<&DllSupport> {
        match &self.substitution {
            Substitution::Active(dll) => Some(dll),
            _ => None,
        }
    }
}

/// Loader for compiler objects with optional external validation.
pub struct ExtValLoader {
    settings: LoaderSettings,
    library_loader: Arc<dyn LibraryLoader>,
    compiler: DllSupport,
    config: OnceLock<LoaderConfig>,
}

impl ExtValLoader {
    /// Create a loader that opens modules with the platform loader.
    ///
    /// Nothing is loaded until `initialize` or the first `obtain`.
    pub fn new(settings: LoaderSettings) -> Self {
        Self::with_library_loader(settings, Arc::new(DylibLoader))
    }

    pub fn with_library_loader(
        settings: LoaderSettings,
        library_loader: Arc<dyn LibraryLoader>,
    ) -> Self {
        let compiler = DllSupport::new(
            settings.compiler_library.clone(),
            ENTRY_POINT,
            Arc::clone(&library_loader),
        );

        ExtValLoader {
            settings,
            library_loader,
            compiler,
            config: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// The compiler module.
    pub fn compiler_module(&self) -> &DllSupport {
        &self.compiler
    }

    /// Load the compiler module, then resolve and load the substitute.
    ///
    /// Fails only when the compiler module cannot be loaded. Substitution
    /// problems are latched in the returned config instead.
    pub fn initialize(&self) -> ExtValResult<&LoaderConfig> {
        self.compiler.initialize()?;

        Ok(self.config.get_or_init(|| self.resolve_substitution()))
    }

    fn resolve_substitution(&self) -> LoaderConfig {
        let raw = self.settings.dxil_dll_path.as_deref();
        let dxil_dll_path = raw.filter(|v| !v.is_empty()).map(PathBuf::from);
        let mut log = Vec::new();

        let path = match resolve_substitute_path(raw) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return LoaderConfig {
                    dxil_dll_path,
                    substitution: Substitution::Disabled,
                    log,
                };
            }
            Err(e) => {
                warn!("{}", e);
                log.push(e.to_diagnostic());
                return LoaderConfig {
                    dxil_dll_path,
                    substitution: Substitution::Failed(e.into()),
                    log,
                };
            }
        };

        info!("Loading external dxil module from {}", path.display());
        log.push(Diagnostic::note(format!(
            "Loading external dxil module from {}",
            path.display()
        )));

        let validator = DllSupport::new(&path, ENTRY_POINT, Arc::clone(&self.library_loader))
            .with_label("dxil module");

        // The module loader reports the failure itself.
        let substitution = match validator.initialize() {
            Ok(()) => Substitution::Active(validator),
            Err(e) => {
                log.push(
                    e.to_diagnostic()
                        .with_context("dxil module failed to load")
                        .with_suggestion(suggestions::DISABLE_SUBSTITUTION),
                );
                Substitution::Failed(e.into())
            }
        };

        LoaderConfig {
            dxil_dll_path,
            substitution,
            log,
        }
    }

    /// Obtain an object of `class`, viewed through `interface`.
    pub fn obtain(&self, class: &ClassId, interface: Interface) -> ExtValResult<Instance> {
        let config = self.initialize()?;

        if let (ClassId::Compiler, Some(validator)) = (class, config.validator()) {
            return self.compose(validator, interface);
        }

        let object = self.compiler.create_instance(class)?;
        Instance::new(Arc::from(object), interface)
    }

    fn compose(&self, validator: &DllSupport, interface: Interface) -> ExtValResult<Instance> {
        let primary = BackendHandle::new(
            Role::Primary,
            self.compiler.name(),
            self.compiler.create_instance(&ClassId::Compiler)?,
        );
        // On failure here `primary` is dropped before returning.
        let secondary = BackendHandle::new(
            Role::Secondary,
            validator.name(),
            validator.create_instance(&ClassId::Validator)?,
        );

        ExternalValidationRouter::new(primary, secondary).into_instance(interface)
    }

    /// Diagnostic for an error returned by this loader.
    ///
    /// A compiler module that did not load also gets a hint on how to
    /// point the loader at another one.
    pub fn diagnose(&self, error: &ExtValError) -> Diagnostic {
        let diag = error.to_diagnostic();
        match error {
            ExtValError::ModuleLoad(e) if e.path() == self.compiler.module_path() => {
                diag.with_suggestion(suggestions::COMPILER_MODULE)
            }
            _ => diag,
        }
    }

    /// Snapshot of the loader state for display.
    pub fn status(&self) -> LoaderStatus {
        let init = self.initialize();
        let compiler_error = init.as_ref().err().map(|e| e.to_string());

        let (substitution, dxil_dll_path, failure, log) = match init {
            Ok(config) => {
                let state = if config.is_active() {
                    "active"
                } else if config.failed_to_load() {
                    "failed"
                } else {
                    "disabled"
                };
                (
                    state,
                    config.dxil_dll_path().map(Path::to_path_buf),
                    config.failure().map(|e| e.to_string()),
                    config.log().to_vec(),
                )
            }
            Err(ref e) => (
                "unknown",
                self.settings
                    .dxil_dll_path
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from),
                None,
                vec![self.diagnose(e)],
            ),
        };

        LoaderStatus {
            compiler_module: self.compiler.name().to_string(),
            compiler_path: self.compiler.module_path().to_path_buf(),
            compiler_loaded: self.compiler.is_loaded(),
            compiler_error,
            substitution: substitution.to_string(),
            dxil_dll_path,
            failure,
            log,
        }
    }
}

/// Serializable loader state.
#[derive(Debug, Clone, Serialize)]
pub struct LoaderStatus {
    pub compiler_module: String,
    pub compiler_path: PathBuf,
    pub compiler_loaded: bool,
    pub compiler_error: Option<String>,
    /// One of `disabled`, `active`, `failed`, or `unknown` when the
    /// compiler itself did not load
    pub substitution: String,
    pub dxil_dll_path: Option<PathBuf>,
    pub failure: Option<String>,
    pub log: Vec<Diagnostic>,
}
