//! Native module loading.
//!
//! A `DllSupport` binds one module's factory entry point on first use and
//! remembers the outcome. A failed load is never retried. Loaded libraries
//! stay mapped until the process exits.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::core::{Backend, ClassId};
use crate::loader::errors::{ExtValError, ExtValResult, LoadError};

/// Symbol every module exports to create its objects.
pub const ENTRY_POINT: &str = "DxcCreateInstance";

/// Return type of a module's factory entry point.
pub type CreateInstanceResult = anyhow::Result<Box<dyn Backend>>;

/// Signature of a module's factory entry point.
///
/// This is a Rust-ABI function: modules must be built with the same
/// toolchain and the same version of this crate as the host.
pub type CreateInstanceFn = unsafe fn(&ClassId) -> CreateInstanceResult;

/// Export a module's factory under the well-known entry point name.
///
/// ```ignore
/// fn create(class: &extval::core::ClassId) -> extval::loader::CreateInstanceResult {
///     match class {
///         extval::core::ClassId::Validator => Ok(Box::new(MyValidator::new())),
///         other => anyhow::bail!("class {} not available", other),
///     }
/// }
///
/// extval::export_create_instance!(create);
/// ```
#[macro_export]
macro_rules! export_create_instance {
    ($factory:path) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub fn DxcCreateInstance(
            class: &$crate::core::ClassId,
        ) -> $crate::loader::CreateInstanceResult {
            $factory(class)
        }
    };
}

/// A bound factory entry point.
pub trait InstanceFactory: Send + Sync {
    fn create_instance(&self, class: &ClassId) -> CreateInstanceResult;
}

impl<F> InstanceFactory for F
where
    F: Fn(&ClassId) -> CreateInstanceResult + Send + Sync,
{
    fn create_instance(&self, class: &ClassId) -> CreateInstanceResult {
        self(class)
    }
}

/// Shared handle to a bound factory.
pub type BackendFactory = Arc<dyn InstanceFactory>;

/// Opens a module and binds its factory symbol.
pub trait LibraryLoader: Send + Sync {
    fn open(&self, path: &Path, symbol: &str) -> Result<BackendFactory, LoadError>;
}

/// `LibraryLoader` backed by the platform dynamic loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct DylibLoader;

struct DylibFactory {
    entry: CreateInstanceFn,
}

impl InstanceFactory for DylibFactory {
    fn create_instance(&self, class: &ClassId) -> CreateInstanceResult {
        // SAFETY: `entry` was resolved from a library that is never unloaded,
        // and the module contract fixes its signature.
        unsafe { (self.entry)(class) }
    }
}

impl LibraryLoader for DylibLoader {
    fn open(&self, path: &Path, symbol: &str) -> Result<BackendFactory, LoadError> {
        // Bare file names go through the platform search path.
        if is_explicit_path(path) && !path.exists() {
            return Err(LoadError::ModuleNotFound {
                path: path.to_path_buf(),
            });
        }

        // SAFETY: loading runs the module's initializers; modules are trusted
        // to the same degree as the host binary.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            LoadError::LoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        // SAFETY: the symbol type is the documented module entry point.
        let entry: CreateInstanceFn = match unsafe {
            library.get::<CreateInstanceFn>(symbol.as_bytes())
        } {
            Ok(entry) => *entry,
            Err(_) => {
                return Err(LoadError::MissingEntryPoint {
                    path: path.to_path_buf(),
                    symbol: symbol.to_string(),
                })
            }
        };

        // Only a module with a usable entry point stays mapped, for the
        // rest of the process.
        std::mem::forget(library);

        Ok(Arc::new(DylibFactory { entry }))
    }
}

fn is_explicit_path(path: &Path) -> bool {
    path.is_absolute() || path.components().count() > 1
}

/// Map a logical module name to the file the platform loader should open.
///
/// Names that already look like paths or file names pass through unchanged;
/// a bare name such as `dxcompiler` becomes `libdxcompiler.so`,
/// `libdxcompiler.dylib` or `dxcompiler.dll`.
pub fn resolve_module_path(name: impl AsRef<OsStr>) -> PathBuf {
    let path = Path::new(name.as_ref());
    if is_explicit_path(path) || path.extension().is_some() {
        path.to_path_buf()
    } else {
        PathBuf::from(libloading::library_filename(name.as_ref()))
    }
}

/// One native module and its bound factory.
pub struct DllSupport {
    name: String,
    label: String,
    path: PathBuf,
    entry_point: String,
    loader: Arc<dyn LibraryLoader>,
    state: OnceLock<Result<BackendFactory, LoadError>>,
}

impl DllSupport {
    /// Describe a module without loading it.
    pub fn new(
        name: impl AsRef<OsStr>,
        entry_point: impl Into<String>,
        loader: Arc<dyn LibraryLoader>,
    ) -> Self {
        let display = name.as_ref().to_string_lossy().into_owned();
        DllSupport {
            label: display.clone(),
            name: display,
            path: resolve_module_path(name),
            entry_point: entry_point.into(),
            loader,
            state: OnceLock::new(),
        }
    }

    /// Name used in log lines instead of the configured name or path.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Module name or path as configured.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// File the platform loader is asked to open.
    pub fn module_path(&self) -> &Path {
        &self.path
    }

    /// Load the module and bind its entry point.
    ///
    /// Runs at most once, even when called from several threads; every
    /// later call returns the first outcome.
    pub fn initialize(&self) -> Result<(), LoadError> {
        self.factory().map(|_| ())
    }

    fn factory(&self) -> Result<&BackendFactory, LoadError> {
        self.state
            .get_or_init(|| {
                debug!("loading module {} ({})", self.name, self.path.display());
                let result = self.loader.open(&self.path, &self.entry_point);
                if let Err(ref e) = result {
                    warn!("{} failed to load: {}", self.label, e);
                }
                result
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Whether the module has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        matches!(self.state.get(), Some(Ok(_)))
    }

    /// Whether a load was attempted and failed.
    pub fn failed_to_load(&self) -> bool {
        matches!(self.state.get(), Some(Err(_)))
    }

    /// Create an object of the given class, loading the module if needed.
    ///
    /// A factory failure only fails this call; it is not latched.
    pub fn create_instance(&self, class: &ClassId) -> ExtValResult<Box<dyn Backend>> {
        let factory = self.factory()?;
        factory
            .create_instance(class)
            .map_err(|e| ExtValError::BackendConstruction {
                module: self.name.clone(),
                class: class.clone(),
                reason: format!("{:#}", e),
            })
    }
}

impl std::fmt::Debug for DllSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DllSupport")
            .field("name", &self.name)
            .field("entry_point", &self.entry_point)
            .field("loaded", &self.is_loaded())
            .field("failed", &self.failed_to_load())
            .finish()
    }
}
