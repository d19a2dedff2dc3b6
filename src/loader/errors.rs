//! Loader error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::{ClassId, Interface};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// The substitute module path is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("dxil path {} could not be found", path.display())]
    #[diagnostic(
        code(extval::config::relative_path),
        help("set DXC_DXIL_DLL_PATH to an absolute path")
    )]
    RelativePath { path: PathBuf },

    #[error("dxil path {} could not be found", path.display())]
    #[diagnostic(code(extval::config::not_found))]
    PathNotFound { path: PathBuf },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::RelativePath { path } | ConfigError::PathNotFound { path } => path,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::warning(self.to_string());
        let diag = match self {
            ConfigError::RelativePath { .. } => diag.with_context("the path is not absolute"),
            ConfigError::PathNotFound { .. } => diag,
        };
        diag.with_context("external validation is disabled for this process")
            .with_suggestion(suggestions::SUBSTITUTE_PATH)
            .with_suggestion(suggestions::DISABLE_SUBSTITUTION)
    }
}

/// A native module could not be loaded.
///
/// Cloneable so that a failed load can be latched and handed back to
/// every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum LoadError {
    #[error("module {} not found", path.display())]
    #[diagnostic(code(extval::load::not_found))]
    ModuleNotFound { path: PathBuf },

    #[error("module {} failed to load: {reason}", path.display())]
    #[diagnostic(
        code(extval::load::failed),
        help("check that the module matches this platform and architecture")
    )]
    LoadFailed { path: PathBuf, reason: String },

    #[error("module {} does not export `{symbol}`", path.display())]
    #[diagnostic(code(extval::load::missing_entry_point))]
    MissingEntryPoint { path: PathBuf, symbol: String },
}

impl LoadError {
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::ModuleNotFound { path }
            | LoadError::LoadFailed { path, .. }
            | LoadError::MissingEntryPoint { path, .. } => path,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).with_location(self.path());
        match self {
            LoadError::ModuleNotFound { .. } => diag.with_suggestion(suggestions::MODULE_SEARCH),
            LoadError::LoadFailed { .. } => diag.with_suggestion(suggestions::MODULE_ABI),
            LoadError::MissingEntryPoint { symbol, .. } => diag.with_suggestion(format!(
                "Rebuild the module with `export_create_instance!` so it exports `{}`",
                symbol
            )),
        }
    }
}

/// Error returned by the loader facade and by capability views.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ExtValError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ModuleLoad(#[from] LoadError),

    /// The module loaded but could not create the requested class.
    #[error("failed to create {class} instance from {module}: {reason}")]
    #[diagnostic(code(extval::backend::construction))]
    BackendConstruction {
        module: String,
        class: ClassId,
        reason: String,
    },

    #[error("interface `{interface}` is not supported")]
    #[diagnostic(code(extval::backend::not_supported))]
    NotSupported { interface: Interface },
}

impl ExtValError {
    /// Whether this failure disables substitution for the rest of the process.
    pub fn is_latched(&self) -> bool {
        matches!(self, ExtValError::Configuration(_) | ExtValError::ModuleLoad(_))
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ExtValError::Configuration(e) => e.to_diagnostic(),
            ExtValError::ModuleLoad(e) => e.to_diagnostic(),
            ExtValError::BackendConstruction { .. } => Diagnostic::error(self.to_string()),
            ExtValError::NotSupported { interface } => Diagnostic::error(self.to_string())
                .with_context(format!(
                    "neither the compiler nor the validator answers `{}`",
                    interface
                )),
        }
    }
}

/// Result alias for loader operations.
pub type ExtValResult<T> = Result<T, ExtValError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::PathNotFound {
            path: PathBuf::from("/opt/validators/libdxil.so"),
        };
        assert_eq!(
            err.to_string(),
            "dxil path /opt/validators/libdxil.so could not be found"
        );

        let output = err.to_diagnostic().format(false);
        assert!(output.starts_with("warning: dxil path"));
        assert!(output.contains("external validation is disabled"));
    }

    #[test]
    fn test_relative_path_message() {
        let err = ConfigError::RelativePath {
            path: PathBuf::from("validators/libdxil.so"),
        };
        assert_eq!(
            err.to_string(),
            "dxil path validators/libdxil.so could not be found"
        );

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("  = the path is not absolute"));
        assert!(output.contains("  = external validation is disabled"));
    }

    #[test]
    fn test_latched_kinds() {
        let config: ExtValError = ConfigError::RelativePath {
            path: PathBuf::from("dxil.so"),
        }
        .into();
        assert!(config.is_latched());

        let load: ExtValError = LoadError::MissingEntryPoint {
            path: PathBuf::from("/lib/libdxil.so"),
            symbol: "DxcCreateInstance".to_string(),
        }
        .into();
        assert!(load.is_latched());

        let construction = ExtValError::BackendConstruction {
            module: "dxil".to_string(),
            class: ClassId::Validator,
            reason: "out of memory".to_string(),
        };
        assert!(!construction.is_latched());

        let unsupported = ExtValError::NotSupported {
            interface: Interface::VersionInfo,
        };
        assert!(!unsupported.is_latched());
    }

    #[test]
    fn test_missing_entry_point_diagnostic() {
        let err = LoadError::MissingEntryPoint {
            path: PathBuf::from("/lib/libdxil.so"),
            symbol: "DxcCreateInstance".to_string(),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("does not export `DxcCreateInstance`"));
        assert!(output.contains("--> /lib/libdxil.so"));
        assert!(output.contains("export_create_instance!"));
    }
}
