//! Command implementations

pub mod compile;
pub mod completions;
pub mod status;
pub mod validate;

use anyhow::{Context, Result};

use crate::cli::LoaderArgs;
use extval::util::config::{global_config_path, load_config, project_config_path};
use extval::util::diagnostic::emit;
use extval::{ExtValError, ExtValLoader, LoaderSettings};

/// Build a loader from config files, the environment and CLI overrides.
///
/// CLI flags beat `DXC_DXIL_DLL_PATH`, which beats config files.
pub fn loader(args: &LoaderArgs) -> Result<ExtValLoader> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let config = load_config(
        global_config_path().as_deref(),
        &project_config_path(&cwd),
    );

    let mut settings = LoaderSettings::from_env(&config);
    if let Some(ref library) = args.compiler {
        settings = settings.with_compiler_library(library.clone());
    }
    if let Some(ref path) = args.dxil_path {
        settings = settings.with_dxil_dll_path(Some(path.clone()));
    }

    Ok(ExtValLoader::new(settings))
}

/// Print a loader error as a diagnostic and replace it with `summary`.
pub fn report(
    loader: &ExtValLoader,
    error: ExtValError,
    color: bool,
    summary: &str,
) -> anyhow::Error {
    emit(&loader.diagnose(&error), color);
    anyhow::anyhow!("{}", summary)
}
