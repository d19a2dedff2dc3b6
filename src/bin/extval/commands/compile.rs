//! `extval compile` command
//!
//! Compiles one source file. Prefers the modern compiler interface and
//! falls back to the classic one when the backend does not answer it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::CompileArgs;
use extval::core::{
    Compile3Request, CompileRequest, Define, IncludeHandler, OperationResult,
};
use extval::{ClassId, ExtValError, Interface};

/// Resolves `#include` names relative to the including source's directory.
struct FsIncludeHandler {
    root: PathBuf,
}

impl IncludeHandler for FsIncludeHandler {
    fn load_source(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.root.join(filename);
        fs::read(&path).with_context(|| format!("failed to read include {}", path.display()))
    }
}

pub fn execute(args: CompileArgs, color: bool) -> Result<()> {
    let source = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let source_name = args.file.display().to_string();
    let defines: Vec<Define> = args.defines.iter().map(|d| Define::parse(d)).collect();
    let includes = FsIncludeHandler {
        root: args
            .file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    let loader = super::loader(&args.loader)?;

    let result = match loader.obtain(&ClassId::Compiler, Interface::Compiler3) {
        Ok(instance) => {
            debug!("compiling {} through the modern interface", source_name);
            let arguments = modern_arguments(&args, &defines);
            let compiler = instance
                .compiler3()
                .map_err(|e| super::report(&loader, e, color, "compilation failed"))?;
            compiler.compile(&Compile3Request {
                source: &source,
                arguments: &arguments,
                include_handler: Some(&includes),
            })?
        }
        Err(ExtValError::NotSupported { .. }) => {
            debug!("compiling {} through the classic interface", source_name);
            let instance = loader
                .obtain(&ClassId::Compiler, Interface::Compiler)
                .map_err(|e| super::report(&loader, e, color, "compilation failed"))?;
            let compiler = instance
                .compiler()
                .map_err(|e| super::report(&loader, e, color, "compilation failed"))?;
            compiler.compile(&CompileRequest {
                source: &source,
                source_name: &source_name,
                entry_point: &args.entry_point,
                target_profile: &args.target_profile,
                arguments: &args.extra,
                defines: &defines,
                include_handler: Some(&includes),
            })?
        }
        Err(e) => return Err(super::report(&loader, e, color, "compilation failed")),
    };

    finish(result, &args.file, args.output.as_deref())
}

/// Command line for the modern interface, which takes no structured fields.
fn modern_arguments(args: &CompileArgs, defines: &[Define]) -> Vec<String> {
    let mut arguments = vec![
        "-E".to_string(),
        args.entry_point.clone(),
        "-T".to_string(),
        args.target_profile.clone(),
    ];
    for define in defines {
        arguments.push("-D".to_string());
        arguments.push(define.to_string());
    }
    arguments.extend(args.extra.iter().cloned());
    arguments
}

fn finish(result: OperationResult, file: &Path, output: Option<&Path>) -> Result<()> {
    if !result.errors.is_empty() {
        eprint!("{}", result.errors);
    }
    if !result.succeeded {
        anyhow::bail!("failed to compile {}", file.display());
    }

    match output {
        Some(path) => {
            fs::write(path, &result.output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "    Compiled {} -> {} ({} bytes)",
                file.display(),
                path.display(),
                result.output.len()
            );
        }
        None => eprintln!(
            "    Compiled {} ({} bytes)",
            file.display(),
            result.output.len()
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LoaderArgs;

    fn compile_args(extra: &[&str]) -> CompileArgs {
        CompileArgs {
            file: PathBuf::from("shaders/blur.hlsl"),
            entry_point: "CSMain".to_string(),
            target_profile: "cs_6_6".to_string(),
            defines: Vec::new(),
            output: None,
            loader: LoaderArgs {
                compiler: None,
                dxil_path: None,
            },
            extra: extra.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_modern_arguments() {
        let args = compile_args(&["-O3", "-Zi"]);
        let defines = vec![Define::simple("DEBUG"), Define::with_value("TILE", "16")];

        assert_eq!(
            modern_arguments(&args, &defines),
            vec![
                "-E", "CSMain", "-T", "cs_6_6", "-D", "DEBUG", "-D", "TILE=16", "-O3", "-Zi"
            ]
        );
    }

    #[test]
    fn test_include_handler_reads_relative_to_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("common.hlsli"), b"#define TILE 16\n").unwrap();

        let handler = FsIncludeHandler {
            root: tmp.path().to_path_buf(),
        };
        assert_eq!(
            handler.load_source("common.hlsli").unwrap(),
            b"#define TILE 16\n"
        );
        assert!(handler.load_source("missing.hlsli").is_err());
    }

    #[test]
    fn test_failed_result_is_an_error() {
        let err = finish(
            OperationResult::failure("blur.hlsl:3: undeclared identifier"),
            Path::new("blur.hlsl"),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to compile blur.hlsl"));
    }
}
