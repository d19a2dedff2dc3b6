//! `extval validate` command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::cli::ValidateArgs;
use extval::core::ValidatorFlags;
use extval::loader::ExtValResult;
use extval::{ClassId, ExtValError, ExtValLoader, Instance, Interface};

pub fn execute(args: ValidateArgs, color: bool) -> Result<()> {
    let object = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let debug_bitcode = match args.debug_bitcode {
        Some(ref path) => Some(
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };
    let flags = ValidatorFlags(args.flags);

    let loader = super::loader(&args.loader)?;
    let instance = obtain_validator(&loader, debug_bitcode.is_some())
        .map_err(|e| super::report(&loader, e, color, "validation failed"))?;

    let result = match debug_bitcode {
        Some(ref bitcode) if instance.supports(&Interface::Validator2) => instance
            .validator2()
            .map_err(|e| super::report(&loader, e, color, "validation failed"))?
            .validate_with_debug(&object, flags, Some(bitcode.as_slice()))?,
        other => {
            if other.is_some() {
                warn!("validator does not accept debug bitcode, ignoring it");
            }
            instance
                .validator()
                .map_err(|e| super::report(&loader, e, color, "validation failed"))?
                .validate(&object, flags)?
        }
    };

    if !result.errors.is_empty() {
        eprint!("{}", result.errors);
    }
    if !result.succeeded {
        anyhow::bail!("{} failed validation", args.file.display());
    }

    if let Some(ref path) = args.output {
        write_output(path, &result.output)?;
    }
    eprintln!("    Validated {}", args.file.display());

    Ok(())
}

/// Find a validator, trying the compiler object before the standalone class.
///
/// The compiler object is the one carrying the substitute validator when
/// substitution is active.
fn obtain_validator(loader: &ExtValLoader, want_debug: bool) -> ExtValResult<Instance> {
    let mut last = None;

    for (class, interface) in candidates(want_debug) {
        match loader.obtain(&class, interface.clone()) {
            Ok(instance) => {
                debug!("validating through {} / {}", class, interface);
                return Ok(instance);
            }
            Err(e @ ExtValError::NotSupported { .. }) => last = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last.unwrap_or(ExtValError::NotSupported {
        interface: Interface::Validator,
    }))
}

fn candidates(want_debug: bool) -> Vec<(ClassId, Interface)> {
    let mut order = Vec::new();
    for class in [ClassId::Compiler, ClassId::Validator] {
        if want_debug {
            order.push((class.clone(), Interface::Validator2));
        }
        order.push((class, Interface::Validator));
    }
    order
}

fn write_output(path: &Path, output: &[u8]) -> Result<()> {
    fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
}
