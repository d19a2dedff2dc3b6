//! `extval status` command
//!
//! Reports which compiler module is in use and whether an external
//! validator is substituted for its built-in one.

use anyhow::Result;

use crate::cli::StatusArgs;
use extval::loader::LoaderStatus;

pub fn execute(args: StatusArgs, color: bool) -> Result<()> {
    let loader = super::loader(&args.loader)?;
    let status = loader.status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", format_status(&status, color));
    }

    // Exit with error code if the compiler itself is unusable
    if !status.compiler_loaded {
        std::process::exit(1);
    }

    Ok(())
}

fn format_status(status: &LoaderStatus, color: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Compiler module:  {} ({})\n",
        status.compiler_module,
        status.compiler_path.display()
    ));
    match status.compiler_error {
        Some(ref error) => out.push_str(&format!("  Status:         not loaded: {}\n", error)),
        None => out.push_str("  Status:         loaded\n"),
    }

    let path = status
        .dxil_dll_path
        .as_ref()
        .map(|p| p.display().to_string());

    let substitution = match (status.substitution.as_str(), path) {
        ("active", Some(p)) => format!("active ({})", p),
        ("failed", Some(p)) => format!("failed ({})", p),
        ("unknown", _) => "not evaluated (compiler module did not load)".to_string(),
        (state, _) => state.to_string(),
    };
    out.push_str(&format!("Substitution:     {}\n", substitution));
    if let Some(ref failure) = status.failure {
        out.push_str(&format!("  Reason:         {}\n", failure));
    }

    if !status.log.is_empty() {
        out.push('\n');
        out.push_str("Initialization log:\n");
        for diagnostic in &status.log {
            out.push_str(&diagnostic.format(color));
        }
    }

    out
}
