//! CLI definitions using clap.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Extval - compile and validate shaders with an optional external validator
#[derive(Parser)]
#[command(name = "extval")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which modules are loaded and whether substitution is active
    Status(StatusArgs),

    /// Compile a shader source file
    Compile(CompileArgs),

    /// Validate a compiled shader object
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that loads modules.
#[derive(Args, Clone)]
pub struct LoaderArgs {
    /// Compiler module name or path (overrides config files)
    #[arg(long, value_name = "LIBRARY")]
    pub compiler: Option<String>,

    /// Substitute validator module (overrides DXC_DXIL_DLL_PATH)
    #[arg(long, value_name = "PATH")]
    pub dxil_path: Option<OsString>,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Shader source file
    pub file: PathBuf,

    /// Entry point name
    #[arg(short = 'E', long = "entry", default_value = "main")]
    pub entry_point: String,

    /// Target profile (e.g. ps_6_0, cs_6_6)
    #[arg(short = 'T', long = "profile")]
    pub target_profile: String,

    /// Preprocessor define (NAME or NAME=VALUE)
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,

    /// Output file for the compiled object
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub loader: LoaderArgs,

    /// Extra arguments passed to the compiler unchanged
    #[arg(last = true)]
    pub extra: Vec<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Compiled shader object
    pub file: PathBuf,

    /// Debug bitcode to validate alongside the object
    #[arg(long, value_name = "FILE")]
    pub debug_bitcode: Option<PathBuf>,

    /// Raw validator flags
    #[arg(long, default_value_t = 0)]
    pub flags: u32,

    /// Write the validated object here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub loader: LoaderArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
