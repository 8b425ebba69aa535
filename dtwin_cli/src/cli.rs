//! CLI argument definitions and shared statics.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Request file format, inferred from the file extension when not given explicitly.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RequestFormat {
    Toml,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "dtwin", version, about = "Distillation-train digital twin simulator")]
pub struct Cli {
    /// Path to the request file (TOML or JSON). Reads stdin as JSON when omitted.
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Force the request format instead of inferring it from the file extension.
    #[arg(long, value_enum)]
    pub format: Option<RequestFormat>,

    /// Emit logs as JSON lines instead of pretty text.
    #[arg(long)]
    pub json_log: bool,

    /// Console log level (error|warn|info|debug|trace).
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}
