#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! CLI entrypoint for the distillation-train digital twin simulator.
//!
//! Responsibilities:
//! - Parse `--request`/`--format`/log flags
//! - Initialize tracing, writing to stderr so stdout stays reserved for the
//!   single JSON response line
//! - Load a request body (file or stdin), run it through `dtwin_config`, and
//!   print the JSON response
//! - Map a fatal CLI-level failure to the same `{error}` JSON contract the
//!   engine uses for in-process callers

mod cli;
mod error_fmt;
mod tracing_setup;

use std::io::Read as _;
use std::path::Path;

use clap::Parser;
use eyre::WrapErr;

use cli::{Cli, RequestFormat};
use dtwin_config::{ErrorResponse, Request};
use error_fmt::{exit_code_for_error, humanize};
use tracing_setup::init_tracing;

fn main() {
    let _ = color_eyre::install();

    if let Err(e) = real_main() {
        eprintln!("{}", humanize(&e));
        println!("{}", serde_json::to_string(&ErrorResponse::from_report(&e)).unwrap_or_else(|_| "{\"error\":\"failed to serialize error\"}".to_string()));
        std::process::exit(exit_code_for_error(&e));
    }
}

fn infer_format(path: &Path) -> RequestFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => RequestFormat::Toml,
        _ => RequestFormat::Json,
    }
}

fn load_request(cli: &Cli) -> eyre::Result<Request> {
    let (body, format) = match &cli.request {
        Some(path) => {
            let body =
                std::fs::read_to_string(path).wrap_err_with(|| format!("read request {path:?}"))?;
            let format = cli.format.unwrap_or_else(|| infer_format(path));
            (body, format)
        }
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .wrap_err("read request from stdin")?;
            (body, cli.format.unwrap_or(RequestFormat::Json))
        }
    };

    match format {
        RequestFormat::Toml => Request::try_from(body.as_str()).wrap_err("parse request"),
        RequestFormat::Json => Request::from_json(&body).wrap_err("parse request"),
    }
}

fn real_main() -> eyre::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.json_log, &cli.log_level);

    let req = load_request(&cli)?;
    tracing::info!(mode = ?req.mode, "running request");

    let json = dtwin_config::run_to_json(&req);
    println!("{json}");
    Ok(())
}
