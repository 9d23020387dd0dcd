mod cli;

use std::{
    io::{self, Read, Write},
    path::Path,
    process::ExitCode,
};

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use sentinel::{
    config::Config,
    execution::{Dispatcher, ExecutionRequest},
    extract::{self, FunctionRecord},
    language::classify,
    printer::{JsonPrinter, TextPrinter},
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cli::Command;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    init_logging(args.verbose);

    let cfg = Config::load()?;
    debug!(config = %cfg.config_path.display(), "configuration loaded");
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut out = stdout.lock();

    match args.command {
        Command::Classify { file } => {
            writeln!(out, "{}", classify(&file.to_string_lossy()))?;
        }
        Command::List { file, language, json } => {
            let (source, name) = read_source(&file)?;
            let language = language.unwrap_or_else(|| classify(&name));
            let records = extract::extract(&source, language);
            if json {
                JsonPrinter::print_records(&mut out, &records)?;
            } else {
                TextPrinter::new(color).print_records(&mut out, &records)?;
            }
        }
        Command::Run { file, function, args: fn_args, language, json } => {
            let mut req = ExecutionRequest::new(function, fn_args, &file);
            if let Some(language) = language {
                req = req.with_language(language);
            }
            warn_if_undefined(&req);

            let dispatcher = Dispatcher::from_config(&cfg);
            let result = dispatcher.execute(&req).await;
            if json {
                JsonPrinter::print_result(&mut out, &result)?;
            } else {
                TextPrinter::new(color).print_result(&mut out, &result)?;
            }
            if !result.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `SENTINEL_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "sentinel=debug" } else { "sentinel=warn" };
    let filter = EnvFilter::try_from_env("SENTINEL_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Source text plus the name used to classify it. `-` reads stdin, which
/// has no name, so `--lang` is needed there.
fn read_source(file: &Path) -> Result<(String, String)> {
    if file.as_os_str() == "-" {
        let mut buf = String::new();
        if io::stdin().is_terminal() {
            anyhow::bail!("`-` given but stdin is a terminal");
        }
        io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        return Ok((buf, String::new()));
    }
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    Ok((text, file.to_string_lossy().into_owned()))
}

/// The dispatcher runs whatever the driver calls; a name the extractor
/// cannot see is usually a typo, but may still resolve (methods, exports).
fn warn_if_undefined(req: &ExecutionRequest) {
    if !req.language.is_executable() {
        return;
    }
    let Ok(source) = std::fs::read_to_string(&req.file_path) else {
        return;
    };
    let records: Vec<FunctionRecord> = extract::extract(&source, req.language);
    if extract::find(&records, &req.function_name).is_none() {
        warn!(function = %req.function_name, path = %req.file_path.display(), "function not found by extractor");
    }
}
