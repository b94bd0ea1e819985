use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use stackwalk::compiler::clouds::Arch;
use stackwalk::compiler::transforms::{TargetDefaults, VisitTrace};
use stackwalk::compiler::{Pass, Pipeline};
use stackwalk::diag::{CollectingSink, Sink};
use stackwalk::loader::load_stack;
use stackwalk::logging::init_logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TraceFormat {
    Text,
    Json,
}

/// Walk a stack document in deterministic order and print every visit.
#[derive(Debug, Parser)]
#[command(name = "stackwalk", version, about)]
struct Cli {
    /// Stack document (JSON) to walk
    file: PathBuf,

    /// Cloud architecture assigned to targets that do not name one (aws, gcp, azure, vmware)
    #[arg(long, value_parser = parse_arch)]
    arch: Option<Arch>,

    /// Output format of the visit trace
    #[arg(long, value_enum, default_value_t = TraceFormat::Text)]
    format: TraceFormat,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in log output
    #[arg(long)]
    no_color: bool,

    /// Also write debug logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_arch(name: &str) -> Result<Arch, String> {
    name.parse().map_err(|e: stackwalk::compiler::clouds::UnknownArch| e.to_string())
}

fn run(cli: Cli) -> Result<bool> {
    let (doc, mut stack) = load_stack(&cli.file).with_context(|| format!("loading {}", cli.file.display()))?;

    let sink = CollectingSink::new();
    let mut defaults = TargetDefaults::new(cli.arch.unwrap_or_default(), sink.clone());
    let mut trace = VisitTrace::new();

    let mut pipeline = Pipeline::new();
    pipeline.add_pass(Pass::new("target-defaults", &mut defaults))?;
    pipeline.add_pass(Pass::new("trace", &mut trace).after("target-defaults"))?;
    let report = pipeline.apply(&doc, &mut stack)?;
    drop(pipeline);
    debug!(?report, "Pipeline report");

    match cli.format {
        TraceFormat::Text => {
            for line in trace.lines() {
                println!("{}", line);
            }
        }
        TraceFormat::Json => {
            let json = serde_json::to_string_pretty(&trace.events()).context("serializing visit trace")?;
            println!("{}", json);
        }
    }

    for diagnostic in sink.diagnostics() {
        eprintln!("{}", diagnostic);
    }
    info!(errors = sink.errors(), warnings = sink.warnings(), "Walk complete");
    Ok(sink.success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logger(cli.no_color, cli.log_level.as_deref(), cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
