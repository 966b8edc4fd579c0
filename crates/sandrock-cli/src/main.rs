mod cancel;
mod cli;
mod commands;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use sandrock_core::{CancelToken, Pipeline, RunReport};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::patch::PatchSource;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let directive = if cli.global.verbose {
        "sandrock=debug"
    } else {
        "sandrock=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = cli.global.resolve_config()?;
    debug!("Effective config: {:?}", config);
    let pipeline = Pipeline::new(config)?;

    let cancel = CancelToken::new();
    cancel::install_handler(&cancel)?;

    let report = match cli.command {
        Command::Export { input, mapping } => {
            // Only an explicit --target (or SANDROCK_TARGET) asks for pre-filling
            let prefill = cli.global.target.is_some();
            Some(commands::export::run(
                &pipeline, &input, &mapping, prefill, &cancel,
            )?)
        }
        Command::Translate { input, output } => Some(commands::translate::run(
            &pipeline, &input, &output, &cancel,
        )?),
        Command::Patch {
            input,
            output,
            mapping,
            from_binary,
            from_first_byte,
            from_last_byte,
        } => {
            let source = match (mapping, from_binary) {
                (Some(path), _) => PatchSource::Mapping(path),
                (None, Some(path)) => PatchSource::Binary {
                    path,
                    first_byte: from_first_byte,
                    last_byte: from_last_byte,
                },
                (None, None) => anyhow::bail!("patch needs --mapping or --from-binary"),
            };
            Some(commands::patch::run(
                &pipeline, &input, &output, &source, &cancel,
            )?)
        }
        Command::Inspect { input, slots } => {
            commands::inspect::run(&pipeline, &input, slots)?;
            None
        }
    };

    if let Some(report) = report {
        finish(&report, cli.global.report.as_deref())?;
    }
    Ok(())
}

fn finish(report: &RunReport, report_path: Option<&std::path::Path>) -> Result<()> {
    commands::summary::print_report(report);
    if let Some(path) = report_path {
        report
            .save(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Saved report to {}", path.display());
    }
    Ok(())
}
