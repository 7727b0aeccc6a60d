mod cli;
mod diff;

use anyhow::{Context, Result};
use cli::Cli;
use pagefix_core::{FileOutcome, FileReport, RewriteOptions, RuleSet};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;

    info!("Starting pagefix");

    let rules = RuleSet::marketing().context("Failed to build import substitution rules")?;
    let options = RewriteOptions {
        file_name: cli.file_name.clone(),
        dry_run: cli.dry_run,
        keep_going: cli.keep_going,
    };

    info!("Loaded {} substitution rules", rules.len());
    info!("Target directory: {:?}", cli.root);
    info!("Candidate file name: {}", options.file_name);
    info!("Interactive mode: {}", cli.interactive);

    let report = |file: &FileReport| print_report(file, cli.dry_run);

    let summary = if cli.interactive {
        pagefix_core::process_directory_interactive(
            &cli.root,
            &rules,
            &options,
            diff::show_diff_and_confirm,
            report,
        )?
    } else if cli.dry_run {
        pagefix_core::process_directory_interactive(
            &cli.root,
            &rules,
            &options,
            diff::show_diff,
            report,
        )?
    } else {
        pagefix_core::process_directory(&cli.root, &rules, &options, report)?
    };

    if !summary.failures.is_empty() {
        for failure in &summary.failures {
            error!("{}: {}", failure.path.display(), failure.message);
        }
        anyhow::bail!("Rewrite finished with {} failure(s)", summary.failures.len());
    }

    println!("\nDone!");

    info!(
        "Pagefix completed successfully: {} files checked, {} changed, {} imports fixed",
        summary.candidates, summary.files_changed, summary.replacements
    );
    Ok(())
}

fn print_report(report: &FileReport, dry_run: bool) {
    let label = match report.outcome {
        FileOutcome::Unchanged if dry_run => "Would fix",
        FileOutcome::Rewritten { .. } | FileOutcome::Unchanged => "Fixed",
        FileOutcome::WouldRewrite { .. } => "Would fix",
        FileOutcome::Declined { .. } => "Skipped",
    };
    println!("{}: {}", label, report.path.display());
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
