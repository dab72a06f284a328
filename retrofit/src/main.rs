//! retrofit - migrate legacy polling test helpers to retry
//!
//! This is the CLI entry point: expand the file arguments, run the
//! transform across them in parallel, then write results and report.

mod cli;

use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use retrofit_core::diagnostics::ansi;
use retrofit_core::{
    expand_globs, filter_supported_files, process_files_parallel, should_use_color, Diagnostics,
    Options,
};

use cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(failed) if failed > 0 => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct FileReport {
    path: String,
    changed: bool,
    rewrites: usize,
    wrapped: usize,
    skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    files: Vec<FileReport>,
    changed: usize,
    rewrites: usize,
    wrapped: usize,
    skipped: usize,
    errors: usize,
    dry_run: bool,
}

/// Run the migration. Returns the number of files that errored.
fn run(args: Args) -> anyhow::Result<usize> {
    let files = filter_supported_files(expand_globs(&args.files));
    if files.is_empty() {
        anyhow::bail!("no supported input files (expected .js/.jsx/.ts/.tsx)");
    }

    let use_color = if args.no_color {
        false
    } else {
        should_use_color(&args.color)
    };
    let diag = Diagnostics::new(use_color, args.verbose);

    let options = Options {
        module: args.module,
        legacy_symbol: args.from,
        replacement_symbol: args.to,
    };

    if args.verbose {
        let workers = args.concurrency.unwrap_or_else(num_cpus::get);
        diag.note(&format!(
            "processing {} files with {} workers",
            files.len(),
            workers
        ));
    }

    let results = process_files_parallel(
        &files,
        args.lang.as_deref(),
        &options,
        &diag,
        args.concurrency,
    );

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(outcome) => {
                let changed = outcome.output.is_some();
                if let Some(new_source) = outcome.output {
                    if !args.dry_run {
                        fs::write(&path, new_source)
                            .with_context(|| format!("failed to write {}", path))?;
                    }
                }
                reports.push(FileReport {
                    path,
                    changed,
                    rewrites: outcome.rewrites,
                    wrapped: outcome.wrapped,
                    skipped: outcome.skipped,
                    error: None,
                });
            }
            Err(e) => {
                reports.push(FileReport {
                    path,
                    changed: false,
                    rewrites: 0,
                    wrapped: 0,
                    skipped: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let summary = Summary {
        changed: reports.iter().filter(|r| r.changed).count(),
        rewrites: reports.iter().map(|r| r.rewrites).sum(),
        wrapped: reports.iter().map(|r| r.wrapped).sum(),
        skipped: reports.iter().map(|r| r.skipped).sum(),
        errors: reports.iter().filter(|r| r.error.is_some()).count(),
        dry_run: args.dry_run,
        files: reports,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, use_color);
    }

    Ok(summary.errors)
}

fn print_summary(summary: &Summary, use_color: bool) {
    let (bold, red, gray, reset) = if use_color {
        (ansi::BOLD, ansi::RED, ansi::GRAY, ansi::RESET)
    } else {
        ("", "", "", "")
    };

    for report in &summary.files {
        if let Some(err) = &report.error {
            println!("{}{}{}: {}", red, report.path, reset, err);
        } else if report.changed {
            println!(
                "{}{}{}: {} rewritten, {} wrapped, {} skipped",
                bold, report.path, reset, report.rewrites, report.wrapped, report.skipped
            );
        } else {
            println!("{}{}: unchanged{}", gray, report.path, reset);
        }
    }

    let verb = if summary.dry_run {
        "would change"
    } else {
        "changed"
    };
    println!(
        "\n{}{} of {} files {}{} ({} rewritten, {} wrapped, {} skipped, {} errors)",
        bold,
        summary.changed,
        summary.files.len(),
        verb,
        reset,
        summary.rewrites,
        summary.wrapped,
        summary.skipped,
        summary.errors
    );
}
