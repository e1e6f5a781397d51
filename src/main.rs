// Copyright 2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod aggregate;
mod cli;
mod config;
mod date_format;
mod entry;
mod export;
mod input;
mod materialize;
mod pipeline;
mod runner;
mod schema;
mod splitter;
mod tokenizer;
mod ui;

#[cfg(test)]
mod test_fixtures;

use entry::DiagnosticKind;
use pipeline::DocumentSummary;
use runner::DocumentOutcome;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse CLI arguments
    let args = cli::CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Resolve defaults, config file and flags
    let config = match config::build_run_config(&args) {
        Ok(c) => c,
        Err(e) => {
            ui::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let mut prompt = stdin.lock();

    let summary = match runner::run_reports(&config, &mut prompt, print_outcome) {
        Ok(s) => s,
        Err(e) => {
            ui::print_error(&e);
            std::process::exit(1);
        }
    };

    if summary.written + summary.skipped + summary.failed + summary.unsupported > 0 {
        ui::status(&format!(
            "Done: {} written, {} skipped, {} failed, {} unsupported",
            summary.written, summary.skipped, summary.failed, summary.unsupported
        ));
    }

    let exit_code = if summary.failed > 0 { 2 } else { 0 };
    std::process::exit(exit_code);
}

/// Print the result of one report as it completes
fn print_outcome(outcome: &DocumentOutcome) {
    match outcome {
        DocumentOutcome::Written { name, outputs, summary } => {
            ui::status(&format!("Processed {} entries from {}", summary.entries, name));
            if summary.entries > 0 && !summary.date_format.detected {
                ui::print_warning(&format!("{}: no unambiguous date found, read dates month-first", name));
            }
            print_diagnostic_counts(summary);
            for path in outputs {
                ui::status(&format!("Saved {}", path.display()));
            }
        }
        DocumentOutcome::Skipped { name, existing } => {
            ui::status(&format!("Output file {} already exists. Skipping {} (use --replace to overwrite)", existing.display(), name));
        }
        DocumentOutcome::Failed { name, error } => {
            ui::print_error(&format!("{}: {}", name, error));
        }
        DocumentOutcome::Unsupported { path } => {
            ui::print_warning(&format!("zip archive support to be added later: {}", path.display()));
        }
    }
}

fn print_diagnostic_counts(summary: &DocumentSummary) {
    if summary.error_rows > 0 {
        ui::print_warning(&format!("{} entries could not be processed and were written as error rows", summary.error_rows));
    }
    for kind in DiagnosticKind::ALL {
        let count = summary.count(kind);
        if count > 0 {
            ui::status(&format!("  {} x{}: {}", kind.code(), count, kind.description()));
        }
    }
}
