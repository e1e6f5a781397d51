use crate::config::RunConfig;
use crate::export;
use crate::input::{self, ReportDocument, SourceKind};
use crate::pipeline::{self, DocumentSummary};
use crate::ui;
use log::debug;
use std::fs;
use std::io::BufRead;
use std::path::PathBuf;

/// What happened to one report
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Written { name: String, outputs: Vec<PathBuf>, summary: DocumentSummary },
    /// An output already existed and replacing was not requested
    Skipped { name: String, existing: PathBuf },
    Failed { name: String, error: String },
    /// Input in a format that cannot be read yet
    Unsupported { path: PathBuf },
}

/// Totals across every report in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Written { .. } => self.written += 1,
            DocumentOutcome::Skipped { .. } => self.skipped += 1,
            DocumentOutcome::Failed { .. } => self.failed += 1,
            DocumentOutcome::Unsupported { .. } => self.unsupported += 1,
        }
    }
}

/// Process every report the configuration selects
///
/// This is the main entry point for a run.
/// The callback is invoked for each report as soon as it is finished.
pub fn run_reports<R, F>(config: &RunConfig, prompt: &mut R, mut on_outcome: F) -> Result<RunSummary, String>
where
    R: BufRead,
    F: FnMut(&DocumentOutcome),
{
    let sources = collect_sources(config)?;
    debug!("Processing {} input files", sources.len());

    fs::create_dir_all(&config.output_dir)
        .map_err(|e| format!("Failed to create output directory {}: {}", config.output_dir.display(), e))?;

    let mut summary = RunSummary::default();
    let mut emit = |outcome: DocumentOutcome| {
        summary.record(&outcome);
        on_outcome(&outcome);
    };

    for path in sources {
        let documents = match SourceKind::classify(&path) {
            Some(SourceKind::Unsupported) => {
                emit(DocumentOutcome::Unsupported { path });
                continue;
            }
            Some(SourceKind::Archive) => input::read_archive(&path),
            // Explicitly named files are read as reports whatever their extension
            Some(SourceKind::Csv) | None => input::read_report(&path).map(|doc| vec![doc]),
        };

        match documents {
            Ok(documents) => {
                for document in documents {
                    emit(process_report(&document, config, prompt));
                }
            }
            Err(e) => emit(DocumentOutcome::Failed {
                name: path.display().to_string(),
                error: format!("Failed to read {}: {}", path.display(), e),
            }),
        }
    }

    Ok(summary)
}

/// Explicit files, or everything discovered under the input directory
fn collect_sources(config: &RunConfig) -> Result<Vec<PathBuf>, String> {
    if !config.files.is_empty() {
        return Ok(config.files.clone());
    }

    let input_dir = &config.input_dir;
    let created = input::prepare_input_dir(input_dir)
        .map_err(|e| format!("Failed to create input directory {}: {}", input_dir.display(), e))?;
    if created {
        ui::status(&format!("Input folder {} not found. It has been created for you.", input_dir.display()));
    }

    let sources = input::discover(input_dir)
        .map_err(|e| format!("Failed to read input directory {}: {}", input_dir.display(), e))?;
    if sources.is_empty() {
        ui::print_warning(&format!(
            "No reports found. Place DefensePro forensic reports (.csv) in {} and rerun.",
            input_dir.display()
        ));
    }
    Ok(sources)
}

fn process_report<R: BufRead>(document: &ReportDocument, config: &RunConfig, prompt: &mut R) -> DocumentOutcome {
    let outputs: Vec<PathBuf> =
        config.formats.iter().map(|&f| export::output_path(&config.output_dir, &document.name, f)).collect();

    if !config.replace_existing
        && let Some(existing) = outputs.iter().find(|p| p.exists())
    {
        return DocumentOutcome::Skipped { name: document.name.clone(), existing: existing.clone() };
    }

    ui::status(&format!("Processing {}", document.origin));
    let report = pipeline::process_document(&document.text, config);

    for (path, &format) in outputs.iter().zip(&config.formats) {
        if let Err(e) = export::save_with_retry(&report.table, path, format, config.hide_empty_columns, prompt) {
            return DocumentOutcome::Failed {
                name: document.name.clone(),
                error: format!("Failed to write {}: {}", path.display(), e),
            };
        }
    }

    DocumentOutcome::Written { name: document.name.clone(), outputs, summary: report.summary }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod runner_test;
