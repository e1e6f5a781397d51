/// Document pipeline
///
/// This module handles:
/// - Detecting the document date order once (or honoring a forced order)
/// - Splitting, parsing and materializing every entry in document order
/// - Applying the severity policy to structural diagnostics
/// - Per-document summary counters and progress output
use crate::config::RunConfig;
use crate::date_format::{self, DateFormat};
use crate::entry::{Diagnostic, DiagnosticKind, ParsedEntry, parse_entry};
use crate::materialize::{OutputRow, OutputTable, materialize, materialize_raw};
use crate::splitter::{RawEntry, split_blocks};
use crate::ui;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Counters gathered while processing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Blocks produced by the splitter, blank ones included
    pub blocks: usize,
    /// Non-blank blocks that were processed
    pub entries: usize,
    /// Rows that stand in for an entry that could not be processed
    pub error_rows: usize,
    /// Occurrences of each diagnostic kind
    pub counts: BTreeMap<DiagnosticKind, usize>,
    pub date_format: DateFormat,
}

impl DocumentSummary {
    fn new(date_format: DateFormat) -> Self {
        DocumentSummary { blocks: 0, entries: 0, error_rows: 0, counts: BTreeMap::new(), date_format }
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    fn record(&mut self, kind: DiagnosticKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }
}

/// Everything produced from one document
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub table: OutputTable,
    pub summary: DocumentSummary,
}

/// Flatten one report document into a table with one row per entry.
///
/// Entries never abort the document: an entry that cannot be processed
/// becomes an error row and the next entry is processed normally.
pub fn process_document(doc: &str, config: &RunConfig) -> DocumentReport {
    let dates = match config.date_order {
        Some(order) => DateFormat::forced(order),
        None => date_format::detect(doc),
    };
    debug!("Date order {:?} (detected: {})", dates.order, dates.detected);

    let mut table = OutputTable::new(&config.schema);
    let mut summary = DocumentSummary::new(dates);

    for raw in split_blocks(doc) {
        summary.blocks += 1;
        if raw.is_blank() {
            continue;
        }

        summary.entries += 1;
        let row = process_entry(&raw, config, &dates, &mut summary, table.width());
        if row.error {
            summary.error_rows += 1;
        }
        table.rows.push(row);

        if config.progress_every > 0 && summary.entries % config.progress_every == 0 {
            ui::status(&format!("Processed {} entries", summary.entries));
        }
    }

    debug!("{} blocks, {} entries, {} error rows", summary.blocks, summary.entries, summary.error_rows);
    DocumentReport { table, summary }
}

fn process_entry(
    raw: &RawEntry<'_>,
    config: &RunConfig,
    dates: &DateFormat,
    summary: &mut DocumentSummary,
    width: usize,
) -> OutputRow {
    let mut entry = parse_entry(raw, &config.schema);
    for diag in &entry.diagnostics {
        summary.record(diag.kind);
    }

    if let Some(diag) = fatal_diagnostic(&entry, config) {
        debug!("{}: entry replaced by error row", diag);
        return OutputRow::error(diag, width);
    }

    match materialize(&entry, &config.schema, dates) {
        Ok(row) => row,
        Err(e) => {
            summary.record(DiagnosticKind::BadDate);
            warn!("{}", e);
            if config.severity.is_fatal(DiagnosticKind::BadDate) {
                OutputRow::error(e.diagnostic(), width)
            } else {
                entry.add_diagnostic(DiagnosticKind::BadDate);
                materialize_raw(&entry, &config.schema)
            }
        }
    }
}

/// First diagnostic the policy treats as fatal; a too-short block wins
fn fatal_diagnostic(entry: &ParsedEntry, config: &RunConfig) -> Option<Diagnostic> {
    let mut fatal = entry.diagnostics.iter().copied().filter(|d| config.severity.is_fatal(d.kind));
    if entry.is_too_short() { fatal.find(|d| d.kind == DiagnosticKind::TooShort) } else { fatal.next() }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
