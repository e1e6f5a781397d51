/// Entry parsing
///
/// This module handles:
/// - Pairing primary-table header lines with their data lines
/// - Assigning data values to schema fields (accumulating repeats)
/// - Capturing the single-value detail lines (footprint, state, IP/port)
/// - Collecting the SAMPLE DETAILS table
/// - Classifying structural corruption into stable diagnostic codes
use crate::schema::Schema;
use crate::splitter::RawEntry;
use crate::tokenizer::{is_numeric, tokenize_row};
use log::{debug, warn};
use std::fmt;

/// Marker line that opens the sample table
pub const SAMPLE_MARKER: &str = "SAMPLE DETAILS:";

/// Maximum number of positional fields in a sample row
pub const SAMPLE_WIDTH: usize = 8;

/// Kinds of structural anomaly, each with a stable short code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// Err1: more than one primary header line in one entry
    DuplicateHeader,
    /// Err2: no primary header line at all
    MissingHeader,
    /// Err3: fewer than two lines, nothing can be extracted
    TooShort,
    /// Err4: a header line has more named columns than its data line
    HeaderDataMismatch,
    /// Err5: a date field did not match the document's date format
    BadDate,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 5] = [
        DiagnosticKind::DuplicateHeader,
        DiagnosticKind::MissingHeader,
        DiagnosticKind::TooShort,
        DiagnosticKind::HeaderDataMismatch,
        DiagnosticKind::BadDate,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateHeader => "Err1",
            DiagnosticKind::MissingHeader => "Err2",
            DiagnosticKind::TooShort => "Err3",
            DiagnosticKind::HeaderDataMismatch => "Err4",
            DiagnosticKind::BadDate => "Err5",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateHeader => "multiple headers in same entry",
            DiagnosticKind::MissingHeader => "header line is missing",
            DiagnosticKind::TooShort => "fewer than 2 lines in entry",
            DiagnosticKind::HeaderDataMismatch => "more headers than data",
            DiagnosticKind::BadDate => "date does not match the document date format",
        }
    }
}

/// One anomaly found in an entry, tied to the entry's first document line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.code(), self.line)
    }
}

/// Single-value lines captured outside the primary table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Footprint,
    State,
    SourceIp,
    SourcePort,
    DestIp,
    DestPort,
}

impl DetailField {
    pub const ALL: [DetailField; 6] = [
        DetailField::Footprint,
        DetailField::State,
        DetailField::SourceIp,
        DetailField::SourcePort,
        DetailField::DestIp,
        DetailField::DestPort,
    ];

    /// Line prefix that introduces this field
    pub fn sentinel(&self) -> &'static str {
        match self {
            DetailField::Footprint => "Footprint,",
            DetailField::State => "State,",
            DetailField::SourceIp => "Source IP,",
            DetailField::SourcePort => "Source Port,",
            DetailField::DestIp => "Destination IP,",
            DetailField::DestPort => "Destination Port,",
        }
    }

    /// Output column title
    pub fn column(&self) -> &'static str {
        match self {
            DetailField::Footprint => "Detail Footprint",
            DetailField::State => "Detail State",
            DetailField::SourceIp => "Detail Source IP",
            DetailField::SourcePort => "Detail Source Port",
            DetailField::DestIp => "Detail Destination IP",
            DetailField::DestPort => "Detail Destination Port",
        }
    }

    /// Whether the captured value is a comma-joined address/port list
    pub fn is_list(&self) -> bool {
        !matches!(self, DetailField::Footprint | DetailField::State)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// The parsed form of one entry block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// Document line the entry starts on
    pub start_line: usize,
    /// One value list per schema field, in encounter order
    primary: Vec<Vec<String>>,
    details: [String; 6],
    /// Sample rows, each at most `SAMPLE_WIDTH` fields
    pub samples: Vec<Vec<String>>,
    /// Anomalies in the order they were found
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedEntry {
    fn new(start_line: usize, schema: &Schema) -> Self {
        ParsedEntry {
            start_line,
            primary: vec![Vec::new(); schema.len()],
            details: Default::default(),
            samples: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// All values assigned to the schema field at `index`
    pub fn primary_values(&self, index: usize) -> &[String] {
        self.primary.get(index).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Accumulated value of a schema field, newline-joined
    pub fn primary_field(&self, index: usize) -> String {
        self.primary_values(index).join("\n")
    }

    pub fn detail(&self, field: DetailField) -> &str {
        &self.details[field.index()]
    }

    pub fn set_detail(&mut self, field: DetailField, value: impl Into<String>) {
        self.details[field.index()] = value.into();
    }

    pub fn push_primary(&mut self, index: usize, value: &str) {
        if let Some(values) = self.primary.get_mut(index) {
            values.push(value.trim().to_string());
        }
    }

    pub fn add_diagnostic(&mut self, kind: DiagnosticKind) -> Diagnostic {
        let diag = Diagnostic { kind, line: self.start_line };
        self.diagnostics.push(diag);
        diag
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    /// True when the block was too short to extract anything
    pub fn is_too_short(&self) -> bool {
        self.has(DiagnosticKind::TooShort)
    }

    /// Warning codes for the first output cell, newest first
    pub fn annotation(&self) -> Vec<String> {
        self.diagnostics.iter().rev().map(|d| d.to_string()).collect()
    }
}

/// Parse one entry block against a schema.
///
/// Structural problems never abort parsing except for blocks shorter than two
/// lines; everything else is recorded in `diagnostics` and extraction carries on
/// with whatever header/data pairs were found.
pub fn parse_entry(raw: &RawEntry<'_>, schema: &Schema) -> ParsedEntry {
    let mut entry = ParsedEntry::new(raw.start_line, schema);
    let lines: Vec<&str> = raw.text.lines().collect();

    let header_count = lines.iter().filter(|l| schema.is_header_line(l)).count();
    if header_count > 1 {
        let diag = entry.add_diagnostic(DiagnosticKind::DuplicateHeader);
        warn!("{}: Corrupt entry. Multiple headers in same entry.", diag);
    } else if header_count == 0 {
        let diag = entry.add_diagnostic(DiagnosticKind::MissingHeader);
        warn!("{}: Corrupt entry. Header line is missing.", diag);
    }

    if lines.len() < 2 {
        let diag = entry.add_diagnostic(DiagnosticKind::TooShort);
        warn!("{}: Corrupt entry. <2 lines in entry.", diag);
        return entry;
    }

    parse_primary_table(&mut entry, &lines, schema);
    scan_details(&mut entry, &lines);
    collect_samples(&mut entry, &lines);

    entry
}

/// Walk header/data pairs top to bottom; a header consumes the line after it
fn parse_primary_table(entry: &mut ParsedEntry, lines: &[&str], schema: &Schema) {
    let mut i = 0;
    while i + 1 < lines.len() {
        if !schema.is_header_line(lines[i]) {
            i += 1;
            continue;
        }
        // A header directly after a header starts the next pair
        if schema.is_header_line(lines[i + 1]) {
            debug!("Entry at line {}: header without data at offset {}", entry.start_line, i);
            i += 1;
            continue;
        }
        assign_pair(entry, lines[i], lines[i + 1], schema);
        i += 2;
    }
}

/// Data lines that are really the start of another section
fn is_nested_section(data: &[String]) -> bool {
    matches!(data.first().map(|s| s.trim_end_matches(',')), Some(SAMPLE_MARKER) | Some("State"))
}

fn assign_pair(entry: &mut ParsedEntry, header_line: &str, data_line: &str, schema: &Schema) {
    let headers = tokenize_row(header_line);
    let data = tokenize_row(data_line);

    if is_nested_section(&data) {
        debug!("Entry at line {}: header followed by nested section {:?}, skipping pair", entry.start_line, data.first());
        return;
    }

    // Trailing separators pad the header with unnamed columns
    let named = headers.iter().filter(|h| !h.is_empty()).count();
    if named > data.len() {
        let diag = entry.add_diagnostic(DiagnosticKind::HeaderDataMismatch);
        warn!("{}: Corrupt entry. More headers than data:\n    Headers: {:?}\n    Data: {:?}", diag, headers, data);
    }

    if !data.first().is_some_and(|serial| is_numeric(serial)) {
        warn!(
            "Bad data detected when parsing entry at line {}: Headers: {:?} Data: {:?}",
            entry.start_line, headers, data
        );
        return;
    }

    for (header, value) in headers.iter().zip(data.iter()) {
        if header.is_empty() || value.is_empty() {
            continue;
        }
        match schema.index_of(header) {
            Some(index) => entry.push_primary(index, value),
            None => warn!(
                "Bad data detected when parsing entry at line {}: unrecognized header '{}' (value '{}')",
                entry.start_line, header, value
            ),
        }
    }
}

/// Capture detail lines in one pass; the first non-empty match per field wins
fn scan_details(entry: &mut ParsedEntry, lines: &[&str]) {
    let mut found = [false; 6];

    // A detail line must follow a newline, so the block's first line never counts
    for line in lines.iter().skip(1) {
        for field in DetailField::ALL {
            if found[field.index()] {
                continue;
            }
            if let Some(rest) = line.strip_prefix(field.sentinel())
                && !rest.is_empty()
            {
                found[field.index()] = true;
                entry.set_detail(field, rest);
            }
        }
    }

    let footprint = entry.detail(DetailField::Footprint).trim_matches('"').to_string();
    entry.set_detail(DetailField::Footprint, footprint);

    // Matched the SAMPLE DETAILS column header instead of a Source IP line
    if entry.detail(DetailField::SourceIp).starts_with(" Source Port,") {
        debug!("Entry at line {}: Source IP matched the sample header, clearing", entry.start_line);
        entry.set_detail(DetailField::SourceIp, "");
    }
}

fn collect_samples(entry: &mut ParsedEntry, lines: &[&str]) {
    let Some(marker) = lines.iter().position(|l| l.trim_end_matches(',') == SAMPLE_MARKER) else {
        return;
    };

    // First line after the marker is the sample column header
    for line in lines.iter().skip(marker + 2) {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = tokenize_row(line);
        row.truncate(SAMPLE_WIDTH);
        entry.samples.push(row);
    }
}

#[cfg(test)]
#[path = "entry_test.rs"]
mod entry_test;
