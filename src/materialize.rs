/// Row materialization
///
/// This module handles:
/// - The flattened output column layout (schema fields, detail cells, sample cells)
/// - Building one output row per parsed entry
/// - Reformatting date cells to the canonical `YYYY-MM-DD HH:MM:SS` form
/// - Error rows for entries that could not be processed
use crate::aggregate::{SAMPLE_COLUMNS, aggregate};
use crate::date_format::{DateError, DateFormat};
use crate::entry::{DetailField, Diagnostic, DiagnosticKind, ParsedEntry};
use crate::schema::Schema;
use thiserror::Error;

/// Failure that aborts materialization of one entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("{diagnostic}: bad date in column '{column}': {source}")]
    BadDate {
        diagnostic: Diagnostic,
        column: String,
        #[source]
        source: DateError,
    },
}

impl EntryError {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            EntryError::BadDate { diagnostic, .. } => *diagnostic,
        }
    }
}

/// One flattened output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub cells: Vec<String>,
    /// Row stands in for an entry that could not be processed
    pub error: bool,
}

impl OutputRow {
    /// Row holding only the diagnostic in its first cell
    pub fn error(diagnostic: Diagnostic, width: usize) -> Self {
        let mut cells = vec![String::new(); width.max(1)];
        cells[0] = diagnostic.to_string();
        OutputRow { cells, error: true }
    }
}

/// The flattened table produced from one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<OutputRow>,
}

impl OutputTable {
    pub fn new(schema: &Schema) -> Self {
        OutputTable { headers: column_headers(schema), rows: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Output column titles: schema fields, then detail cells, then sample cells
pub fn column_headers(schema: &Schema) -> Vec<String> {
    schema
        .fields()
        .iter()
        .cloned()
        .chain(DetailField::ALL.iter().map(|f| f.column().to_string()))
        .chain(SAMPLE_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

/// Build the output row for an entry, reformatting its date cells.
///
/// Every line of a date cell must reparse; one bad line fails the whole
/// entry so no partially converted cell is ever published.
pub fn materialize(entry: &ParsedEntry, schema: &Schema, dates: &DateFormat) -> Result<OutputRow, EntryError> {
    let date_indices = schema.date_indices();
    let mut cells = Vec::with_capacity(schema.len());

    for (index, name) in schema.fields().iter().enumerate() {
        let values = entry.primary_values(index);
        if !date_indices.contains(&index) {
            cells.push(values.join("\n"));
            continue;
        }

        let reformatted = values.iter().map(|v| dates.reformat(v)).collect::<Result<Vec<_>, _>>().map_err(|source| {
            EntryError::BadDate {
                diagnostic: Diagnostic { kind: DiagnosticKind::BadDate, line: entry.start_line },
                column: name.clone(),
                source,
            }
        })?;
        cells.push(reformatted.join("\n"));
    }

    Ok(finish_row(entry, cells))
}

/// Build the output row for an entry, leaving dates exactly as reported
pub fn materialize_raw(entry: &ParsedEntry, schema: &Schema) -> OutputRow {
    let cells = (0..schema.len()).map(|i| entry.primary_field(i)).collect();
    finish_row(entry, cells)
}

fn finish_row(entry: &ParsedEntry, mut cells: Vec<String>) -> OutputRow {
    let annotation = entry.annotation();
    if !annotation.is_empty()
        && let Some(first) = cells.first_mut()
    {
        let mut lines = annotation;
        if !first.is_empty() {
            lines.push(std::mem::take(first));
        }
        *first = lines.join("\n");
    }

    let aggregated = aggregate(entry);
    cells.extend(aggregated.details);
    cells.extend(aggregated.samples);

    OutputRow { cells, error: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_format::DateOrder;
    use crate::entry::parse_entry;
    use crate::splitter::RawEntry;
    use crate::test_fixtures::*;

    fn parse(text: &str) -> ParsedEntry {
        parse_entry(&RawEntry { text, start_line: 12 }, &Schema::latest())
    }

    #[test]
    fn test_column_layout() {
        let headers = column_headers(&Schema::v2());
        assert_eq!(headers.len(), 28 + 6 + 8);
        assert_eq!(headers[0], "S.No");
        assert_eq!(headers[28], "Detail Footprint");
        assert_eq!(headers[34], "Sample Source IPs");
        assert_eq!(headers[41], "Sample Protocol");
    }

    #[test]
    fn test_materialize_well_formed() {
        let schema = Schema::latest();
        let text = well_formed_entry();
        let row = materialize(&parse(&text), &schema, &DateFormat::default()).unwrap();

        assert!(!row.error);
        assert_eq!(row.cells.len(), OutputTable::new(&schema).width());
        assert_eq!(row.cells[0], "1");
        assert_eq!(row.cells[1], "2024-03-14 00:09:35");
        assert_eq!(row.cells[2], "2024-03-14 00:12:10");
        assert_eq!(row.cells[5], "SYN Flood");
        assert_eq!(row.cells[schema.len()], "[flags=SYN, ttl=64]");
        assert_eq!(row.cells[schema.len() + 2], "2.2.2.2\n10.0.0.2\n10.0.0.10");
        assert_eq!(row.cells[schema.len() + 6], "10.0.0.2\n10.0.0.10");
    }

    #[test]
    fn test_multiline_dates_each_reformatted() {
        let schema = Schema::latest();
        let second = DATA.replacen("1,03.14.2024 00:09:35", "2,03.15.2024 01:00:00", 1);
        let text = format!("{}\n{}\n{}\n{}", HEADER, DATA, HEADER, second);
        let row = materialize(&parse(&text), &schema, &DateFormat::default()).unwrap();
        assert_eq!(row.cells[1], "2024-03-14 00:09:35\n2024-03-15 01:00:00");
        assert_eq!(row.cells[0], "Err1:12\n1\n2");
    }

    #[test]
    fn test_bad_date_aborts_entry() {
        let schema = Schema::latest();
        let text = well_formed_entry();
        let err = materialize(&parse(&text), &schema, &DateFormat::forced(DateOrder::DayFirst)).unwrap_err();
        assert_eq!(err.diagnostic().to_string(), "Err5:12");
        let EntryError::BadDate { column, source, .. } = err;
        assert_eq!(column, "Start Time");
        assert_eq!(source.value, "03.14.2024 00:09:35");
    }

    #[test]
    fn test_materialize_raw_keeps_dates() {
        let schema = Schema::latest();
        let text = well_formed_entry();
        let row = materialize_raw(&parse(&text), &schema);
        assert_eq!(row.cells[1], "03.14.2024 00:09:35");
    }

    #[test]
    fn test_canonical_dates_rematerialize_identically() {
        let schema = Schema::latest();
        let text = "S.No,Start Time\n9,2024-03-14 00:09:35";
        let row = materialize(&parse(text), &schema, &DateFormat::default()).unwrap();
        assert_eq!(row.cells[1], "2024-03-14 00:09:35");
    }

    #[test]
    fn test_annotation_in_first_cell() {
        let schema = Schema::latest();
        let text = format!("{}\n{}", DATA, DETAILS);
        let row = materialize(&parse(&text), &schema, &DateFormat::default()).unwrap();
        assert_eq!(row.cells[0], "Err2:12");
        assert_eq!(row.cells[schema.len() + 1], "Burst");
    }

    #[test]
    fn test_error_row() {
        let row = OutputRow::error(Diagnostic { kind: DiagnosticKind::TooShort, line: 3 }, 5);
        assert!(row.error);
        assert_eq!(row.cells, vec!["Err3:3", "", "", "", ""]);
    }
}
