//! Table export to CSV and JSON.
//!
//! Output files are written under an exclusive lock. A write that fails
//! (typically because the file is open in a spreadsheet) can be retried
//! interactively.

use crate::config::OutputFormat;
use crate::materialize::OutputTable;
use crate::ui;
use fs2::FileExt;
use log::debug;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Cell text that counts as no data when hiding columns
const NOT_AVAILABLE: &str = "N/A";

/// Output file for a report in the given format
pub fn output_path(dir: &Path, name: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", name, format.extension()))
}

/// Indices of the columns to write
///
/// With `hide_empty` set, columns where no row has data are left out.
pub fn visible_columns(table: &OutputTable, hide_empty: bool) -> Vec<usize> {
    (0..table.width())
        .filter(|&i| {
            !hide_empty
                || table.rows.iter().any(|row| row.cells.get(i).is_some_and(|c| !c.is_empty() && c != NOT_AVAILABLE))
        })
        .collect()
}

/// Whether a cell reads as a bare number (digits with at most one dot)
fn looks_numeric(cell: &str) -> bool {
    let digits = cell.replacen('.', "", 1);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn json_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if looks_numeric(cell) {
        if !cell.contains('.')
            && let Ok(n) = cell.parse::<u64>()
        {
            return Value::from(n);
        }
        if let Some(n) = cell.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}

/// Write the table as CSV: header row, then one record per row
pub fn write_csv<W: Write>(table: &OutputTable, columns: &[usize], writer: W) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns.iter().map(|&i| table.headers[i].as_str()))?;
    for row in &table.rows {
        csv.write_record(columns.iter().map(|&i| row.cells.get(i).map(String::as_str).unwrap_or("")))?;
    }
    csv.flush()
}

/// Write the table as a JSON array of objects keyed by column title
pub fn write_json<W: Write>(table: &OutputTable, columns: &[usize], writer: W) -> io::Result<()> {
    let records: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut record = Map::new();
            for &i in columns {
                let cell = row.cells.get(i).map(String::as_str).unwrap_or("");
                record.insert(table.headers[i].clone(), json_cell(cell));
            }
            Value::Object(record)
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Write one output file under an exclusive lock
pub fn save(table: &OutputTable, path: &Path, format: OutputFormat, hide_empty: bool) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).write(true).truncate(false).open(path)?;
    file.try_lock_exclusive()?;
    file.set_len(0)?;

    let columns = visible_columns(table, hide_empty);
    debug!("Writing {} of {} columns to {:?}", columns.len(), table.width(), path);

    let mut writer = BufWriter::new(&file);
    match format {
        OutputFormat::Csv => write_csv(table, &columns, &mut writer)?,
        OutputFormat::Json => write_json(table, &columns, &mut writer)?,
    }
    writer.flush()
}

/// Save, prompting the operator to retry after each failure.
///
/// An empty line retries; any other input (or end of input) gives up and
/// returns the last error.
pub fn save_with_retry<R: BufRead>(
    table: &OutputTable,
    path: &Path,
    format: OutputFormat,
    hide_empty: bool,
    prompt: &mut R,
) -> io::Result<()> {
    loop {
        ui::status(&format!("Saving to {}", path.display()));
        let err = match save(table, path, format, hide_empty) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        ui::print_error(&format!("Error writing to {}: {}", path.display(), err));
        ui::status("Please make sure the document is not currently open!");
        ui::status("Press enter to retry, any other input to abort");

        let mut answer = String::new();
        if prompt.read_line(&mut answer)? == 0 || !answer.trim().is_empty() {
            return Err(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::OutputRow;
    use std::fs;
    use tempfile::TempDir;

    fn table() -> OutputTable {
        let row = |cells: &[&str]| OutputRow { cells: cells.iter().map(|s| s.to_string()).collect(), error: false };
        OutputTable {
            headers: vec!["S.No".into(), "Source IP".into(), "Unused".into(), "Max pps".into(), "Note".into()],
            rows: vec![
                row(&["1", "10.0.0.1\n10.0.0.2", "", "800", "N/A"]),
                row(&["Err3:14", "", "", "", ""]),
                row(&["3", "2.2.2.2", "N/A", "1.5", "a, \"b\""]),
            ],
        }
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("800"));
        assert!(looks_numeric("1.5"));
        assert!(!looks_numeric("10.0.0.1"));
        assert!(!looks_numeric(""));
        assert!(!looks_numeric("."));
        assert!(!looks_numeric("Err3:14"));
    }

    #[test]
    fn test_visible_columns() {
        let table = table();
        assert_eq!(visible_columns(&table, true), vec![0, 1, 3, 4]);
        assert_eq!(visible_columns(&table, false), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_csv_output() {
        let table = table();
        let mut out = Vec::new();
        write_csv(&table, &visible_columns(&table, true), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["S.No", "Source IP", "Max pps", "Note"]);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[0][1], "10.0.0.1\n10.0.0.2");
        assert_eq!(&records[1][0], "Err3:14");
        assert_eq!(&records[2][3], "a, \"b\"");
    }

    #[test]
    fn test_json_output_coerces_numbers() {
        let table = table();
        let mut out = Vec::new();
        write_json(&table, &visible_columns(&table, true), &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();

        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["S.No"], Value::from(1u64));
        assert_eq!(records[0]["Max pps"], Value::from(800u64));
        assert_eq!(records[0]["Source IP"], Value::from("10.0.0.1\n10.0.0.2"));
        assert_eq!(records[1]["S.No"], Value::from("Err3:14"));
        assert_eq!(records[1]["Source IP"], Value::Null);
        assert_eq!(records[2]["Max pps"], Value::from(1.5));
        assert!(records[0].get("Unused").is_none());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = output_path(&temp.path().join("out"), "report", OutputFormat::Csv);
        assert!(path.ends_with("out/report.csv"));

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale contents that are much longer than the real table output ".repeat(20)).unwrap();

        save(&table(), &path, OutputFormat::Csv, true).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("S.No,Source IP,Max pps,Note\n"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_retry_gives_up_on_input() {
        let temp = TempDir::new().unwrap();
        // A directory at the output path makes every attempt fail
        let path = temp.path().join("blocked.csv");
        fs::create_dir_all(&path).unwrap();

        let mut answers = io::Cursor::new("\nq\n");
        let result = save_with_retry(&table(), &path, OutputFormat::Csv, true, &mut answers);
        assert!(result.is_err());
        // One retry consumed the empty line, then "q" aborted
        assert_eq!(answers.position() as usize, "\nq\n".len());
    }

    #[test]
    fn test_retry_gives_up_at_end_of_input() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blocked.json");
        fs::create_dir_all(&path).unwrap();

        let mut answers = io::Cursor::new("");
        assert!(save_with_retry(&table(), &path, OutputFormat::Json, true, &mut answers).is_err());
    }
}
