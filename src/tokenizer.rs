/// Row tokenizer for the comma-separated lines of a forensic report
///
/// Each line of a report is tokenized on its own. Quoted fields may contain
/// commas (`"a,b"`) and doubled quotes (`""`); embedded newlines never occur
/// because the report is split into lines before tokenizing.
use csv::{ByteRecord, ReaderBuilder};
use log::debug;

/// Split one line into its fields.
///
/// An empty line yields no fields. Trailing separators produce trailing empty
/// fields, exactly as they appear in the report (`a,b,` is three fields).
pub fn tokenize_row(line: &str) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }

    let mut reader = ReaderBuilder::new().has_headers(false).flexible(true).from_reader(line.as_bytes());

    let mut record = ByteRecord::new();
    match reader.read_byte_record(&mut record) {
        Ok(true) => record.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect(),
        Ok(false) => Vec::new(),
        Err(e) => {
            // Reading from an in-memory slice only fails on malformed input; fall back to a plain split
            debug!("csv tokenizer rejected line ({}), splitting on commas: {:?}", e, line);
            line.split(',').map(|s| s.to_string()).collect()
        }
    }
}

/// Check whether a token is a bare unsigned integer (the serial-number test)
pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}
