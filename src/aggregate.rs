//! Field aggregation and normalization for multi-valued cells.
//!
//! Address, port and sample cells can hold many values. This module merges
//! them, drops exact duplicates (keeping first-seen order) and sorts them
//! with a type-aware comparator so `10.0.0.10` lands after `10.0.0.2`.

use crate::entry::{DetailField, ParsedEntry, SAMPLE_WIDTH};
use log::warn;
use std::collections::HashSet;
use thiserror::Error;

/// Output column titles for the positional sample fields
pub const SAMPLE_COLUMNS: [&str; SAMPLE_WIDTH] = [
    "Sample Source IPs",
    "Sample Source Ports",
    "Sample Dest IPs",
    "Sample Dest Ports",
    "Sample Physical Ports",
    "Sample Vlan Tags",
    "Sample MPLS RD",
    "Sample Protocol",
];

/// Marker placed first in a sample cell when some sample row lacked that column
pub const MISSING_MARKER: &str = "Error";

/// Ordering key for one cell value.
///
/// Numeric keys (IPv4 octets, IPv6 hextets, plain integers) compare as
/// integer vectors. Text values all rank equal and after every numeric key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Numeric(Vec<u128>),
    Text,
}

/// A value that looks numeric but cannot be read as such
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortKeyError {
    #[error("'{0}' looks like an IPv4 address but has a non-numeric part")]
    Ipv4(String),
    #[error("'{0}' looks like an IPv6 address but has a non-hex group")]
    Ipv6(String),
    #[error("'{0}' is too large to compare")]
    Number(String),
}

/// Classify a value and build its ordering key
pub fn sort_key(item: &str) -> Result<SortKey, SortKeyError> {
    if item.contains('.') {
        item.split('.')
            .map(|part| part.parse::<u128>())
            .collect::<Result<Vec<_>, _>>()
            .map(SortKey::Numeric)
            .map_err(|_| SortKeyError::Ipv4(item.to_string()))
    } else if item.contains(':') {
        expand_ipv6(item)
            .iter()
            .map(|group| u128::from_str_radix(group, 16))
            .collect::<Result<Vec<_>, _>>()
            .map(SortKey::Numeric)
            .map_err(|_| SortKeyError::Ipv6(item.to_string()))
    } else if crate::tokenizer::is_numeric(item) {
        item.parse::<u128>().map(|n| SortKey::Numeric(vec![n])).map_err(|_| SortKeyError::Number(item.to_string()))
    } else {
        Ok(SortKey::Text)
    }
}

/// Expand `::` compression so a full address has eight groups
fn expand_ipv6(item: &str) -> Vec<&str> {
    let Some((head, tail)) = item.split_once("::") else {
        return item.split(':').collect();
    };

    let head: Vec<&str> = if head.is_empty() { Vec::new() } else { head.split(':').collect() };
    let tail: Vec<&str> = if tail.is_empty() { Vec::new() } else { tail.split(':').collect() };
    let fill = 8usize.saturating_sub(head.len() + tail.len());

    let mut groups = head;
    groups.extend(std::iter::repeat_n("0", fill));
    groups.extend(tail);
    groups
}

/// Sort values in place by sort key (stable).
///
/// If any value cannot be classified the slice is left untouched.
pub fn sort_values(values: &mut Vec<String>) -> Result<(), SortKeyError> {
    let keys = values.iter().map(|v| sort_key(v)).collect::<Result<Vec<_>, _>>()?;
    let mut keyed: Vec<(SortKey, String)> = keys.into_iter().zip(values.drain(..)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    values.extend(keyed.into_iter().map(|(_, v)| v));
    Ok(())
}

/// Drop exact duplicates, keeping the first occurrence of each value
pub fn dedup_ordered<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let value = value.into();
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

/// Dedup then sort; a failed sort keeps the deduplicated order
fn dedup_and_sort<I, S>(values: I, column: &str, line: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut values = dedup_ordered(values);
    if values.len() > 1
        && let Err(e) = sort_values(&mut values)
    {
        warn!("Entry at line {}: error sorting column {}: {}", line, column, e);
    }
    values
}

/// Normalize a comma- or newline-separated list into one value per line
pub fn normalize_list(raw: &str, column: &str, line: usize) -> String {
    let items = raw.split([',', '\n']).filter(|s| !s.is_empty());
    dedup_and_sort(items, column, line).join("\n")
}

/// Values gathered for one sample column across all sample rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleColumn {
    pub values: Vec<String>,
    /// Some sample row was too short to have this column
    pub missing: bool,
}

impl SampleColumn {
    /// Render as a cell: `Error` first when rows were short, then sorted unique values
    pub fn render(&self, column: &str, line: usize) -> String {
        let values = dedup_and_sort(self.values.iter().filter(|v| !v.is_empty()).cloned(), column, line);

        let mut lines = Vec::with_capacity(values.len() + 1);
        if self.missing {
            lines.push(MISSING_MARKER.to_string());
        }
        lines.extend(values);
        lines.join("\n")
    }
}

/// Split sample rows into their positional columns
pub fn sample_columns(samples: &[Vec<String>]) -> Vec<SampleColumn> {
    let mut columns = vec![SampleColumn::default(); SAMPLE_WIDTH];
    for row in samples {
        for (i, column) in columns.iter_mut().enumerate() {
            match row.get(i) {
                Some(value) => column.values.push(value.clone()),
                None => column.missing = true,
            }
        }
    }
    columns
}

/// Detail and sample cells of one entry, ready for output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedCells {
    pub details: Vec<String>,
    pub samples: Vec<String>,
}

/// Normalize the detail and sample-derived cells of a parsed entry
pub fn aggregate(entry: &ParsedEntry) -> AggregatedCells {
    let line = entry.start_line;

    let details = DetailField::ALL
        .iter()
        .map(|field| {
            let raw = entry.detail(*field);
            if field.is_list() { normalize_list(raw, field.column(), line) } else { raw.to_string() }
        })
        .collect();

    let samples = if entry.samples.is_empty() {
        vec![String::new(); SAMPLE_WIDTH]
    } else {
        sample_columns(&entry.samples)
            .iter()
            .zip(SAMPLE_COLUMNS.iter())
            .map(|(column, name)| column.render(name, line))
            .collect()
    };

    AggregatedCells { details, samples }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod aggregate_test;
