//! Primary-table schemas
//!
//! The primary table of each entry is a header line followed by a data line.
//! Newer firmware appends columns to the header, so field assignment is
//! driven by an ordered list of recognized names rather than by position.

/// Fields present in every report version
const V1_FIELDS: [&str; 26] = [
    "S.No",
    "Start Time",
    "End Time",
    "Device IP Address",
    "Threat Category",
    "Attack Name",
    "Policy Name",
    "Action",
    "Attack ID",
    "Source IP Address",
    "Source Port",
    "Destination IP Address",
    "Destination Port",
    "Direction",
    "Protocol",
    "Radware ID",
    "Duration",
    "Total Packets",
    "Total Packets Dropped",
    "Packet Type",
    "Total Mbits",
    "Total Mbits Dropped",
    "Max pps",
    "Max bps",
    "Physical Port",
    "Risk",
];

const V2_EXTRA: [&str; 2] = ["VLAN Tag", "Footprint"];

// Column names of the newest export are provisional; reports with a
// different layout can list their columns under `fields` in the TOML config.
const LATEST_EXTRA: [&str; 6] = [
    "Device Name",
    "Attack Status",
    "Max Attack Rate (Kbps)",
    "Max Attack Packet Rate (pps)",
    "Activation Time",
    "Workflow Rule",
];

/// Date-bearing fields unless a custom schema names its own
pub const DEFAULT_DATE_FIELDS: [&str; 2] = ["Start Time", "End Time"];

/// An ordered set of recognized primary-field names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<String>,
    date_fields: Vec<String>,
}

impl Schema {
    /// Build a schema from an explicit field list.
    ///
    /// The first field doubles as the header sentinel, so the list must be
    /// non-empty and names must be unique.
    pub fn new(name: impl Into<String>, fields: Vec<String>, date_fields: Vec<String>) -> Result<Self, String> {
        let name = name.into();
        if fields.is_empty() {
            return Err(format!("Schema '{}' has no fields", name));
        }
        for (i, field) in fields.iter().enumerate() {
            if field.is_empty() {
                return Err(format!("Schema '{}' has an empty field name at position {}", name, i + 1));
            }
            if fields[..i].contains(field) {
                return Err(format!("Schema '{}' lists '{}' more than once", name, field));
            }
        }
        for date_field in &date_fields {
            if !fields.contains(date_field) {
                return Err(format!("Date field '{}' is not part of schema '{}'", date_field, name));
            }
        }
        Ok(Schema { name, fields, date_fields })
    }

    fn builtin(name: &str, parts: &[&[&str]]) -> Self {
        let fields = parts.iter().flat_map(|p| p.iter()).map(|s| s.to_string()).collect();
        let date_fields = DEFAULT_DATE_FIELDS.iter().map(|s| s.to_string()).collect();
        Schema { name: name.to_string(), fields, date_fields }
    }

    /// Original 26-column layout
    pub fn v1() -> Self {
        Self::builtin("v1", &[&V1_FIELDS[..]])
    }

    /// 28-column layout adding VLAN tag and footprint
    pub fn v2() -> Self {
        Self::builtin("v2", &[&V1_FIELDS[..], &V2_EXTRA[..]])
    }

    /// Newest 34-column layout, a superset of all older ones
    pub fn latest() -> Self {
        Self::builtin("latest", &[&V1_FIELDS[..], &V2_EXTRA[..], &LATEST_EXTRA[..]])
    }

    /// Look up a built-in schema by version name
    pub fn by_name(name: &str) -> Result<Self, String> {
        match name {
            "v1" => Ok(Self::v1()),
            "v2" => Ok(Self::v2()),
            "latest" => Ok(Self::latest()),
            other => Err(format!("Unknown schema '{}' (expected v1, v2 or latest)", other)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Position of a field name, if recognized
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Positions of the date-bearing fields
    pub fn date_indices(&self) -> Vec<usize> {
        self.date_fields.iter().filter_map(|f| self.index_of(f)).collect()
    }

    /// Whether a line is a primary-table header line
    pub fn is_header_line(&self, line: &str) -> bool {
        line.strip_prefix(self.fields[0].as_str()).is_some_and(|rest| rest.starts_with(','))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::latest()
    }
}
