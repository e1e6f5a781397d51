/// Configuration resolution module
///
/// This module handles:
/// - Building a RunConfig from CLI arguments and an optional TOML file
/// - Selecting the schema (built-in version or custom field list)
/// - Deciding which diagnostics abort an entry
/// - Validating output formats
use crate::cli::CliArgs;
use crate::date_format::DateOrder;
use crate::entry::DiagnosticKind;
use crate::schema::{DEFAULT_DATE_FIELDS, Schema};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Which diagnostics abort an entry instead of annotating it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityPolicy {
    fatal: BTreeSet<DiagnosticKind>,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        SeverityPolicy { fatal: [DiagnosticKind::TooShort, DiagnosticKind::BadDate].into_iter().collect() }
    }
}

impl SeverityPolicy {
    /// Build a policy from codes such as `Err3`, `Err5`
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Result<Self, String> {
        let mut fatal = BTreeSet::new();
        for code in codes {
            let kind = DiagnosticKind::from_code(code.as_ref())
                .ok_or_else(|| format!("Unknown diagnostic code '{}' (expected Err1..Err5)", code.as_ref()))?;
            fatal.insert(kind);
        }
        // Nothing can be extracted from a too-short block
        fatal.insert(DiagnosticKind::TooShort);
        Ok(SeverityPolicy { fatal })
    }

    pub fn is_fatal(&self, kind: DiagnosticKind) -> bool {
        kind == DiagnosticKind::TooShort || self.fatal.contains(&kind)
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.fatal.iter().map(|k| k.code()).collect()
    }
}

/// Format of a written output table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format '{}' (expected csv or json)", other)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Settings read from a TOML config file
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub schema: Option<String>,
    pub fields: Option<Vec<String>>,
    pub date_fields: Option<Vec<String>>,
    pub fatal: Option<Vec<String>>,
    pub date_order: Option<DateOrder>,
    pub formats: Option<Vec<String>>,
    pub hide_empty_columns: Option<bool>,
    pub replace_existing: Option<bool>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub schema: Schema,
    pub severity: SeverityPolicy,
    /// Forced date order; None means detect per document
    pub date_order: Option<DateOrder>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Explicit report files; empty means scan `input_dir`
    pub files: Vec<PathBuf>,
    pub replace_existing: bool,
    pub formats: Vec<OutputFormat>,
    pub hide_empty_columns: bool,
    pub progress_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            schema: Schema::default(),
            severity: SeverityPolicy::default(),
            date_order: None,
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            files: Vec::new(),
            replace_existing: false,
            formats: vec![OutputFormat::Csv],
            hide_empty_columns: true,
            progress_every: 100,
        }
    }
}

/// Parse a TOML config file
pub fn load_file_config(path: &Path) -> Result<FileConfig, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))
}

/// Build the run configuration: defaults, then config file, then CLI flags
pub fn build_run_config(args: &CliArgs) -> Result<RunConfig, String> {
    let file = match args.config {
        Some(ref path) => {
            debug!("Loading config from {:?}", path);
            load_file_config(path)?
        }
        None => FileConfig::default(),
    };

    let schema = resolve_schema(args.schema.as_deref(), &file)?;
    debug!("Using schema '{}' with {} fields", schema.name(), schema.len());

    let severity = if !args.fatal.is_empty() {
        SeverityPolicy::from_codes(&args.fatal)?
    } else if let Some(ref codes) = file.fatal {
        SeverityPolicy::from_codes(codes)?
    } else {
        SeverityPolicy::default()
    };
    debug!("Fatal diagnostics: {:?}", severity.codes());

    let date_order = match args.date_order {
        Some(ref order) => Some(DateOrder::parse(order)?),
        None => file.date_order,
    };

    let format_names: Vec<String> = if !args.formats.is_empty() {
        args.formats.clone()
    } else {
        file.formats.clone().unwrap_or_else(|| vec!["csv".to_string()])
    };
    let mut formats = Vec::new();
    for name in &format_names {
        let format = OutputFormat::parse(name)?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    if formats.is_empty() {
        return Err("At least one output format is required".to_string());
    }

    Ok(RunConfig {
        schema,
        severity,
        date_order,
        input_dir: args.input.clone(),
        output_dir: args.output.clone(),
        files: args.files.clone(),
        replace_existing: args.replace || file.replace_existing.unwrap_or(false),
        formats,
        hide_empty_columns: !args.keep_empty_columns && file.hide_empty_columns.unwrap_or(true),
        progress_every: args.progress_every,
    })
}

/// CLI schema name wins over the file; a custom field list wins over a file schema name
fn resolve_schema(cli_name: Option<&str>, file: &FileConfig) -> Result<Schema, String> {
    if let Some(name) = cli_name {
        return Schema::by_name(name);
    }

    if let Some(ref fields) = file.fields {
        let date_fields = match file.date_fields {
            Some(ref date_fields) => date_fields.clone(),
            None => DEFAULT_DATE_FIELDS
                .iter()
                .filter(|f| fields.iter().any(|field| field == *f))
                .map(|f| f.to_string())
                .collect(),
        };
        return Schema::new("custom", fields.clone(), date_fields);
    }

    match file.schema {
        Some(ref name) => Schema::by_name(name),
        None => Ok(Schema::default()),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
