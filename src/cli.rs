use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "forensic-flatten")]
#[command(about = "Flatten DefensePro forensic reports into one row per attack entry")]
#[command(version)]
pub struct CliArgs {
    /// Report files to process (default: every report found under --input)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Directory scanned for .csv reports and .tgz archives of reports
    #[arg(long, short = 'i', default_value = "./input", value_name = "DIR")]
    pub input: PathBuf,

    /// Directory the flattened tables are written to
    #[arg(long, short = 'o', default_value = "./output", value_name = "DIR")]
    pub output: PathBuf,

    /// TOML file with schema, severity and output settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report layout version: v1 (26 columns), v2 (28) or latest (34)
    #[arg(long, value_name = "VERSION")]
    pub schema: Option<String>,

    /// Force the day/month order of report dates instead of detecting it
    /// Accepts "month-first" or "day-first"
    #[arg(long, value_name = "ORDER")]
    pub date_order: Option<String>,

    /// Diagnostic codes that abort an entry and emit an error row
    /// Example: --fatal Err3,Err4,Err5 (default: Err3,Err5)
    #[arg(long, value_name = "CODES", num_args = 1.., value_delimiter = ',')]
    pub fatal: Vec<String>,

    /// Output formats to write: csv, json (comma-separated)
    #[arg(long = "format", value_name = "FORMATS", num_args = 1.., value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Overwrite outputs that already exist instead of skipping the report
    #[arg(long)]
    pub replace: bool,

    /// Keep columns that have no data in any row
    #[arg(long)]
    pub keep_empty_columns: bool,

    /// Print a progress line every N entries (0 disables)
    #[arg(long, default_value = "100", value_name = "N")]
    pub progress_every: usize,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        for file in &self.files {
            if !file.is_file() {
                return Err(format!("Report file not found: {}", file.display()));
            }
        }

        if self.output.is_file() {
            return Err(format!("Output path {} is a file, expected a directory", self.output.display()));
        }

        if let Some(ref config) = self.config
            && !config.is_file()
        {
            return Err(format!("Config file not found: {}", config.display()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            files: vec![],
            input: PathBuf::from("./input"),
            output: PathBuf::from("./output"),
            config: None,
            schema: None,
            date_order: None,
            fatal: vec![],
            formats: vec![],
            replace: false,
            keep_empty_columns: false,
            progress_every: 100,
        }
    }

    #[test]
    fn test_validate_defaults_succeed() {
        assert!(args().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_file_fails() {
        let mut args = args();
        args.files = vec![PathBuf::from("./definitely-not-here.csv")];
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_missing_config_fails() {
        let mut args = args();
        args.config = Some(PathBuf::from("./definitely-not-here.toml"));
        assert!(args.validate().unwrap_err().contains("Config file not found"));
    }

    #[test]
    fn test_parse_lists() {
        let args = CliArgs::parse_from(["forensic-flatten", "--fatal", "Err3,Err4", "--format", "csv,json"]);
        assert_eq!(args.fatal, vec!["Err3", "Err4"]);
        assert_eq!(args.formats, vec!["csv", "json"]);
        assert_eq!(args.progress_every, 100);
    }
}
