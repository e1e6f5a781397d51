/// Tests for config module
#[cfg(test)]
mod tests {
    use crate::cli::CliArgs;
    use crate::config::*;
    use crate::date_format::DateOrder;
    use crate::entry::DiagnosticKind;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

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

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("flatten.toml");
        fs::write(&path, text).expect("write config");
        path
    }

    #[test]
    fn test_defaults() {
        let config = build_run_config(&args()).expect("Should build config");

        assert_eq!(config.schema.name(), "latest");
        assert_eq!(config.schema.len(), 34);
        assert_eq!(config.severity, SeverityPolicy::default());
        assert_eq!(config.date_order, None);
        assert_eq!(config.formats, vec![OutputFormat::Csv]);
        assert!(config.hide_empty_columns);
        assert!(!config.replace_existing);
        assert_eq!(config.progress_every, 100);
    }

    #[test]
    fn test_default_severity() {
        let policy = SeverityPolicy::default();
        assert!(policy.is_fatal(DiagnosticKind::TooShort));
        assert!(policy.is_fatal(DiagnosticKind::BadDate));
        assert!(!policy.is_fatal(DiagnosticKind::DuplicateHeader));
        assert!(!policy.is_fatal(DiagnosticKind::MissingHeader));
        assert!(!policy.is_fatal(DiagnosticKind::HeaderDataMismatch));
        assert_eq!(policy.codes(), vec!["Err3", "Err5"]);
    }

    #[test]
    fn test_too_short_always_fatal() {
        let policy = SeverityPolicy::from_codes(&["err4"]).expect("valid codes");
        assert!(policy.is_fatal(DiagnosticKind::TooShort));
        assert!(policy.is_fatal(DiagnosticKind::HeaderDataMismatch));
        assert!(!policy.is_fatal(DiagnosticKind::BadDate));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let err = SeverityPolicy::from_codes(&["Err9"]).unwrap_err();
        assert!(err.contains("Err9"));
    }

    #[test]
    fn test_cli_flags() {
        let mut args = args();
        args.schema = Some("v1".to_string());
        args.date_order = Some("day-first".to_string());
        args.fatal = vec!["Err2".to_string()];
        args.formats = vec!["json".to_string(), "csv".to_string(), "json".to_string()];
        args.keep_empty_columns = true;
        args.replace = true;

        let config = build_run_config(&args).expect("Should build config");
        assert_eq!(config.schema.len(), 26);
        assert_eq!(config.date_order, Some(DateOrder::DayFirst));
        assert!(config.severity.is_fatal(DiagnosticKind::MissingHeader));
        assert!(!config.severity.is_fatal(DiagnosticKind::BadDate));
        assert_eq!(config.formats, vec![OutputFormat::Json, OutputFormat::Csv]);
        assert!(!config.hide_empty_columns);
        assert!(config.replace_existing);
    }

    #[test]
    fn test_bad_cli_values_rejected() {
        let mut bad_schema = args();
        bad_schema.schema = Some("v9".to_string());
        assert!(build_run_config(&bad_schema).is_err());

        let mut bad_order = args();
        bad_order.date_order = Some("year-first".to_string());
        assert!(build_run_config(&bad_order).is_err());

        let mut bad_format = args();
        bad_format.formats = vec!["xlsx".to_string()];
        assert!(build_run_config(&bad_format).unwrap_err().contains("xlsx"));
    }

    #[test]
    fn test_config_file_applied() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
schema = "v2"
fatal = ["Err3", "Err4", "Err5"]
date_order = "day-first"
formats = ["csv", "json"]
hide_empty_columns = false
"#,
        );
        let mut args = args();
        args.config = Some(path);

        let config = build_run_config(&args).expect("Should build config");
        assert_eq!(config.schema.name(), "v2");
        assert!(config.severity.is_fatal(DiagnosticKind::HeaderDataMismatch));
        assert_eq!(config.date_order, Some(DateOrder::DayFirst));
        assert_eq!(config.formats, vec![OutputFormat::Csv, OutputFormat::Json]);
        assert!(!config.hide_empty_columns);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "schema = \"v2\"\ndate_order = \"day-first\"\n");
        let mut args = args();
        args.config = Some(path);
        args.schema = Some("v1".to_string());
        args.date_order = Some("mdy".to_string());

        let config = build_run_config(&args).expect("Should build config");
        assert_eq!(config.schema.name(), "v1");
        assert_eq!(config.date_order, Some(DateOrder::MonthFirst));
    }

    #[test]
    fn test_custom_field_list() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "fields = [\"S.No\", \"Start Time\", \"Attack Name\"]\n");
        let mut args = args();
        args.config = Some(path);

        let config = build_run_config(&args).expect("Should build config");
        assert_eq!(config.schema.name(), "custom");
        assert_eq!(config.schema.len(), 3);
        assert_eq!(config.schema.date_indices(), vec![1]);
    }

    #[test]
    fn test_custom_date_field_must_exist() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "fields = [\"S.No\", \"When\"]\ndate_fields = [\"Start Time\"]\n");
        let mut args = args();
        args.config = Some(path);

        let err = build_run_config(&args).unwrap_err();
        assert!(err.contains("Start Time"));
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "colour = \"blue\"\n");
        let err = load_file_config(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }
}
