/// Report discovery and loading
///
/// This module handles:
/// - Creating the input directory on first run
/// - Walking the input directory for reports and report archives
/// - Decoding report bytes (lossy UTF-8, CRLF normalized)
/// - Extracting `.csv` members from gzipped tar archives
use flate2::read::GzDecoder;
use log::debug;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::Archive;

/// What a discovered input file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A single exported report
    Csv,
    /// A `.tgz` / `.tar.gz` archive of reports
    Archive,
    /// An archive format that cannot be read yet (`.zip`)
    Unsupported,
}

impl SourceKind {
    pub fn classify(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".csv") {
            Some(SourceKind::Csv)
        } else if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            Some(SourceKind::Archive)
        } else if name.ends_with(".zip") {
            Some(SourceKind::Unsupported)
        } else {
            None
        }
    }
}

/// One report document ready for the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    /// Output file stem
    pub name: String,
    /// Where the report came from, for messages
    pub origin: String,
    pub text: String,
}

/// Create the input directory if it does not exist; returns true if created
pub fn prepare_input_dir(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    Ok(true)
}

/// Recursively list every recognized input file, sorted by path
pub fn discover(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(dir, &mut found)?;
    found.sort();
    debug!("Discovered {} input files under {:?}", found.len(), dir);
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if SourceKind::classify(&path).is_some() {
            found.push(path);
        }
    }
    Ok(())
}

/// Decode raw report bytes into text with `\n` line endings
pub fn decode(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text: &str = &text;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.replace("\r\n", "\n")
}

/// File name with the given archive/report suffix removed
fn stem(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let lower = name.to_ascii_lowercase();
    for suffix in [".tar.gz", ".tgz", ".csv"] {
        if lower.ends_with(suffix) {
            return name[..name.len() - suffix.len()].to_string();
        }
    }
    name
}

/// Read one `.csv` report
pub fn read_report(path: &Path) -> io::Result<ReportDocument> {
    let bytes = fs::read(path)?;
    Ok(ReportDocument { name: stem(path), origin: path.display().to_string(), text: decode(&bytes) })
}

/// Read every `.csv` member of a gzipped tar archive.
///
/// Members are named `<archive>_<member>` so reports from different
/// archives never share an output file.
pub fn read_archive(path: &Path) -> io::Result<Vec<ReportDocument>> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);
    let archive_stem = stem(path);

    let mut documents = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let member = entry.path()?.into_owned();

        if SourceKind::classify(&member) != Some(SourceKind::Csv) {
            debug!("Skipping archive member {:?}", member);
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        documents.push(ReportDocument {
            name: format!("{}_{}", archive_stem, stem(&member)),
            origin: format!("{}:{}", path.display(), member.display()),
            text: decode(&bytes),
        });
    }

    Ok(documents)
}
