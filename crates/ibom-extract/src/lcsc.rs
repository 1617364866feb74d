//! Reference → LCSC part number overrides from a JLCPCB-style BOM CSV.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CSV_NAME: &str = "BOM-lcsc.csv";

/// Mapping from reference designator to LCSC code.
///
/// Only fills in codes the PCB document does not already carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LcscOverrides(HashMap<String, String>);

impl LcscOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<&str> {
        self.0.get(reference).map(String::as_str)
    }

    pub fn insert(&mut self, reference: impl Into<String>, code: impl Into<String>) {
        self.0.insert(reference.into(), code.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse CSV text with `Designator` and `LCSC` columns.
    ///
    /// The delimiter (tab, semicolon or comma) is taken from the header line.
    /// A file without both columns yields an empty mapping.
    pub fn parse(content: &str) -> Result<Self, csv::Error> {
        let content = content.trim_start_matches('\u{feff}');
        let header_line = content.lines().next().unwrap_or("");
        let delimiter = detect_delimiter(header_line);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let (Some(designator_idx), Some(lcsc_idx)) = (column("designator"), column("lcsc")) else {
            warn!("LCSC CSV lacks Designator/LCSC columns (headers: {headers:?})");
            return Ok(Self::default());
        };

        let mut overrides = Self::default();
        for result in reader.records() {
            let record = result?;
            let code = record.get(lcsc_idx).unwrap_or("").trim();
            if code.is_empty() {
                continue;
            }
            let designators = record.get(designator_idx).unwrap_or("");
            for reference in designators.split(',').map(str::trim) {
                if !reference.is_empty() {
                    overrides.insert(reference, code);
                }
            }
        }
        Ok(overrides)
    }

    /// Load overrides from a file. Failure is not fatal: the mapping stays empty.
    pub fn load(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| Self::parse(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(overrides) => {
                info!(
                    "Loaded {} LCSC overrides from {}",
                    overrides.len(),
                    path.display()
                );
                overrides
            }
            Err(e) => {
                warn!("Ignoring LCSC CSV {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Find the conventional override CSV for an ibom export, if one exists.
    pub fn discover(html_path: &Path) -> Option<PathBuf> {
        let html_dir = html_path.parent().unwrap_or_else(|| Path::new(""));
        let parent = html_dir.parent().unwrap_or(html_dir);
        let candidates = [
            parent.join("lcsc").join(CSV_NAME),
            html_dir.join("lcsc").join(CSV_NAME),
            Path::new("lcsc").join(CSV_NAME),
            parent.join(CSV_NAME),
        ];
        let found = candidates.into_iter().find(|p| p.is_file());
        debug!("LCSC CSV discovery for {}: {found:?}", html_path.display());
        found
    }
}

impl FromIterator<(String, String)> for LcscOverrides {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Most frequent of tab, semicolon and comma in the header; comma by default.
fn detect_delimiter(header: &str) -> u8 {
    let count = |c: char| header.matches(c).count();
    let (tabs, commas, semicolons) = (count('\t'), count(','), count(';'));
    if tabs > 0 && tabs >= commas && tabs >= semicolons {
        b'\t'
    } else if semicolons > 0 && semicolons >= commas {
        b';'
    } else {
        b','
    }
}
