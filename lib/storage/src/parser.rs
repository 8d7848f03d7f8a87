//! Case file parsing
//!
//! Two line-oriented formats are understood, both using `defcase` lines to
//! separate records:
//!
//! - `.cases` text: each line is split into its first token and the rest
//! - `.csv`: each row is split on commas outside double quotes
//!
//! Only the last two parts of a line are used, as key and value. Lines whose
//! key does not start with an uppercase letter are ignored, which skips the
//! framing lines of the text format.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use tripcase_core::RawCase;

const RECORD_SEPARATOR: &str = "defcase";

/// On-disk case file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFormat {
    Cases,
    Csv,
}

impl CaseFormat {
    /// `.csv` files are CSV, everything else the text format
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => CaseFormat::Csv,
            _ => CaseFormat::Cases,
        }
    }

    fn split_line(&self, line: &str) -> Vec<String> {
        match self {
            CaseFormat::Cases => {
                let line = line.trim();
                match line.split_once(char::is_whitespace) {
                    Some((first, rest)) => vec![first.to_string(), rest.trim_start().to_string()],
                    None if line.is_empty() => Vec::new(),
                    None => vec![line.to_string()],
                }
            }
            CaseFormat::Csv => split_csv_line(line),
        }
    }
}

/// Splits case files into raw records
pub struct CaseParser {
    camel_case: Regex,
    whitespace: Regex,
}

impl CaseParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            camel_case: Regex::new(r"([\p{Ll}\d])(\p{Lu})")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Parse a case file, picking the format from its extension
    pub fn parse_file(&self, path: &Path) -> Result<Vec<RawCase>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read case file {}", path.display()))?;
        Ok(self.parse_str(&text, CaseFormat::from_path(path)))
    }

    pub fn parse_str(&self, text: &str, format: CaseFormat) -> Vec<RawCase> {
        let mut records = Vec::new();
        let mut current: Vec<Vec<String>> = Vec::new();

        for line in text.lines() {
            let parts = format.split_line(line);
            match parts.first() {
                None => continue,
                Some(first) if first.trim() == RECORD_SEPARATOR => {
                    if !current.is_empty() {
                        records.push(self.parse_record(&current));
                    }
                    current.clear();
                }
                Some(_) if parts.iter().any(|part| !part.trim().is_empty()) => current.push(parts),
                Some(_) => {}
            }
        }
        if !current.is_empty() {
            records.push(self.parse_record(&current));
        }

        records.retain(|record| !record.is_empty());
        records
    }

    fn parse_record(&self, lines: &[Vec<String>]) -> RawCase {
        let mut record = RawCase::new();
        for parts in lines {
            let [key, value] = match parts.as_slice() {
                [.., key, value] => [key, value],
                _ => continue,
            };
            if !key.starts_with(|c: char| c.is_uppercase()) {
                continue;
            }

            let key = key.trim_matches(|c: char| c == ' ' || c == ':');
            let value = self.normalize_value(value);
            if key.is_empty() || value.is_empty() {
                continue;
            }
            record.insert(key.to_string(), value);
        }
        record
    }

    /// Strip quoting and punctuation, split camel case into words and
    /// collapse whitespace
    pub fn normalize_value(&self, raw: &str) -> String {
        let trimmed = raw.trim_matches(|c: char| matches!(c, '"' | '.' | ',') || c.is_whitespace());
        let spaced = self.camel_case.replace_all(trimmed, "$1 $2");
        self.whitespace.replace_all(&spaced, " ").into_owned()
    }
}

/// Split a CSV row on commas outside double quotes. `""` inside quotes is a
/// literal quote.
fn split_csv_line(line: &str) -> Vec<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}
