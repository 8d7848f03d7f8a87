//! Plain text tables
//!
//! One row per key, one column per map. The key column is left aligned,
//! value columns are right aligned.

use crate::report::QueryReport;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct Table {
    header: Vec<String>,
    columns: Vec<BTreeMap<String, String>>,
}

impl Table {
    /// `header[0]` labels the key column, the rest label value columns
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            columns: Vec::new(),
        }
    }

    pub fn push_column(&mut self, column: BTreeMap<String, String>) {
        self.columns.push(column);
    }

    fn keys(&self) -> BTreeSet<&str> {
        self.columns
            .iter()
            .flat_map(|column| column.keys().map(String::as_str))
            .collect()
    }

    fn heading(&self, index: usize) -> &str {
        self.header.get(index).map(String::as_str).unwrap_or("")
    }
}

fn width<'a>(cells: impl Iterator<Item = &'a str>) -> usize {
    cells.map(|cell| cell.chars().count()).max().unwrap_or(0)
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.keys();
        let key_width = width(keys.iter().copied().chain([self.heading(0)]));
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| width(column.values().map(String::as_str).chain([self.heading(i + 1)])))
            .collect();

        let mut spacer = format!("+{}", "-".repeat(key_width + 2));
        for w in &widths {
            spacer.push('+');
            spacer.push_str(&"-".repeat(w + 2));
        }
        spacer.push('+');

        writeln!(f, "{}", spacer)?;
        if !self.header.is_empty() {
            write!(f, "| {:<key_width$} ", self.heading(0))?;
            for (i, w) in widths.iter().enumerate() {
                write!(f, "| {:>w$} ", self.heading(i + 1), w = *w)?;
            }
            writeln!(f, "|")?;
            writeln!(f, "{}", spacer)?;
        }
        for key in keys {
            write!(f, "| {:<key_width$} ", key)?;
            for (column, w) in self.columns.iter().zip(&widths) {
                let value = column.get(key).map(String::as_str).unwrap_or("");
                write!(f, "| {:>w$} ", value, w = *w)?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", spacer)
    }
}

/// Query column followed by one column per result. With `verbose`, values of
/// scored fields carry `(normalised/weighted)` similarities.
pub fn results_table(report: &QueryReport, verbose: bool) -> Table {
    let mut header = vec!["Attribute".to_string(), "Query".to_string()];
    let mut rank = 0;
    for result in &report.results {
        if result.adapted {
            header.push(format!("Adapted result (sim. {:.3})", result.score));
        } else {
            rank += 1;
            header.push(format!("Result {} (sim. {:.3})", rank, result.score));
        }
    }

    let mut table = Table::new(header);
    table.push_column(report.query.clone());
    for result in &report.results {
        let column = result
            .case
            .iter()
            .map(|(name, value)| {
                let score = result
                    .explain
                    .as_ref()
                    .filter(|_| verbose)
                    .and_then(|explain| explain.fields.get(name));
                let cell = match score {
                    Some(s) => {
                        let normalised = if s.weight == 0.0 { 0.0 } else { s.similarity / s.weight };
                        format!("{} ({:.2}/{:.2})", value, normalised, s.similarity)
                    }
                    None => value.clone(),
                };
                (name.clone(), cell)
            })
            .collect();
        table.push_column(column);
    }
    table
}
