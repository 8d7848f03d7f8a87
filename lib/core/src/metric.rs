//! Per-field similarity metrics
//!
//! Every metric returns a score in `[0, weight]`, where `weight` is the weight
//! of the attribute doing the comparing. This includes the exact-value
//! short-circuit of the taxonomy metric, so a heavier tree-matched field
//! counts for more just like any other field.
//!
//! Metrics are not symmetric in general: less-is-perfect rewards the other
//! value being smaller than this one, and table rows need not mirror columns.

use crate::taxonomy::Taxonomy;
use crate::value::{Value, MONTHS};
use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Score given to adjacent months or months of the same season
pub const SEASON_FUZZ: f64 = 0.5;

/// Month indexes grouped by season: winter, spring, summer, autumn
const SEASONS: [[usize; 3]; 4] = [[11, 0, 1], [2, 3, 4], [5, 6, 7], [8, 9, 10]];

/// Normalization width for linear metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Scale {
    /// Constant width
    Fixed { width: f64 },
    /// Width of `[lo, hi]`, widened to include both compared values
    Range { lo: f64, hi: f64 },
}

impl Scale {
    /// Normalization width for comparing `a` and `b`
    pub fn span(&self, a: f64, b: f64) -> f64 {
        match *self {
            Scale::Fixed { width } => width,
            Scale::Range { lo, hi } => hi.max(a).max(b) - lo.min(a).min(b),
        }
    }
}

/// `weight * (1 - |a - b| / span)`, bounded to `[0, weight]`
pub fn linear_similarity(weight: f64, a: f64, b: f64, scale: Scale) -> f64 {
    let span = scale.span(a, b);
    if span <= 0.0 {
        return if a == b { weight } else { 0.0 };
    }
    weight * (1.0 - (a - b).abs() / span).clamp(0.0, 1.0)
}

/// Month similarity: 1 for the same month, [`SEASON_FUZZ`] for adjacent
/// months or the same season, 0 otherwise. `None` for unknown month names.
pub fn season_similarity(a: &str, b: &str) -> Option<f64> {
    let idx_a = MONTHS.iter().position(|m| *m == a)?;
    let idx_b = MONTHS.iter().position(|m| *m == b)?;
    if idx_a == idx_b {
        return Some(1.0);
    }

    let season_of = |idx: usize| SEASONS.iter().position(|season| season.contains(&idx));
    // December/January wrap around inside winter, so plain index adjacency is enough
    if season_of(idx_a) == season_of(idx_b) || idx_a.abs_diff(idx_b) == 1 {
        Some(SEASON_FUZZ)
    } else {
        Some(0.0)
    }
}

/// Similarity lookup table for small enumerated domains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTable {
    rows: AHashMap<String, AHashMap<String, f64>>,
}

impl MatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a full row
    pub fn with_row(mut self, from: &str, entries: &[(&str, f64)]) -> Self {
        for (to, score) in entries {
            self.insert(from, to, *score);
        }
        self
    }

    pub fn insert(&mut self, from: &str, to: &str, score: f64) {
        self.rows
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), score);
    }

    pub fn lookup(&self, from: &str, to: &str) -> Option<f64> {
        self.rows.get(from).and_then(|row| row.get(to)).copied()
    }

    /// True if `key` has a row
    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// Row keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.rows.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Comparison rule attached to a field
#[derive(Debug, Clone)]
pub enum Metric {
    /// Same-named attributes always agree fully
    Constant,
    /// Full weight on equal values, zero otherwise
    Exact,
    /// Linear in the numeric difference
    Linear(Scale),
    /// Perfect when the other value is lower, linear otherwise
    LessIsPerfect(Scale),
    /// Lookup in a similarity table
    Table(Arc<MatchTable>),
    /// Nearest common ancestor in a taxonomy
    Tree(Arc<Taxonomy>),
    /// Month/season proximity
    Season,
    /// Linear in the latitudinal distance between two places
    Latitude(Scale),
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Constant => "constant",
            Metric::Exact => "exact",
            Metric::Linear(_) => "linear",
            Metric::LessIsPerfect(_) => "less-is-perfect",
            Metric::Table(_) => "table",
            Metric::Tree(_) => "tree",
            Metric::Season => "season",
            Metric::Latitude(_) => "latitude",
        }
    }

    pub fn scale(&self) -> Option<Scale> {
        match self {
            Metric::Linear(s) | Metric::LessIsPerfect(s) | Metric::Latitude(s) => Some(*s),
            _ => None,
        }
    }

    /// Same metric normalized over `[lo, hi]`; `None` if the metric has no scale
    pub fn with_range(&self, lo: f64, hi: f64) -> Option<Metric> {
        let scale = Scale::Range { lo, hi };
        match self {
            Metric::Linear(_) => Some(Metric::Linear(scale)),
            Metric::LessIsPerfect(_) => Some(Metric::LessIsPerfect(scale)),
            Metric::Latitude(_) => Some(Metric::Latitude(scale)),
            _ => None,
        }
    }

    /// Check a value against the metric's domain (table rows, taxonomy nodes)
    pub fn admits(&self, field: &str, value: &Value) -> Result<()> {
        match (self, value) {
            (Metric::Table(table), Value::Text(s)) if !table.contains(s) => Err(Error::invalid_value(
                field,
                format!("'{}' is not one of {}", s, table.keys().join(", ")),
            )),
            (Metric::Tree(tree), Value::Text(s)) if !tree.contains(s) => Err(Error::invalid_value(
                field,
                format!("unrecognised category '{}'", s),
            )),
            _ => Ok(()),
        }
    }

    /// Score `theirs` against `ours` for an attribute of the given weight
    pub fn compare(&self, field: &str, weight: f64, ours: &Value, theirs: &Value) -> Result<f64> {
        match self {
            Metric::Constant => Ok(weight),
            Metric::Exact => Ok(if ours == theirs { weight } else { 0.0 }),
            Metric::Linear(scale) => {
                let (a, b) = numbers(field, ours, theirs)?;
                Ok(linear_similarity(weight, a, b, *scale))
            }
            Metric::LessIsPerfect(scale) => {
                let (a, b) = numbers(field, ours, theirs)?;
                if b < a {
                    Ok(weight)
                } else {
                    Ok(linear_similarity(weight, a, b, *scale))
                }
            }
            Metric::Table(table) => {
                let (a, b) = texts(field, ours, theirs)?;
                table.lookup(a, b)
                    .map(|score| weight * score)
                    .ok_or_else(|| Error::invalid_value(field, format!("no table entry for '{}' -> '{}'", a, b)))
            }
            Metric::Tree(tree) => {
                let (a, b) = texts(field, ours, theirs)?;
                if a == b {
                    return Ok(weight);
                }
                tree.find_common_value(&[a, b])
                    .map(|value| weight * value)
                    .ok_or_else(|| Error::invalid_value(field, format!("'{}' or '{}' is not in the taxonomy", a, b)))
            }
            Metric::Season => {
                let (a, b) = texts(field, ours, theirs)?;
                season_similarity(a, b)
                    .map(|score| weight * score)
                    .ok_or_else(|| Error::invalid_value(field, format!("unrecognised month in '{}' / '{}'", a, b)))
            }
            Metric::Latitude(scale) => match (ours, theirs) {
                (Value::Place(a), Value::Place(b)) => {
                    Ok(linear_similarity(weight, 0.0, a.distance(b), *scale))
                }
                _ => Err(Error::invalid_value(field, "expected places")),
            },
        }
    }
}

fn numbers(field: &str, a: &Value, b: &Value) -> Result<(f64, f64)> {
    match (a.as_number(), b.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::invalid_value(field, "expected numbers")),
    }
}

fn texts<'a>(field: &str, a: &'a Value, b: &'a Value) -> Result<(&'a str, &'a str)> {
    match (a.as_text(), b.as_text()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(Error::invalid_value(field, "expected text")),
    }
}
