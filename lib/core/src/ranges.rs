//! Observed value ranges for range-scaled fields
//!
//! Linear metrics normalize by the width of a `[lo, hi]` range. The holiday
//! registry ships ranges taken from the reference case base; importing a new
//! case base derives them from the imported cases instead.

use crate::case::Case;
use crate::metric::{Metric, Scale};
use crate::schema::CaseSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lo: f64,
    pub hi: f64,
}

impl Range {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    fn include(self, value: f64) -> Self {
        Self::new(self.lo.min(value), self.hi.max(value))
    }
}

/// Per-field ranges, keyed by canonical field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranges(BTreeMap<String, Range>);

impl Ranges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive ranges for every range-scaled field of `schema` from `cases`.
    ///
    /// Numeric fields get `[min, max]` of the observed values. Latitude fields
    /// get the smallest and largest latitudinal distance between two distinct
    /// resolved places. Fields without observations are left out.
    pub fn observe<'a>(schema: &CaseSchema, cases: impl IntoIterator<Item = &'a Case>) -> Self {
        let cases: Vec<&Case> = cases.into_iter().collect();
        let mut ranges = Ranges::new();

        for spec in schema.fields() {
            match &spec.metric {
                Metric::Linear(Scale::Range { .. }) | Metric::LessIsPerfect(Scale::Range { .. }) => {
                    let observed = cases
                        .iter()
                        .filter_map(|case| case.get(&spec.name))
                        .filter_map(|attr| attr.value().as_number())
                        .fold(None, |range: Option<Range>, n| {
                            Some(range.map_or(Range::new(n, n), |r| r.include(n)))
                        });
                    if let Some(range) = observed {
                        ranges.insert(&spec.name, range);
                    }
                }
                Metric::Latitude(_) => {
                    let mut latitudes: Vec<f64> = cases
                        .iter()
                        .filter_map(|case| case.get(&spec.name))
                        .filter_map(|attr| attr.value().as_place())
                        .filter_map(|place| place.latitude())
                        .collect();
                    latitudes.sort_by(f64::total_cmp);
                    latitudes.dedup();
                    if let Some(range) = latitude_spread(&latitudes) {
                        ranges.insert(&spec.name, range);
                    }
                }
                _ => {}
            }
        }
        ranges
    }

    pub fn insert(&mut self, field: &str, range: Range) {
        self.0.insert(field.to_string(), range);
    }

    pub fn get(&self, field: &str) -> Option<Range> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Range)> {
        self.0.iter().map(|(name, range)| (name.as_str(), *range))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Smallest gap and total spread of sorted, distinct latitudes
fn latitude_spread(sorted: &[f64]) -> Option<Range> {
    let (first, last) = (sorted.first()?, sorted.last()?);
    let min_gap = sorted
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .min_by(f64::total_cmp)?;
    Some(Range::new(min_gap, last - first))
}
