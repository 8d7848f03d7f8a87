//! Explainability for case similarity
//!
//! Output structures that show how a similarity score was assembled from the
//! per-field contributions, plus summary statistics for a result list.

use crate::case::Case;
use crate::matcher::Match;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Contribution of one field to a case similarity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldScore {
    /// Weighted similarity, in `[0, weight]`
    pub similarity: f64,
    pub weight: f64,
}

/// A case similarity with its per-field breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Aggregate score, `Σ similarity / Σ weight`
    pub score: f64,
    pub fields: BTreeMap<String, FieldScore>,
}

impl Explanation {
    pub fn new(fields: BTreeMap<String, FieldScore>) -> Self {
        let (total_similarity, total_weight) = fields
            .values()
            .fold((0.0, 0.0), |(s, w), field| (s + field.similarity, w + field.weight));
        let score = if total_weight == 0.0 { 0.0 } else { total_similarity / total_weight };
        Self { score, fields }
    }

    /// Field with the largest weighted contribution
    pub fn top_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .max_by(|a, b| a.1.similarity.total_cmp(&b.1.similarity))
            .map(|(name, _)| name.as_str())
    }
}

/// One entry of a rendered result list
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedResult {
    /// Position in the case base; `None` for a synthesized case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub score: f64,
    pub adapted: bool,
    /// Field name -> display value
    pub case: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<Explanation>,
}

impl ExplainedResult {
    pub fn new(index: Option<usize>, score: f64, case: &Case) -> Self {
        Self {
            index,
            score,
            adapted: index.is_none(),
            case: case
                .attributes()
                .map(|attr| (attr.name().to_string(), attr.to_string()))
                .collect(),
            explain: None,
        }
    }

    /// Attach the per-field breakdown of `query` against `case`
    pub fn with_explanation(mut self, query: &Case, case: &Case) -> Result<Self> {
        self.explain = Some(query.explain(case)?);
        Ok(self)
    }
}

/// Summary statistics for a retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalStats {
    /// Number of cases scored
    pub candidates_count: usize,
    /// Number of results returned
    pub results_count: usize,
    pub avg_score: f64,
    pub best_score: f64,
    /// Field that contributed most to the best result
    pub top_contributing_field: Option<String>,
}

impl RetrievalStats {
    /// Compute stats from ranked matches
    pub fn compute(query: &Case, matches: &[Match<'_>], candidates_count: usize) -> Result<Self> {
        let Some(best) = matches.first() else {
            return Ok(Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_field: None,
            });
        };

        let avg_score = matches.iter().map(|m| m.score).sum::<f64>() / matches.len() as f64;
        let explanation = query.explain(best.case)?;

        Ok(Self {
            candidates_count,
            results_count: matches.len(),
            avg_score,
            best_score: best.score,
            top_contributing_field: explanation.top_field().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(similarity: f64, weight: f64) -> FieldScore {
        FieldScore { similarity, weight }
    }

    #[test]
    fn test_explanation_score() {
        let fields: BTreeMap<String, FieldScore> = [
            ("Hotel".to_string(), score(3.0, 3.0)),
            ("Transportation".to_string(), score(0.4, 1.0)),
        ]
        .into_iter()
        .collect();
        let explanation = Explanation::new(fields);
        assert!((explanation.score - 0.85).abs() < 1e-12);
        assert_eq!(explanation.top_field(), Some("Hotel"));
    }

    #[test]
    fn test_empty_explanation() {
        let explanation = Explanation::new(BTreeMap::new());
        assert_eq!(explanation.score, 0.0);
        assert_eq!(explanation.top_field(), None);
    }

    #[test]
    fn test_stats_on_empty_results() {
        let stats = RetrievalStats::compute(&Case::new(), &[], 12).unwrap();
        assert_eq!(stats.candidates_count, 12);
        assert_eq!(stats.results_count, 0);
        assert!(stats.top_contributing_field.is_none());
    }

    #[test]
    fn test_explained_result_serialization() {
        let result = ExplainedResult::new(None, 0.9, &Case::new());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["adapted"], true);
        assert!(json.get("index").is_none());
        assert!(json.get("explain").is_none());
    }
}
