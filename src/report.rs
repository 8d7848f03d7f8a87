//! Query results in presentable form

use serde::Serialize;
use std::collections::BTreeMap;
use tripcase_core::{Case, ExplainedResult, Result, Retrieval, RetrievalStats};

/// A finished query: the query itself, the adapted case (if any) followed by
/// the ranked matches, and summary statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: BTreeMap<String, String>,
    pub results: Vec<ExplainedResult>,
    pub stats: RetrievalStats,
}

impl QueryReport {
    /// `explain` attaches the per-field breakdown to every result
    pub fn new(query: &Case, retrieval: &Retrieval<'_>, candidates: usize, explain: bool) -> Result<Self> {
        let mut results = Vec::with_capacity(retrieval.matches.len() + 1);

        if let Some(adapted) = &retrieval.adapted {
            let mut result = ExplainedResult::new(None, adapted.score, &adapted.case);
            if explain {
                result = result.with_explanation(query, &adapted.case)?;
            }
            results.push(result);
        }
        for m in &retrieval.matches {
            let mut result = ExplainedResult::new(Some(m.index), m.score, m.case);
            if explain {
                result = result.with_explanation(query, m.case)?;
            }
            results.push(result);
        }

        Ok(Self {
            query: query
                .attributes()
                .map(|attr| (attr.name().to_string(), attr.to_string()))
                .collect(),
            results,
            stats: RetrievalStats::compute(query, &retrieval.matches, candidates)?,
        })
    }
}
