//! Retrieval engine
//!
//! The [`Matcher`] holds the case base and ranks every stored case against a
//! query by linear scan. The best match can then be adapted towards the
//! query; the adapted case is only offered when it scores at least as well as
//! the match it came from.

use crate::attribute::Attribute;
use crate::case::Case;
use crate::{Error, Result};
use std::cmp::Ordering;
use tracing::debug;

/// A stored case ranked against a query
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    /// Position in the case base
    pub index: usize,
    pub score: f64,
    pub case: &'a Case,
}

/// A case synthesized from the best match
#[derive(Debug, Clone, PartialEq)]
pub struct Adapted {
    pub case: Case,
    pub score: f64,
    /// Case base position of the match it was adapted from
    pub source: usize,
}

/// Ranked matches plus the adapted case, when adaptation succeeded
#[derive(Debug, Clone)]
pub struct Retrieval<'a> {
    pub matches: Vec<Match<'a>>,
    pub adapted: Option<Adapted>,
}

impl Retrieval<'_> {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.adapted.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    cases: Vec<Case>,
}

impl Matcher {
    pub fn new(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, index: usize) -> Option<&Case> {
        self.cases.get(index)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// The `k` stored cases most similar to `query`, best first.
    ///
    /// Equal scores keep case base order, so the result is deterministic.
    pub fn retrieve(&self, query: &Case, k: usize) -> Result<Vec<Match<'_>>> {
        let mut matches = self
            .cases
            .iter()
            .enumerate()
            .map(|(index, case)| query.similarity(case).map(|score| Match { index, score, case }))
            .collect::<Result<Vec<_>>>()?;

        matches.sort_by(|a, b| rank(a.score, b.score).then(a.index.cmp(&b.index)));
        matches.truncate(k);

        debug!(
            candidates = self.cases.len(),
            returned = matches.len(),
            best = matches.first().map(|m| m.score),
            "retrieved matches"
        );
        Ok(matches)
    }

    /// Adapt the best of `ranked` towards `query`.
    ///
    /// Fails with [`Error::Adaptation`] when there is nothing to adapt from,
    /// when no adaptable query value differs from the best match, or when the
    /// adapted case would score below the best match. Both scores are
    /// computed against `query`, whatever `ranked` claims.
    pub fn adapt(&self, query: &Case, ranked: &[Match<'_>]) -> Result<Adapted> {
        let best = ranked
            .first()
            .ok_or_else(|| Error::Adaptation("cannot adapt from an empty result".to_string()))?;

        let differs = |attr: &Attribute| {
            attr.is_adaptable()
                && best.case.get(attr.name()).is_some_and(|theirs| theirs.value() != attr.value())
        };
        if !query.attributes().any(differs) {
            return Err(Error::Adaptation("no adaptable values differ".to_string()));
        }

        let case = best.case.adapt(query)?;
        let score = query.similarity(&case)?;
        let best_score = query.similarity(best.case)?;
        if score < best_score {
            return Err(Error::Adaptation(format!(
                "adapted case scores {:.4}, below the best match at {:.4}",
                score, best_score
            )));
        }

        Ok(Adapted { case, score, source: best.index })
    }

    /// Retrieve `k` matches and, if `adapt` is set, try to adapt the best one.
    ///
    /// An adaptation failure is not an error here: the plain matches are
    /// returned on their own.
    pub fn run(&self, query: &Case, k: usize, adapt: bool) -> Result<Retrieval<'_>> {
        let matches = self.retrieve(query, k)?;
        let adapted = if adapt && !matches.is_empty() {
            match self.adapt(query, &matches) {
                Ok(adapted) => Some(adapted),
                Err(e) if e.is_adaptation() => {
                    debug!(reason = %e, "no adapted result");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        Ok(Retrieval { matches, adapted })
    }
}

/// Descending score order
fn rank(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
