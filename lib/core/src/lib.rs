//! # tripcase Core
//!
//! Core library for case-based retrieval of holiday packages.
//!
//! This crate provides the similarity framework and the retrieval engine:
//!
//! - [`Taxonomy`] - category tree with nearest-common-ancestor relatedness
//! - [`Metric`] / [`FieldSpec`] / [`Attribute`] - per-field values and how they compare
//! - [`CaseSchema`] - field registry every case is built through
//! - [`Case`] - weighted case similarity and adaptation
//! - [`Matcher`] - ranks a case base against a query and adapts the best match
//! - [`PlaceCache`] - owned, cached place resolution for region fields
//!
//! ## Example
//!
//! ```rust
//! use tripcase_core::{CaseSchema, Gazetteer, Matcher, PlaceCache, RawCase};
//!
//! let schema = CaseSchema::holiday();
//! let places = PlaceCache::new(Gazetteer::builtin());
//! let record = |fields: &[(&str, &str)]| -> RawCase {
//!     fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
//! };
//!
//! let cases = vec![
//!     schema.build_case(&record(&[("Duration", "7"), ("Price", "600")]), &places).unwrap(),
//!     schema.build_case(&record(&[("Duration", "14"), ("Price", "1100")]), &places).unwrap(),
//! ];
//! let matcher = Matcher::new(cases);
//!
//! let query = schema.build_case(&record(&[("Duration", "12")]), &places).unwrap();
//! let retrieval = matcher.run(&query, 1, true).unwrap();
//! assert_eq!(retrieval.matches[0].index, 1);
//! ```

pub mod attribute;
pub mod case;
pub mod error;
pub mod explain;
pub mod holiday;
pub mod matcher;
pub mod metric;
pub mod place;
pub mod ranges;
pub mod schema;
pub mod taxonomy;
pub mod value;

pub use attribute::{Adaptable, Adaptation, Adjustable, Adjustment, Attribute, FieldSpec, Matchable};
pub use case::{Case, CaseRecord, RawCase};
pub use error::{Error, Result};
pub use explain::{ExplainedResult, Explanation, FieldScore, RetrievalStats};
pub use matcher::{Adapted, Match, Matcher, Retrieval};
pub use metric::{MatchTable, Metric, Scale};
pub use place::{Coordinates, Gazetteer, Location, Place, PlaceCache, PlaceResolver};
pub use ranges::{Range, Ranges};
pub use schema::CaseSchema;
pub use taxonomy::{Taxonomy, TaxonomyNode};
pub use value::{Value, ValueKind};
