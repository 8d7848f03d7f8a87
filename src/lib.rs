//! # tripcase
//!
//! Case-based retrieval of holiday packages.
//!
//! A case base of past holiday packages is ranked against a (possibly
//! partial) query by weighted per-field similarity. The best match can be
//! adapted to the query: adaptable fields such as the number of persons take
//! the queried value, and adjustable fields such as the price follow along.
//!
//! ## Quick Start
//!
//! ### From the Command Line
//!
//! ```bash
//! tripcase import travel.cases
//! tripcase query --set HolidayType=Skiing --set Duration=10 --set NumberOfPersons=4
//! tripcase names Transportation
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use tripcase::prelude::*;
//!
//! let storage = StorageManager::open("./data").unwrap();
//! let case_base = storage.load_case_base().unwrap();
//! let places = PlaceCache::new(Gazetteer::builtin());
//!
//! let mut raw = RawCase::new();
//! raw.insert("Region".to_string(), "Tyrol".to_string());
//! raw.insert("Season".to_string(), "January".to_string());
//! let query = case_base.query(&raw, &places).unwrap();
//!
//! for m in case_base.matcher.retrieve(&query, 3).unwrap() {
//!     println!("case {} scores {:.3}", m.index, m.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`tripcase-core`](https://docs.rs/tripcase-core) - Attributes, metrics, taxonomy, cases and the matcher
//! - [`tripcase-storage`](https://docs.rs/tripcase-storage) - Case file parsing and snapshots

pub mod config;
pub mod report;
pub mod table;

// Re-export core types
pub use tripcase_core::{
    Adapted, Attribute, Case, CaseRecord, CaseSchema, Error, Explanation, FieldSpec, Gazetteer,
    Match, Matcher, Metric, PlaceCache, PlaceResolver, RawCase, Ranges, Result, Retrieval,
    RetrievalStats, Taxonomy, Value,
};

// Re-export storage
pub use tripcase_storage::{CaseBase, ImportReport, StorageManager, StorageStatus};

pub use config::QueryConfig;
pub use report::QueryReport;
pub use table::{results_table, Table};

pub mod prelude {
    pub use crate::config::QueryConfig;
    pub use crate::report::QueryReport;
    pub use tripcase_core::{Case, CaseSchema, Gazetteer, Matcher, PlaceCache, PlaceResolver, RawCase};
    pub use tripcase_storage::{CaseBase, StorageManager};
}
