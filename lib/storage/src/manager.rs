use crate::parser::CaseParser;
use crate::snapshot::{CaseBaseSnapshot, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tripcase_core::{
    Case, CaseSchema, Error, Matcher, PlaceCache, PlaceResolver, RawCase, Ranges, Result,
};

/// Outcome of importing a case file
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Records found in the file
    pub parsed: usize,
    pub imported: usize,
    /// Records that failed validation
    pub skipped: usize,
    /// Place names stored unresolved
    pub unresolved: Vec<String>,
    pub ranges: Ranges,
}

/// Loaded case base: the schema with the stored ranges applied and the
/// matcher over the stored cases
#[derive(Debug, Clone)]
pub struct CaseBase {
    pub schema: CaseSchema,
    pub matcher: Matcher,
    pub created_at: Option<DateTime<Utc>>,
}

impl CaseBase {
    /// Reweight the schema and move every stored case onto it
    pub fn with_weights(self, weights: &HashMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Ok(self);
        }
        let schema = self.schema.with_weights(weights)?;
        let cases = self
            .matcher
            .cases()
            .iter()
            .map(|case| schema.rebind(case))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema,
            matcher: Matcher::new(cases),
            created_at: self.created_at,
        })
    }

    /// Build a query case against the loaded schema
    pub fn query(&self, raw: &RawCase, places: &dyn PlaceResolver) -> Result<Case> {
        self.schema.build_case(raw, places)
    }
}

/// Snapshot summary for status output
#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub data_dir: PathBuf,
    pub snapshot: PathBuf,
    pub exists: bool,
    pub cases: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub ranges: Ranges,
}

/// Manages the case base of a data directory
pub struct StorageManager {
    data_dir: PathBuf,
    store: SnapshotStore,
    schema: CaseSchema,
}

impl StorageManager {
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let store = SnapshotStore::new(&data_dir)
            .map_err(|e| Error::Storage(format!("{:#}", e)))?;
        Ok(Self {
            data_dir,
            store,
            schema: CaseSchema::holiday(),
        })
    }

    /// Use `schema` instead of the holiday registry
    pub fn with_schema(mut self, schema: CaseSchema) -> Self {
        self.schema = schema;
        self
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[inline]
    #[must_use]
    pub fn schema(&self) -> &CaseSchema {
        &self.schema
    }

    /// Parse a case file and replace the snapshot with its cases.
    ///
    /// Records that fail to build are skipped and counted. Ranges are derived
    /// from the imported cases. An existing snapshot is only replaced when
    /// `force` is set.
    pub fn import_file<R: PlaceResolver>(
        &self,
        path: &Path,
        places: &PlaceCache<R>,
        force: bool,
    ) -> Result<ImportReport> {
        if self.store.exists() && !force {
            return Err(Error::Storage(format!(
                "{} already exists, use --force to replace it",
                self.store.path().display()
            )));
        }

        let parser = CaseParser::new().map_err(|e| Error::Storage(format!("{:#}", e)))?;
        let records = parser
            .parse_file(path)
            .map_err(|e| Error::Storage(format!("{:#}", e)))?;
        info!("Parsed {} records from {}", records.len(), path.display());

        let mut cases = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for (position, record) in records.iter().enumerate() {
            match self.schema.build_case(record, places) {
                Ok(case) => cases.push(case),
                Err(e) => {
                    warn!(record = position + 1, error = %e, "skipping record");
                    skipped += 1;
                }
            }
        }

        let ranges = Ranges::observe(&self.schema, &cases);
        let snapshot = CaseBaseSnapshot::new(
            ranges.clone(),
            cases.iter().map(Case::to_record).collect(),
        );
        self.store
            .save(&snapshot)
            .map_err(|e| Error::Persistence(format!("{:#}", e)))?;
        info!("Imported {} cases into {}", cases.len(), self.store.path().display());

        Ok(ImportReport {
            parsed: records.len(),
            imported: cases.len(),
            skipped,
            unresolved: places.unresolved(),
            ranges,
        })
    }

    /// Load the stored case base. A missing snapshot gives an empty case base.
    pub fn load_case_base(&self) -> Result<CaseBase> {
        let Some(snapshot) = self
            .store
            .load()
            .map_err(|e| Error::Persistence(format!("{:#}", e)))?
        else {
            warn!("No cases found (looking in {})", self.store.path().display());
            return Ok(CaseBase {
                schema: self.schema.clone(),
                matcher: Matcher::default(),
                created_at: None,
            });
        };

        // Ranges go into the schema before any case is rebuilt
        let schema = self.schema.with_ranges(&snapshot.ranges)?;
        let cases = snapshot
            .cases
            .iter()
            .map(|record| schema.restore_case(record))
            .collect::<Result<Vec<_>>>()?;
        info!("Loaded {} cases from {}", cases.len(), self.store.path().display());

        Ok(CaseBase {
            schema,
            matcher: Matcher::new(cases),
            created_at: Some(snapshot.created_at),
        })
    }

    pub fn status(&self) -> Result<StorageStatus> {
        let snapshot = self
            .store
            .load()
            .map_err(|e| Error::Persistence(format!("{:#}", e)))?;
        Ok(StorageStatus {
            data_dir: self.data_dir.clone(),
            snapshot: self.store.path().to_path_buf(),
            exists: snapshot.is_some(),
            cases: snapshot.as_ref().map_or(0, |s| s.cases.len()),
            created_at: snapshot.as_ref().map(|s| s.created_at),
            ranges: snapshot.map(|s| s.ranges).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tripcase_core::{Gazetteer, Value};

    const CASES: &str = "\
defcase Journey1: TravelCase.
  Price: 300.
  Duration: 7.
  Region: Crete.
defcase Journey2: TravelCase.
  Price: 1000.
  Duration: 14.
  Region: Atlantis.
defcase Journey3: TravelCase.
  Price: 500.
  Duration: a fortnight.
";

    fn import(dir: &TempDir) -> (StorageManager, ImportReport) {
        let file = dir.path().join("travel.cases");
        std::fs::write(&file, CASES).unwrap();
        let manager = StorageManager::open(dir.path().join("data")).unwrap();
        let places = PlaceCache::new(Gazetteer::builtin());
        let report = manager.import_file(&file, &places, false).unwrap();
        (manager, report)
    }

    #[test]
    fn test_import_skips_bad_records() {
        let dir = TempDir::new().unwrap();
        let (_, report) = import(&dir);
        assert_eq!(report.parsed, 3);
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.unresolved, vec!["atlantis".to_string()]);
        assert_eq!(report.ranges.get("Price").map(|r| (r.lo, r.hi)), Some((300.0, 1000.0)));
    }

    #[test]
    fn test_import_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let (manager, _) = import(&dir);
        let file = dir.path().join("travel.cases");
        let places = PlaceCache::new(Gazetteer::builtin());
        assert!(matches!(
            manager.import_file(&file, &places, false),
            Err(Error::Storage(_))
        ));
        assert!(manager.import_file(&file, &places, true).is_ok());
    }

    #[test]
    fn test_load_applies_stored_ranges() {
        let dir = TempDir::new().unwrap();
        let (manager, _) = import(&dir);
        let case_base = manager.load_case_base().unwrap();
        assert_eq!(case_base.matcher.len(), 2);
        assert!(case_base.created_at.is_some());
        assert_eq!(
            case_base.schema.ranges().get("Price").map(|r| (r.lo, r.hi)),
            Some((300.0, 1000.0))
        );

        let first = case_base.matcher.get(0).unwrap();
        assert_eq!(first.get("Price").unwrap().value(), &Value::Number(300.0));
        let unresolved = case_base.matcher.get(1).unwrap().get("Region").unwrap();
        assert!(!unresolved.value().as_place().unwrap().is_resolved());
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        let dir = TempDir::new().unwrap();
        let manager = StorageManager::open(dir.path()).unwrap();
        assert!(manager.load_case_base().unwrap().matcher.is_empty());
        let status = manager.status().unwrap();
        assert!(!status.exists);
        assert_eq!(status.cases, 0);
    }

    #[test]
    fn test_import_missing_file() {
        let dir = TempDir::new().unwrap();
        let manager = StorageManager::open(dir.path()).unwrap();
        let places = PlaceCache::new(Gazetteer::builtin());
        let result = manager.import_file(&dir.path().join("nope.cases"), &places, false);
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_custom_schema_is_used_for_import_and_load() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("travel.cases");
        std::fs::write(&file, CASES).unwrap();

        let weights: HashMap<String, f64> = [("Price".to_string(), 4.0)].into_iter().collect();
        let schema = CaseSchema::holiday().with_weights(&weights).unwrap();
        let manager = StorageManager::open(dir.path().join("data")).unwrap().with_schema(schema);
        assert_eq!(manager.schema().field("Price").unwrap().weight, 4.0);

        let places = PlaceCache::new(Gazetteer::builtin());
        manager.import_file(&file, &places, false).unwrap();
        let case_base = manager.load_case_base().unwrap();
        let price = case_base.matcher.get(0).unwrap().get("Price").unwrap();
        assert_eq!(price.weight(), 4.0);
    }

    #[test]
    fn test_with_weights_rebinds_cases() {
        let dir = TempDir::new().unwrap();
        let (manager, _) = import(&dir);
        let weights: HashMap<String, f64> = [("duration".to_string(), 2.0)].into_iter().collect();
        let case_base = manager.load_case_base().unwrap().with_weights(&weights).unwrap();
        let duration = case_base.matcher.get(0).unwrap().get("Duration").unwrap();
        assert_eq!(duration.weight(), 2.0);
    }
}
