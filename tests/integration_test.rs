// Integration tests for tripcase
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;
use tripcase::{
    results_table, CaseSchema, Error, Gazetteer, Matcher, PlaceCache, QueryReport, RawCase,
    StorageManager, Value,
};

const TRAVEL_CASES: &str = r#"
defcase Journey1: TravelCase.
  JourneyCode: 1.
  HolidayType: Bathing.
  Price: 2498.
  NumberOfPersons: 2.
  Region: Egypt.
  Transportation: Plane.
  Duration: 14.
  Season: April.
  Accommodation: TwoStars.
  Hotel: "Hotel White House, Egypt".

defcase Journey2: TravelCase.
  JourneyCode: 2.
  HolidayType: Skiing.
  Price: 1200.
  NumberOfPersons: 4.
  Region: Tyrol.
  Transportation: Car.
  Duration: 7.
  Season: January.
  Accommodation: ThreeStars.
  Hotel: "Alpenhof, Tyrol".

defcase Journey3: TravelCase.
  JourneyCode: 3.
  HolidayType: Wandering.
  Price: 800.
  NumberOfPersons: 2.
  Region: Bavaria.
  Transportation: Train.
  Duration: 10.
  Season: September.
  Accommodation: HolidayFlat.
  Hotel: "Ferienwohnung Berg, Bavaria".

defcase Journey4: TravelCase.
  JourneyCode: 4.
  HolidayType: City.
  Price: 650.
  NumberOfPersons: 3.
  Region: Atlantis.
  Transportation: Coach.
  Duration: 5.
  Season: May.
  Accommodation: FourStars.
  Hotel: "Grand Hotel".

defcase Journey5: TravelCase.
  JourneyCode: 5.
  HolidayType: Gambling.
  Price: 999.
"#;

fn raw(fields: &[(&str, &str)]) -> RawCase {
    fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn write_cases(dir: &TempDir) -> PathBuf {
    let file = dir.path().join("travel.cases");
    std::fs::write(&file, TRAVEL_CASES).unwrap();
    file
}

fn imported() -> (TempDir, StorageManager) {
    let dir = TempDir::new().unwrap();
    let file = write_cases(&dir);
    let storage = StorageManager::open(dir.path().join("data")).unwrap();
    let places = PlaceCache::new(Gazetteer::builtin());
    storage.import_file(&file, &places, false).unwrap();
    (dir, storage)
}

#[test]
fn test_import_report() {
    let dir = TempDir::new().unwrap();
    let file = write_cases(&dir);
    let storage = StorageManager::open(dir.path().join("data")).unwrap();
    let places = PlaceCache::new(Gazetteer::builtin());

    let report = storage.import_file(&file, &places, false).unwrap();
    assert_eq!(report.parsed, 5);
    assert_eq!(report.imported, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.unresolved, vec!["atlantis".to_string()]);

    let price = report.ranges.get("Price").unwrap();
    assert_eq!((price.lo, price.hi), (650.0, 2498.0));
    let persons = report.ranges.get("NumberOfPersons").unwrap();
    assert_eq!((persons.lo, persons.hi), (2.0, 4.0));
    assert!(report.ranges.get("Region").is_some());

    let status = storage.status().unwrap();
    assert!(status.exists);
    assert_eq!(status.cases, 4);
}

#[test]
fn test_snapshot_reload_is_faithful() {
    let (_dir, storage) = imported();
    let case_base = storage.load_case_base().unwrap();
    assert_eq!(case_base.matcher.len(), 4);

    let skiing = case_base.matcher.get(1).unwrap();
    assert_eq!(skiing.get("HolidayType").unwrap().value(), &Value::Text("Skiing".to_string()));
    assert_eq!(skiing.get("Accommodation").unwrap().to_string(), "Three stars");
    let region = skiing.get("Region").unwrap().value().as_place().unwrap();
    assert!(region.is_resolved());

    // Each stored case is its own best match
    for (index, case) in case_base.matcher.cases().iter().enumerate() {
        let best = case_base.matcher.retrieve(case, 1).unwrap();
        assert_eq!(best[0].index, index);
        assert!((best[0].score - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_query_and_adapt() {
    let (_dir, storage) = imported();
    let case_base = storage.load_case_base().unwrap();
    let places = PlaceCache::new(Gazetteer::builtin());

    let query = case_base
        .query(
            &raw(&[
                ("HolidayType", "wandering"),
                ("Region", "Austria"),
                ("Duration", "14"),
                ("NumberOfPersons", "2"),
            ]),
            &places,
        )
        .unwrap();

    let retrieval = case_base.matcher.run(&query, 2, true).unwrap();
    assert_eq!(retrieval.matches.len(), 2);
    assert_eq!(retrieval.matches[0].index, 2);

    let adapted = retrieval.adapted.as_ref().unwrap();
    assert_eq!(adapted.source, 2);
    assert!(adapted.score >= retrieval.matches[0].score);
    assert_eq!(adapted.case.get("Duration").unwrap().value(), &Value::Number(14.0));
    // 10 -> 14 days
    assert_eq!(adapted.case.get("Price").unwrap().value(), &Value::Number(1120.0));

    let report = QueryReport::new(&query, &retrieval, case_base.matcher.len(), true).unwrap();
    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].adapted);
    assert_eq!(report.stats.candidates_count, 4);
    assert_eq!(report.stats.results_count, 2);

    let table = results_table(&report, true).to_string();
    assert!(table.contains("Adapted result (sim. "));
    assert!(table.contains("Result 1 (sim. "));
    assert!(table.contains("Result 2 (sim. "));
    assert!(table.contains("Wandering (1.00/1.00)"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][1]["index"], 2);
    assert_eq!(json["query"]["HolidayType"], "Wandering");
}

#[test]
fn test_weights_change_ranking() {
    let (_dir, storage) = imported();
    let places = PlaceCache::new(Gazetteer::builtin());
    let fields = [("Transportation", "Car"), ("Hotel", "Grand Hotel")];

    let plain = storage.load_case_base().unwrap();
    let query = plain.query(&raw(&fields), &places).unwrap();
    let best = plain.matcher.retrieve(&query, 1).unwrap();
    let plain_best = best[0].index;

    let weights: HashMap<String, f64> = [("transportation".to_string(), 10.0)].into_iter().collect();
    let weighted = storage.load_case_base().unwrap().with_weights(&weights).unwrap();
    let query = weighted.query(&raw(&fields), &places).unwrap();
    let best = weighted.matcher.retrieve(&query, 1).unwrap();

    // Grand Hotel (Coach) wins on the hotel, the Car journey once transport dominates
    assert_eq!(plain_best, 3);
    assert_eq!(best[0].index, 1);
}

#[test]
fn test_invalid_query_values() {
    let (_dir, storage) = imported();
    let case_base = storage.load_case_base().unwrap();
    let places = PlaceCache::new(Gazetteer::builtin());

    assert!(matches!(
        case_base.query(&raw(&[("Transportation", "Boat")]), &places),
        Err(Error::InvalidValue { .. })
    ));
    assert!(matches!(
        case_base.query(&raw(&[("Stars", "3")]), &places),
        Err(Error::UnknownAttribute(_))
    ));
}

#[test]
fn test_matcher_without_storage() {
    let schema = CaseSchema::holiday();
    let places = PlaceCache::new(Gazetteer::builtin());
    let cases = [
        raw(&[("Season", "July"), ("Region", "Crete")]),
        raw(&[("Season", "August"), ("Region", "Sweden")]),
        raw(&[("Season", "January"), ("Region", "Crete")]),
    ]
    .iter()
    .map(|record| schema.build_case(record, &places).unwrap())
    .collect();
    let matcher = Matcher::new(cases);

    let query = schema.build_case(&raw(&[("Season", "June"), ("Region", "crete")]), &places).unwrap();
    let ranked = matcher.retrieve(&query, 3).unwrap();
    assert_eq!(ranked.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 2, 1]);
    // Nothing adaptable in the query
    assert!(matcher.adapt(&query, &ranked).unwrap_err().is_adaptation());
}
