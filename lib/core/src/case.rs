//! Cases: named collections of attributes
//!
//! A case is either a stored record of the case base or a (possibly partial)
//! query. Case similarity is the weighted mean of the attribute similarities
//! of the matching attributes the two cases have in common.

use crate::attribute::{Adaptable, Adjustable, Attribute, Matchable};
use crate::explain::{Explanation, FieldScore};
use crate::value::Value;
use crate::Result;
use std::collections::BTreeMap;

/// Raw input record: field name -> unparsed value
pub type RawCase = BTreeMap<String, String>;

/// Serialized form of a case: field name -> validated value
pub type CaseRecord = BTreeMap<String, Value>;

/// A named collection of attributes, at most one per name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Case {
    attributes: BTreeMap<String, Attribute>,
}

impl Case {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any attribute of the same name
    pub fn with(mut self, attribute: Attribute) -> Self {
        self.insert(attribute);
        self
    }

    /// Set an attribute, returning the one it replaced
    pub fn insert(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.attributes.insert(attribute.name().to_string(), attribute)
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes in name order
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn to_record(&self) -> CaseRecord {
        self.attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.value().clone()))
            .collect()
    }

    /// Our matching attributes paired with the same-named attribute of `other`.
    /// Attributes `other` lacks are skipped, not scored as zero.
    fn matching_pairs<'a>(&'a self, other: &'a Case) -> impl Iterator<Item = (&'a Attribute, &'a Attribute)> {
        self.attributes
            .values()
            .filter(|attr| attr.is_matching())
            .filter_map(move |attr| other.get(attr.name()).map(|theirs| (attr, theirs)))
    }

    /// Weighted similarity of `other` to this case, in `[0, 1]` for
    /// non-negative weights. Zero when no matching attribute is shared.
    pub fn similarity(&self, other: &Case) -> Result<f64> {
        let mut total_similarity = 0.0;
        let mut total_weight = 0.0;
        for (ours, theirs) in self.matching_pairs(other) {
            total_similarity += ours.similarity(theirs)?;
            total_weight += ours.weight();
        }

        if total_weight == 0.0 {
            return Ok(0.0);
        }
        Ok(total_similarity / total_weight)
    }

    /// Similarity of `other` with the per-field breakdown
    pub fn explain(&self, other: &Case) -> Result<Explanation> {
        let mut fields = BTreeMap::new();
        for (ours, theirs) in self.matching_pairs(other) {
            fields.insert(ours.name().to_string(), FieldScore {
                similarity: ours.similarity(theirs)?,
                weight: ours.weight(),
            });
        }
        Ok(Explanation::new(fields))
    }

    /// Product of the adaptation ratios of every adaptable attribute that
    /// `other` also has. 1.0 when there is none.
    pub fn adaptation_ratio(&self, other: &Case) -> Result<f64> {
        self.attributes
            .values()
            .filter(|attr| attr.is_adaptable())
            .filter_map(|attr| other.get(attr.name()).map(|theirs| (attr, theirs)))
            .try_fold(1.0, |ratio, (ours, theirs)| -> Result<f64> {
                Ok(ratio * ours.adapt_distance(theirs)?)
            })
    }

    /// New case moved towards `other`.
    ///
    /// Adaptable attributes that `other` has take `other`'s value, adjustable
    /// attributes are rescaled by the combined adaptation ratio, everything
    /// else is copied.
    pub fn adapt(&self, other: &Case) -> Result<Case> {
        let ratio = self.adaptation_ratio(other)?;

        let mut attributes = BTreeMap::new();
        for (name, attr) in &self.attributes {
            let adapted = match other.get(name) {
                Some(theirs) if attr.is_adaptable() => theirs.clone(),
                _ if attr.is_adjustable() => attr.adjusted(ratio)?,
                _ => attr.clone(),
            };
            attributes.insert(name.clone(), adapted);
        }
        Ok(Case { attributes })
    }
}

impl FromIterator<Attribute> for Case {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut case = Case::new();
        for attribute in iter {
            case.insert(attribute);
        }
        case
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CaseSchema;
    use crate::place::{Gazetteer, PlaceCache};
    use crate::Error;

    fn build(schema: &CaseSchema, fields: &[(&str, &str)]) -> Case {
        let places = PlaceCache::new(Gazetteer::builtin());
        let raw: RawCase = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        schema.build_case(&raw, &places).unwrap()
    }

    fn full_case(schema: &CaseSchema) -> Case {
        build(schema, &[
            ("JourneyCode", "17"),
            ("HolidayType", "Bathing"),
            ("Price", "1200"),
            ("NumberOfPersons", "2"),
            ("Region", "Crete"),
            ("Transportation", "Plane"),
            ("Duration", "14"),
            ("Season", "July"),
            ("Accommodation", "Three stars"),
            ("Hotel", "Hotel Minos"),
        ])
    }

    #[test]
    fn test_self_similarity_is_one() {
        let schema = CaseSchema::holiday();
        let case = full_case(&schema);
        assert!((case.similarity(&case).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_attribute_is_skipped() {
        let schema = CaseSchema::holiday();
        let stored = full_case(&schema);
        let query = build(&schema, &[("Transportation", "Plane"), ("Duration", "14")]);

        // Fields only in the stored case do not dilute the score
        assert_eq!(query.similarity(&stored).unwrap(), 1.0);

        let mut partial = stored.clone();
        partial.remove("Transportation");
        // Transportation is skipped, Duration still matches perfectly
        assert_eq!(query.similarity(&partial).unwrap(), 1.0);
    }

    #[test]
    fn test_no_common_attributes_scores_zero() {
        let schema = CaseSchema::holiday();
        let a = build(&schema, &[("Duration", "7")]);
        let b = build(&schema, &[("Price", "700")]);
        assert_eq!(a.similarity(&b).unwrap(), 0.0);
        assert_eq!(Case::new().similarity(&a).unwrap(), 0.0);
    }

    #[test]
    fn test_non_matching_attribute_is_ignored() {
        let schema = CaseSchema::holiday();
        let query = build(&schema, &[("JourneyCode", "1"), ("Duration", "7"), ("Price", "900")]);
        let with_code = build(&schema, &[("JourneyCode", "99"), ("Duration", "10"), ("Price", "950")]);
        let without_code = build(&schema, &[("Duration", "10"), ("Price", "950")]);
        let query_without_code = build(&schema, &[("Duration", "7"), ("Price", "900")]);

        let a = query.similarity(&with_code).unwrap();
        let b = query_without_code.similarity(&without_code).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_weighted_mean() {
        let schema = CaseSchema::holiday()
            .with_weights(&[("Hotel".to_string(), 3.0)].into_iter().collect())
            .unwrap();
        let query = build(&schema, &[("Hotel", "Minos"), ("Transportation", "Car")]);
        let stored = build(&schema, &[("Hotel", "Minos"), ("Transportation", "Plane")]);
        // Hotel: 3.0 of 3.0, Transportation: Car -> Plane = 0.4 of 1.0
        assert!((query.similarity(&stored).unwrap() - 3.4 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_is_asymmetric() {
        let schema = CaseSchema::holiday();
        let cheap = build(&schema, &[("Price", "300")]);
        let dear = build(&schema, &[("Price", "3000")]);
        assert_eq!(dear.similarity(&cheap).unwrap(), 1.0);
        assert!(cheap.similarity(&dear).unwrap() < 1.0);
    }

    #[test]
    fn test_adapt_identical_query_is_identity() {
        let schema = CaseSchema::holiday();
        let case = full_case(&schema);
        assert_eq!(case.adaptation_ratio(&case).unwrap(), 1.0);
        assert_eq!(case.adapt(&case).unwrap(), case);
    }

    #[test]
    fn test_adapt_rescales_price() {
        let schema = CaseSchema::holiday();
        let stored = full_case(&schema);
        let query = build(&schema, &[("NumberOfPersons", "4"), ("Duration", "7"), ("Season", "May")]);

        // persons 2 -> 4 doubles, duration 14 -> 7 halves
        assert_eq!(stored.adaptation_ratio(&query).unwrap(), 1.0);

        let query = build(&schema, &[("NumberOfPersons", "3"), ("Duration", "7")]);
        let ratio = stored.adaptation_ratio(&query).unwrap();
        assert!((ratio - 0.75).abs() < 1e-12);

        let adapted = stored.adapt(&query).unwrap();
        assert_eq!(adapted.get("NumberOfPersons").unwrap().value(), &Value::Number(3.0));
        assert_eq!(adapted.get("Duration").unwrap().value(), &Value::Number(7.0));
        assert_eq!(adapted.get("Price").unwrap().value(), &Value::Number(900.0));
        // Everything else is copied
        assert_eq!(adapted.get("Hotel"), stored.get("Hotel"));
        assert_eq!(adapted.get("Season"), stored.get("Season"));
        // The stored case is untouched
        assert_eq!(stored.get("Price").unwrap().value(), &Value::Number(1200.0));
    }

    #[test]
    fn test_table_miss_is_an_error() {
        use crate::attribute::FieldSpec;
        use crate::metric::{MatchTable, Metric};
        use crate::value::ValueKind;
        use std::sync::Arc;

        // "Boat" has a row of its own but no column in the "Car" row
        let table = MatchTable::new()
            .with_row("Car", &[("Car", 1.0)])
            .with_row("Boat", &[("Boat", 1.0), ("Car", 0.2)]);
        let spec = Arc::new(FieldSpec::new("Transport", ValueKind::Keyword, Metric::Table(Arc::new(table))));
        let places = Gazetteer::new();
        let car = Case::new().with(Attribute::parse(spec.clone(), "car", &places).unwrap());
        let boat = Case::new().with(Attribute::parse(spec, "boat", &places).unwrap());

        assert!((boat.similarity(&car).unwrap() - 0.2).abs() < 1e-12);
        assert!(matches!(car.similarity(&boat), Err(Error::InvalidValue { .. })));

        let schema = CaseSchema::holiday();
        let raw: RawCase = [("Transportation".to_string(), "Boat".to_string())].into_iter().collect();
        assert!(matches!(
            schema.build_case(&raw, &places),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_record_roundtrip() {
        let schema = CaseSchema::holiday();
        let case = full_case(&schema);
        let restored = schema.restore_case(&case.to_record()).unwrap();
        assert_eq!(case, restored);
    }
}
