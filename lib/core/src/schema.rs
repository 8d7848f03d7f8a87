//! Field registry for case construction
//!
//! A [`CaseSchema`] maps field names to their [`FieldSpec`]. Every attribute
//! is created through it, so a case can only ever hold fields the schema
//! knows about. Schemas are immutable; reweighting or rescaling produces a
//! new schema and existing cases are moved over with [`CaseSchema::rebind`].

use crate::attribute::{Attribute, FieldSpec};
use crate::case::{Case, CaseRecord, RawCase};
use crate::holiday;
use crate::metric::Scale;
use crate::place::PlaceResolver;
use crate::ranges::{Range, Ranges};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CaseSchema {
    fields: BTreeMap<String, Arc<FieldSpec>>,
}

impl CaseSchema {
    /// Build a schema, rejecting duplicate names (compared case-insensitively)
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self> {
        let mut schema = Self { fields: BTreeMap::new() };
        for spec in fields {
            if spec.name.is_empty() {
                return Err(Error::InvalidConfig("field with an empty name".to_string()));
            }
            if schema.lookup(&spec.name).is_some() {
                return Err(Error::InvalidConfig(format!("duplicate field '{}'", spec.name)));
            }
            if !(spec.weight >= 0.0 && spec.weight.is_finite()) {
                return Err(Error::InvalidConfig(format!("invalid weight {} for '{}'", spec.weight, spec.name)));
            }
            schema.fields.insert(spec.name.clone(), Arc::new(spec));
        }
        Ok(schema)
    }

    /// The holiday package registry
    pub fn holiday() -> Self {
        Self {
            fields: holiday::fields()
                .into_iter()
                .map(|spec| (spec.name.clone(), Arc::new(spec)))
                .collect(),
        }
    }

    /// Spec by canonical name
    pub fn field(&self, name: &str) -> Option<&Arc<FieldSpec>> {
        self.fields.get(name)
    }

    /// Spec by case-insensitive name
    pub fn resolve_name(&self, name: &str) -> Result<&Arc<FieldSpec>> {
        self.lookup(name.trim())
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    fn lookup(&self, name: &str) -> Option<&Arc<FieldSpec>> {
        self.fields.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(canonical, _)| canonical.eq_ignore_ascii_case(name))
                .map(|(_, spec)| spec)
        })
    }

    /// Specs in name order
    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldSpec>> {
        self.fields.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse one raw field value into an attribute
    pub fn attribute(&self, name: &str, raw: &str, places: &dyn PlaceResolver) -> Result<Attribute> {
        let spec = self.resolve_name(name)?;
        Attribute::parse(spec.clone(), raw, places)
    }

    /// Build a case from raw field values.
    ///
    /// Names that resolve to the same field (`Duration` and `duration`) are
    /// rejected rather than one silently replacing the other.
    pub fn build_case(&self, raw: &RawCase, places: &dyn PlaceResolver) -> Result<Case> {
        assemble(raw.iter().map(|(name, value)| self.attribute(name, value, places)))
    }

    /// Rebuild a case from its serialized record
    pub fn restore_case(&self, record: &CaseRecord) -> Result<Case> {
        assemble(record.iter().map(|(name, value)| {
            let spec = self.resolve_name(name)?;
            Attribute::new(spec.clone(), value.clone())
        }))
    }

    /// Move a case built against another schema onto this one
    pub fn rebind(&self, case: &Case) -> Result<Case> {
        case.attributes()
            .map(|attr| attr.rebound(self.resolve_name(attr.name())?.clone()))
            .collect()
    }

    /// New schema with the given fields reweighted
    pub fn with_weights(&self, weights: &HashMap<String, f64>) -> Result<Self> {
        let mut fields = self.fields.clone();
        for (name, weight) in weights {
            if !(*weight >= 0.0 && weight.is_finite()) {
                return Err(Error::InvalidConfig(format!("invalid weight {} for '{}'", weight, name)));
            }
            let spec = self.resolve_name(name)?;
            fields.insert(spec.name.clone(), Arc::new((**spec).clone().with_weight(*weight)));
        }
        Ok(Self { fields })
    }

    /// New schema with the given ranges applied to range-scaled fields
    pub fn with_ranges(&self, ranges: &Ranges) -> Result<Self> {
        let mut fields = self.fields.clone();
        for (name, range) in ranges.iter() {
            if !(range.lo.is_finite() && range.hi.is_finite() && range.lo <= range.hi) {
                return Err(Error::InvalidConfig(format!(
                    "invalid range [{}, {}] for '{}'",
                    range.lo, range.hi, name
                )));
            }
            let spec = self.resolve_name(name)?;
            let metric = spec.metric.with_range(range.lo, range.hi).ok_or_else(|| {
                Error::InvalidConfig(format!("{} metric of '{}' takes no range", spec.metric.name(), name))
            })?;
            let mut updated = (**spec).clone();
            updated.metric = metric;
            fields.insert(spec.name.clone(), Arc::new(updated));
        }
        Ok(Self { fields })
    }

    /// Ranges currently in effect
    pub fn ranges(&self) -> Ranges {
        let mut ranges = Ranges::new();
        for spec in self.fields.values() {
            if let Some(Scale::Range { lo, hi }) = spec.metric.scale() {
                ranges.insert(&spec.name, Range::new(lo, hi));
            }
        }
        ranges
    }
}

fn assemble(attributes: impl Iterator<Item = Result<Attribute>>) -> Result<Case> {
    let mut case = Case::new();
    for attribute in attributes {
        let attribute = attribute?;
        let name = attribute.name().to_string();
        if case.insert(attribute).is_some() {
            return Err(Error::invalid_value(&name, "given more than once"));
        }
    }
    Ok(case)
}

impl Default for CaseSchema {
    fn default() -> Self {
        Self::holiday()
    }
}
