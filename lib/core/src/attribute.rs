//! Field descriptors and attributes
//!
//! A [`FieldSpec`] describes one named field: how its raw text is parsed, which
//! [`Metric`] compares its values, its weight, and which adaptation
//! capabilities it carries. An [`Attribute`] is an immutable pairing of a spec
//! with a validated value.
//!
//! Capabilities are split into independent traits so callers only depend on
//! what they use:
//! - [`Matchable`] - similarity between two same-named attributes
//! - [`Adaptable`] - ratio by which this attribute would have to change to
//!   become the other one
//! - [`Adjustable`] - a copy rescaled by a combined adaptation ratio

use crate::metric::Metric;
use crate::place::PlaceResolver;
use crate::value::{Value, ValueKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How an adaptable field contributes to the combined adaptation ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adaptation {
    /// `other / self`, so ratios of several fields combine by multiplication
    Ratio,
}

/// How an adjustable field follows the combined adaptation ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    /// `value * ratio`
    Linear,
}

/// Descriptor for one named field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub help: String,
    pub kind: ValueKind,
    pub metric: Metric,
    pub weight: f64,
    /// Whether the field takes part in case similarity
    pub matching: bool,
    pub adaptation: Option<Adaptation>,
    pub adjustment: Option<Adjustment>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind, metric: Metric) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            kind,
            metric,
            weight: 1.0,
            matching: true,
            adaptation: None,
            adjustment: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn excluded_from_matching(mut self) -> Self {
        self.matching = false;
        self
    }

    pub fn with_adaptation(mut self, adaptation: Adaptation) -> Self {
        self.adaptation = Some(adaptation);
        self
    }

    pub fn with_adjustment(mut self, adjustment: Adjustment) -> Self {
        self.adjustment = Some(adjustment);
        self
    }

    pub fn is_adaptable(&self) -> bool {
        self.adaptation.is_some()
    }

    pub fn is_adjustable(&self) -> bool {
        self.adjustment.is_some()
    }

    /// Parse and validate a raw value for this field
    pub fn parse(&self, raw: &str, places: &dyn PlaceResolver) -> Result<Value> {
        let value = self.kind.parse(&self.name, raw, places)?;
        self.metric.admits(&self.name, &value)?;
        Ok(value)
    }

    /// Validate an already-built value for this field
    pub fn check(&self, value: &Value) -> Result<()> {
        self.kind.check(&self.name, value)?;
        self.metric.admits(&self.name, value)
    }
}

/// Similarity between two same-named attributes
pub trait Matchable {
    /// Score in `[0, weight]`. Not necessarily symmetric.
    fn similarity(&self, other: &Self) -> Result<f64>;
}

/// Attributes that can supply an adaptation ratio
pub trait Adaptable {
    fn adapt_distance(&self, other: &Self) -> Result<f64>;
}

/// Attributes whose value follows the combined adaptation ratio
pub trait Adjustable: Sized {
    fn adjusted(&self, factor: f64) -> Result<Self>;
}

/// One named, validated field value
#[derive(Debug, Clone)]
pub struct Attribute {
    spec: Arc<FieldSpec>,
    value: Value,
}

impl Attribute {
    /// Pair a spec with a value, validating the value against the spec
    pub fn new(spec: Arc<FieldSpec>, value: Value) -> Result<Self> {
        spec.check(&value)?;
        Ok(Self { spec, value })
    }

    /// Parse a raw value for `spec`
    pub fn parse(spec: Arc<FieldSpec>, raw: &str, places: &dyn PlaceResolver) -> Result<Self> {
        let value = spec.parse(raw, places)?;
        Ok(Self { spec, value })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn weight(&self) -> f64 {
        self.spec.weight
    }

    pub fn spec(&self) -> &Arc<FieldSpec> {
        &self.spec
    }

    pub fn is_matching(&self) -> bool {
        self.spec.matching
    }

    pub fn is_adaptable(&self) -> bool {
        self.spec.is_adaptable()
    }

    pub fn is_adjustable(&self) -> bool {
        self.spec.is_adjustable()
    }

    /// Same value bound to another spec of the same name
    pub(crate) fn rebound(&self, spec: Arc<FieldSpec>) -> Result<Self> {
        Self::new(spec, self.value.clone())
    }

    fn number(&self) -> Result<f64> {
        self.value
            .as_number()
            .ok_or_else(|| Error::invalid_value(self.name(), "expected a number"))
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.value == other.value && self.weight() == other.weight()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec.kind.format(&self.value))
    }
}

impl Matchable for Attribute {
    fn similarity(&self, other: &Self) -> Result<f64> {
        self.spec.metric.compare(self.name(), self.weight(), &self.value, &other.value)
    }
}

impl Adaptable for Attribute {
    fn adapt_distance(&self, other: &Self) -> Result<f64> {
        match self.spec.adaptation {
            Some(Adaptation::Ratio) => {
                let ours = self.number()?;
                let theirs = other.number()?;
                if ours == 0.0 {
                    return Err(Error::Adaptation(format!("{} is zero, no ratio to adapt by", self.name())));
                }
                Ok(theirs / ours)
            }
            None => Err(Error::Adaptation(format!("{} is not adaptable", self.name()))),
        }
    }
}

impl Adjustable for Attribute {
    fn adjusted(&self, factor: f64) -> Result<Self> {
        match self.spec.adjustment {
            Some(Adjustment::Linear) => {
                let value = Value::Number(self.number()? * factor);
                Ok(Self {
                    spec: self.spec.clone(),
                    value,
                })
            }
            None => Err(Error::Adaptation(format!("{} is not adjustable", self.name()))),
        }
    }
}
