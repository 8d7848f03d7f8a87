//! Attribute values and the parsers that produce them from raw text

use crate::place::{Place, PlaceResolver};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Month names in calendar order
pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

const STAR_WORDS: [&str; 6] = ["holiday flat", "one", "two", "three", "four", "five"];

/// A validated attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Number(f64),
    Text(String),
    Place(Place),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Value::Place(p) => Some(p),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Place(_) => "place",
        }
    }
}

/// How raw text becomes a [`Value`] for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Positive whole number
    Integer,
    /// Non-negative number
    Number,
    /// Capitalized single keyword (category names, transport modes)
    Keyword,
    /// Month name
    Month,
    /// Star rating 0-5, "Holiday flat" being 0
    Stars,
    /// Free-text place name, resolved at parse time
    Place,
    /// Verbatim text
    Text,
}

impl ValueKind {
    /// Parse `raw` into a value of this kind.
    ///
    /// Only [`ValueKind::Place`] consults `places`.
    pub fn parse(&self, field: &str, raw: &str, places: &dyn PlaceResolver) -> Result<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::invalid_value(field, "empty value"));
        }

        match self {
            ValueKind::Integer => {
                let n = parse_number(field, raw)?;
                if n <= 0.0 || n.fract() != 0.0 {
                    return Err(Error::invalid_value(field, format!("'{}' is not a positive integer", raw)));
                }
                Ok(Value::Number(n))
            }
            ValueKind::Number => {
                let n = parse_number(field, raw)?;
                if n < 0.0 {
                    return Err(Error::invalid_value(field, format!("'{}' is negative", raw)));
                }
                Ok(Value::Number(n))
            }
            ValueKind::Keyword => Ok(Value::Text(capitalize(raw))),
            ValueKind::Month => {
                let month = capitalize(raw);
                if !MONTHS.contains(&month.as_str()) {
                    return Err(Error::invalid_value(field, format!("unrecognised month '{}'", raw)));
                }
                Ok(Value::Text(month))
            }
            ValueKind::Stars => parse_stars(raw)
                .map(|stars| Value::Number(stars as f64))
                .ok_or_else(|| Error::invalid_value(field, format!("unrecognised rating '{}'", raw))),
            ValueKind::Place => places.resolve(raw).map(Value::Place),
            ValueKind::Text => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Check that an already-built value belongs to this kind
    pub fn check(&self, field: &str, value: &Value) -> Result<()> {
        let ok = match (self, value) {
            (ValueKind::Integer, Value::Number(n)) => *n > 0.0 && n.fract() == 0.0,
            (ValueKind::Number, Value::Number(n)) => n.is_finite() && *n >= 0.0,
            (ValueKind::Stars, Value::Number(n)) => (0.0..=5.0).contains(n) && n.fract() == 0.0,
            (ValueKind::Month, Value::Text(s)) => MONTHS.contains(&s.as_str()),
            (ValueKind::Keyword, Value::Text(s)) | (ValueKind::Text, Value::Text(s)) => !s.is_empty(),
            (ValueKind::Place, Value::Place(_)) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::invalid_value(
                field,
                format!("{} value {:?} does not fit a {:?} field", value.type_name(), value, self),
            ))
        }
    }

    /// Render a value of this kind for display
    pub fn format(&self, value: &Value) -> String {
        match (self, value) {
            (ValueKind::Stars, Value::Number(n)) => match *n as usize {
                0 => "Holiday flat".to_string(),
                stars => format!("{} stars", capitalize(STAR_WORDS[stars.min(5)])),
            },
            (_, value) => value.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 => write!(f, "{:.0}", n),
            Value::Number(n) => write!(f, "{:.2}", n),
            Value::Text(s) => f.write_str(s),
            Value::Place(p) => write!(f, "{}", p),
        }
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::invalid_value(field, format!("'{}' is not a number", raw)))
}

/// First letter uppercase, the rest lowercase
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Parse ratings such as "3", "Two stars", "TwoStars" or "Holiday flat"
fn parse_stars(raw: &str) -> Option<u8> {
    let lower = raw.trim().to_lowercase();
    if lower.starts_with("holiday flat") || lower.starts_with("holidayflat") {
        return Some(0);
    }

    let digits = lower.len() - lower.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        // Whole stars only, so "3.5" or "10" are not truncated
        let (number, rest) = lower.split_at(digits);
        if rest.starts_with(['.', ',']) {
            return None;
        }
        return number.parse::<u8>().ok().filter(|stars| *stars <= 5);
    }

    STAR_WORDS
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, word)| {
            lower.strip_prefix(*word)
                .map(|rest| !rest.starts_with(|c: char| c.is_alphabetic()) || rest.starts_with("star"))
                .unwrap_or(false)
        })
        .map(|(stars, _)| stars as u8)
}
