//! Scalar value and row representations used for comparison.
//!
//! `ScalarValue` is the type-tagged intermediate form every column value is
//! decoded into before comparison. Equality is deliberately type-strict:
//! `Int(3)` does not equal `Float(3.0)`; a replica that changed a column's
//! representation is a real finding, not noise to coerce away.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single decoded column value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// SQL NULL
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer (covers SMALLINT/INT/BIGINT)
    Int(i64),

    /// 64-bit floating point (covers REAL/DOUBLE PRECISION)
    Float(f64),

    /// Arbitrary-precision NUMERIC
    Numeric(Decimal),

    /// Text value (also carries base64-rendered BYTEA and TIME)
    Text(String),

    /// Timestamp normalized to UTC (TIMESTAMP, TIMESTAMPTZ, DATE at midnight)
    Timestamp(DateTime<Utc>),

    /// UUID value
    Uuid(Uuid),

    /// JSON / JSONB document
    Json(serde_json::Value),
}

impl ScalarValue {
    /// Check if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Fixed rank used to totally order values of different variants.
    /// `Null` ranks lowest so nulls sort before any value.
    fn variant_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Numeric(_) => 4,
            Self::Text(_) => 5,
            Self::Timestamp(_) => 6,
            Self::Uuid(_) => 7,
            Self::Json(_) => 8,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // total_cmp keeps equality consistent with the sort order
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (Self::Numeric(a), Self::Numeric(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            // No cross-variant coercion
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Numeric(a), Self::Numeric(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.cmp(b),
            // serde_json::Value has no Ord; serialized form is stable within
            // one run, which is all the sort needs
            (Self::Json(a), Self::Json(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Numeric(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
        }
    }
}

/// One materialized row: column name / value pairs in the order the server
/// returned them (schema-declared order). That positional order is the
/// deterministic sort key for full-data comparison; equality ignores it.
#[derive(Debug, Clone)]
pub struct RowRecord {
    columns: Vec<(String, ScalarValue)>,
}

impl RowRecord {
    pub fn new(columns: Vec<(String, ScalarValue)>) -> Self {
        Self { columns }
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column values in schema-declared order.
    pub fn values(&self) -> impl Iterator<Item = &ScalarValue> {
        self.columns.iter().map(|(_, value)| value)
    }

    /// Column names in schema-declared order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn as_map(&self) -> BTreeMap<&str, &ScalarValue> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect()
    }
}

impl PartialEq for RowRecord {
    /// Equal iff the column sets and their values are equal, regardless of
    /// the order the columns arrived in.
    fn eq(&self, other: &Self) -> bool {
        self.as_map() == other.as_map()
    }
}

impl Eq for RowRecord {}

impl Serialize for RowRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
