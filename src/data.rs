//! Record-oriented data model.
//!
//! Charts consume [`DataPoint`]s: small field-name to [`Value`] maps produced by
//! an external aggregation step. A [`Dataset`] is an ordered list of points and
//! [`ChartData`] is either one flat dataset or several named [`Series`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Field injected into per-point datums of multi-series charts, holding the series name.
pub const SERIES_FIELD: &str = "series";

/// A scalar cell value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A numeric value.
    Number(f32),
    /// A text value.
    Text(String),
    /// A boolean value.
    Bool(bool),
    /// A missing value.
    #[default]
    Null,
}

impl Value {
    /// Get as f32, or None if not a number.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice, or None if not text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // -0.0 and 0.0 compare equal; every NaN is the same key.
    fn number_bits(n: f32) -> u32 {
        if n == 0.0 {
            0
        } else if n.is_nan() {
            f32::NAN.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Self::number_bits(*a) == Self::number_bits(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => Self::number_bits(*n).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e9 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v as f32)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f32)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f32)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f32)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// One record: field name to scalar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPoint {
    fields: HashMap<String, Value>,
}

impl DataPoint {
    /// Create an empty data point.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field (builder style).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field, treating `Null` as absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Get a field or fail with [`Error::Schema`].
    ///
    /// `index` is the point's position in its dataset, reported in the error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the field is missing or null.
    pub fn require(&self, field: &str, index: usize) -> Result<&Value> {
        self.get(field).ok_or_else(|| Error::Schema {
            field: field.to_string(),
            index,
        })
    }

    /// Get a numeric field or fail with [`Error::Schema`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the field is missing or not a number.
    pub fn number(&self, field: &str, index: usize) -> Result<f32> {
        self.require(field, index)?.as_f32().ok_or_else(|| Error::Schema {
            field: field.to_string(),
            index,
        })
    }

    /// Text of a field, if present and textual.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Iterate over all fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the point has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An ordered sequence of data points.
pub type Dataset = Vec<DataPoint>;

/// Collect a numeric column, failing on the first point that lacks it.
///
/// # Errors
///
/// Returns [`Error::Schema`] naming the field and the first offending index.
pub fn column(data: &[DataPoint], field: &str) -> Result<Vec<f32>> {
    data.iter().enumerate().map(|(i, d)| d.number(field, i)).collect()
}

/// Check that every point carries every listed field.
///
/// # Errors
///
/// Returns [`Error::Schema`] for the first missing field.
pub fn require_fields(data: &[DataPoint], fields: &[&str]) -> Result<()> {
    for (i, d) in data.iter().enumerate() {
        for field in fields {
            d.require(field, i)?;
        }
    }
    Ok(())
}

/// A named sub-dataset of a multi-series chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    /// Series name, used for legends and as the [`SERIES_FIELD`] of its points.
    pub name: String,
    /// The series data.
    pub data: Dataset,
}

impl Series {
    /// Create a named series.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Dataset) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Chart input: one flat dataset or several named series.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// A single unnamed dataset.
    Flat(Dataset),
    /// Several series; order defines color and legend order.
    Series(Vec<Series>),
}

impl ChartData {
    /// The general multi-series form. A flat dataset becomes one unnamed series.
    #[must_use]
    pub fn normalize(&self) -> Vec<Series> {
        match self {
            ChartData::Flat(data) => vec![Series::new("", data.clone())],
            ChartData::Series(series) => series.clone(),
        }
    }

    /// All points across all series, in order.
    pub fn points(&self) -> Box<dyn Iterator<Item = &DataPoint> + '_> {
        match self {
            ChartData::Flat(data) => Box::new(data.iter()),
            ChartData::Series(series) => Box::new(series.iter().flat_map(|s| s.data.iter())),
        }
    }

    /// Total number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ChartData::Flat(data) => data.len(),
            ChartData::Series(series) => series.iter().map(|s| s.data.len()).sum(),
        }
    }

    /// True if there are no points at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&DataPoint> {
        self.points().next()
    }
}

impl Default for ChartData {
    fn default() -> Self {
        ChartData::Flat(Vec::new())
    }
}

impl From<Dataset> for ChartData {
    fn from(data: Dataset) -> Self {
        ChartData::Flat(data)
    }
}

impl From<Vec<Series>> for ChartData {
    fn from(series: Vec<Series>) -> Self {
        ChartData::Series(series)
    }
}

/// An element identity: the ordered tuple of its key field values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key(Vec<Value>);

impl Key {
    /// Key from ordered components.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Single-component key.
    #[must_use]
    pub fn single(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    /// The components in order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// First component.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.0.first()
    }

    /// Last component.
    #[must_use]
    pub fn last(&self) -> Option<&Value> {
        self.0.last()
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the key has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.0.as_slice() {
            return write!(f, "{only}");
        }
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

/// Which field(s) identify an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyField {
    /// A single field.
    Single(String),
    /// An ordered list of fields forming a composite key.
    Composite(Vec<String>),
}

impl KeyField {
    /// Single-field key.
    #[must_use]
    pub fn single(field: impl Into<String>) -> Self {
        KeyField::Single(field.into())
    }

    /// Composite key over the given fields, in order.
    #[must_use]
    pub fn composite<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyField::Composite(fields.into_iter().map(Into::into).collect())
    }

    /// Field names in key order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        match self {
            KeyField::Single(f) => vec![f.as_str()],
            KeyField::Composite(fs) => fs.iter().map(String::as_str).collect(),
        }
    }

    /// True for the composite form.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, KeyField::Composite(_))
    }

    /// Extract the key tuple from a datum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if any key field is missing.
    pub fn extract(&self, datum: &DataPoint, index: usize) -> Result<Key> {
        self.fields()
            .into_iter()
            .map(|f| datum.require(f, index).cloned())
            .collect::<Result<Vec<_>>>()
            .map(Key)
    }
}

impl From<&str> for KeyField {
    fn from(field: &str) -> Self {
        KeyField::single(field)
    }
}

impl Default for KeyField {
    fn default() -> Self {
        KeyField::single("k")
    }
}
