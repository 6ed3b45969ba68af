//! Annotation values and annotation maps.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// Value attached to an annotation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationValue {
    /// Free text.
    Text(String),
    /// Whole number, e.g. an automatically generated index.
    Integer(i64),
    /// Real number.
    Float(f64),
}

impl AnnotationValue {
    /// Returns the text if this is a textual value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a number, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnnotationValue::Text(_) => None,
            AnnotationValue::Integer(i) => Some(*i as f64),
            AnnotationValue::Float(x) => Some(*x),
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Text(s) => f.write_str(s),
            AnnotationValue::Integer(i) => write!(f, "{}", i),
            AnnotationValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(s: &str) -> Self {
        AnnotationValue::Text(s.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(s: String) -> Self {
        AnnotationValue::Text(s)
    }
}

impl From<i64> for AnnotationValue {
    fn from(i: i64) -> Self {
        AnnotationValue::Integer(i)
    }
}

impl From<f64> for AnnotationValue {
    fn from(x: f64) -> Self {
        AnnotationValue::Float(x)
    }
}

/// Key/value annotations of a segment or segmentation.
///
/// Keys are unique and iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations(BTreeMap<String, AnnotationValue>);

impl Annotations {
    /// Creates an empty annotation map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds annotations from key/value pairs.
    ///
    /// Fails with [`Error::DuplicateAnnotationKey`] if a key appears twice.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AnnotationValue>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            match map.entry(key.into()) {
                btree_map::Entry::Occupied(entry) => {
                    return Err(Error::DuplicateAnnotationKey(entry.key().clone()))
                }
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(value.into());
                }
            }
        }
        Ok(Self(map))
    }

    /// Returns a copy with `key` set to `value`, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a copy of `self` updated with `overrides`.
    ///
    /// Keys present in `overrides` replace those of `self`; other keys are kept.
    pub fn merged(&self, overrides: &Annotations) -> Annotations {
        let mut map = self.0.clone();
        for (key, value) in &overrides.0 {
            map.insert(key.clone(), value.clone());
        }
        Annotations(map)
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.0.get(key)
    }

    /// Checks whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, AnnotationValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = (&'a String, &'a AnnotationValue);
    type IntoIter = btree_map::Iter<'a, String, AnnotationValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
