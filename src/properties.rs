//! Named temporal-logic properties, grouped into safety and liveness.
//!
//! Formulas are opaque: `F` is whatever the chosen [`CtlEngine`] accepts,
//! e.g. a string or a formula AST.
//!
//! [`CtlEngine`]: crate::checker::CtlEngine

use crate::error::{Error, PropertyError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Category of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Safety,
    Liveness,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Safety => "safety",
            PropertyKind::Liveness => "liveness",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named formula.
///
/// Deserializes from either `["name", formula]` or
/// `{"name": "name", "formula": formula}`; serializes to the object form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property<F> {
    pub name: String,
    pub formula: F,
}

impl<F> Property<F> {
    pub fn new(name: impl Into<String>, formula: F) -> Self {
        Self {
            name: name.into(),
            formula,
        }
    }
}

impl<'de, F: Deserialize<'de>> Deserialize<'de> for Property<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<F> {
            Pair(String, F),
            Named { name: String, formula: F },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Pair(name, formula) | Repr::Named { name, formula } => {
                Ok(Property { name, formula })
            }
        }
    }
}

/// Properties to check against a model.
///
/// In JSON both categories are required:
///
/// ```
/// use ctl_connect::PropertySuite;
///
/// let suite = PropertySuite::<String>::from_json(r#"{
///     "safety": [["NoDoubleDequeue", "AG(!dequeue | AX !dequeue)"]],
///     "liveness": [{"name": "CanDrain", "formula": "EF empty"}]
/// }"#).unwrap();
/// assert_eq!(suite.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySuite<F> {
    pub safety: Vec<Property<F>>,
    pub liveness: Vec<Property<F>>,
}

impl<F> Default for PropertySuite<F> {
    fn default() -> Self {
        Self {
            safety: Vec::new(),
            liveness: Vec::new(),
        }
    }
}

impl<F> PropertySuite<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_safety(mut self, name: impl Into<String>, formula: F) -> Self {
        self.safety.push(Property::new(name, formula));
        self
    }

    pub fn with_liveness(mut self, name: impl Into<String>, formula: F) -> Self {
        self.liveness.push(Property::new(name, formula));
        self
    }

    pub fn len(&self) -> usize {
        self.safety.len() + self.liveness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.safety.is_empty() && self.liveness.is_empty()
    }

    /// All properties, safety first, each in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyKind, &Property<F>)> {
        self.safety
            .iter()
            .map(|p| (PropertyKind::Safety, p))
            .chain(self.liveness.iter().map(|p| (PropertyKind::Liveness, p)))
    }

    /// Reject empty names and names used more than once across categories.
    pub fn validate(&self) -> Result<(), PropertyError> {
        let mut seen = HashSet::new();
        for (kind, property) in self.iter() {
            if property.name.trim().is_empty() {
                return Err(PropertyError::EmptyName {
                    category: kind.as_str(),
                });
            }
            if !seen.insert(property.name.as_str()) {
                return Err(PropertyError::DuplicateName(property.name.clone()));
            }
        }
        Ok(())
    }
}

impl<F: DeserializeOwned> PropertySuite<F> {
    /// Parse and validate a suite from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let suite: Self = serde_json::from_str(json)?;
        suite.validate()?;
        Ok(suite)
    }
}
