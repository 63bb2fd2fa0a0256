//! Namespaced resource names.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when rendering or parsing a [`NamespacedName`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// A namespace was set but the name was not.
    #[error("namespace provided without a name")]
    NamespaceWithoutName,

    /// More than one separator was present.
    #[error("NamespacedName must be separated by at most one `/`")]
    TooManySeparators,

    /// One side of the separator was empty.
    #[error("name and namespace must not be empty when separated by `/`")]
    EmptySegment,
}

/// A resource name with an optional namespace.
///
/// Both fields unset is the "empty" name. A namespace without a name is
/// invalid and cannot be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NamespacedName {
    /// The resource name.
    pub name: String,
    /// The resource namespace.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl NamespacedName {
    /// Creates a namespaced name.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Creates a name without a namespace.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
        }
    }

    /// Returns true if neither name nor namespace is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.namespace.is_empty()
    }

    /// Returns `None` for the empty name, otherwise a clone of `self`.
    ///
    /// Optional identity fields on events are rendered only when present.
    #[must_use]
    pub fn non_empty(&self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self.clone())
        }
    }

    /// Renders `namespace<separator>name`, or just `name` without a namespace.
    pub fn separated(&self, separator: &str) -> Result<String, NameError> {
        if self.namespace.is_empty() {
            return Ok(self.name.clone());
        }
        if self.name.is_empty() {
            return Err(NameError::NamespaceWithoutName);
        }
        Ok(format!("{}{separator}{}", self.namespace, self.name))
    }

    /// Renders the `namespace/name` text form.
    pub fn to_text(&self) -> Result<String, NameError> {
        self.separated("/")
    }
}

impl FromStr for NamespacedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let splits: Vec<&str> = s.split('/').collect();
        match splits.as_slice() {
            [name] => Ok(Self::named(*name)),
            [namespace, name] => {
                if namespace.is_empty() || name.is_empty() {
                    return Err(NameError::EmptySegment);
                }
                Ok(Self::new(*name, *namespace))
            }
            _ => Err(NameError::TooManySeparators),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NamespacedNameRepr {
    Absent,
    Text(String),
    Object {
        #[serde(default)]
        name: String,
        #[serde(default)]
        namespace: String,
    },
}

impl<'de> Deserialize<'de> for NamespacedName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NamespacedNameRepr::deserialize(deserializer)? {
            NamespacedNameRepr::Absent => Ok(Self::default()),
            NamespacedNameRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            NamespacedNameRepr::Object { name, namespace } => {
                if name.is_empty() && !namespace.is_empty() {
                    return Err(serde::de::Error::custom(NameError::NamespaceWithoutName));
                }
                Ok(Self { name, namespace })
            }
        }
    }
}
