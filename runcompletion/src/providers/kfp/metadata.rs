//! Lineage store contract.

use crate::errors::BackendError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The reserved identifier a store returns for a missing entity.
pub const INVALID_ID: i64 = 0;

/// A custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// An integer.
    Int(i64),
    /// A floating point number.
    Double(f64),
    /// A string.
    String(String),
    /// A structured value.
    Struct(Map<String, Value>),
}

impl MetadataValue {
    /// The value as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Double(d) => Value::from(*d),
            Self::String(s) => Value::from(s.as_str()),
            Self::Struct(map) => Value::Object(map.clone()),
        }
    }
}

/// An artifact type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactType {
    /// The type identifier.
    pub id: i64,
    /// The type name.
    pub name: String,
}

/// A lineage context grouping a run's artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataContext {
    /// The context identifier.
    pub id: i64,
    /// The context name.
    pub name: String,
}

/// An artifact recorded in the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataArtifact {
    /// The artifact identifier.
    pub id: i64,
    /// The artifact's type identifier.
    pub type_id: i64,
    /// Where the artifact lives.
    pub uri: String,
    /// Custom properties.
    pub custom_properties: BTreeMap<String, MetadataValue>,
}

impl MetadataArtifact {
    /// A string custom property, empty when absent or not a string.
    #[must_use]
    pub fn string_property(&self, key: &str) -> &str {
        match self.custom_properties.get(key) {
            Some(MetadataValue::String(s)) => s,
            _ => "",
        }
    }

    /// An integer custom property, zero when absent or not an integer.
    #[must_use]
    pub fn int_property(&self, key: &str) -> i64 {
        match self.custom_properties.get(key) {
            Some(MetadataValue::Int(i)) => *i,
            _ => 0,
        }
    }

    /// Custom properties as a JSON object, for filter evaluation.
    #[must_use]
    pub fn properties_json(&self) -> Map<String, Value> {
        self.custom_properties
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

/// Queries the lineage store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Looks up an artifact type by name.
    async fn get_artifact_type(&self, type_name: &str) -> Result<ArtifactType, BackendError>;

    /// Looks up a context by type and name.
    async fn get_context_by_type_and_name(
        &self,
        type_name: &str,
        context_name: &str,
    ) -> Result<MetadataContext, BackendError>;

    /// Lists the artifacts attributed to a context.
    async fn get_artifacts_by_context(
        &self,
        context_id: i64,
    ) -> Result<Vec<MetadataArtifact>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_properties_json() {
        let artifact = MetadataArtifact {
            custom_properties: BTreeMap::from([
                ("name".to_string(), MetadataValue::String("m1".into())),
                ("pushed".to_string(), MetadataValue::Int(1)),
                ("score".to_string(), MetadataValue::Double(0.5)),
                (
                    "x".to_string(),
                    MetadataValue::Struct(json!({"y": 1}).as_object().cloned().unwrap()),
                ),
            ]),
            ..MetadataArtifact::default()
        };

        assert_eq!(
            Value::Object(artifact.properties_json()),
            json!({"name": "m1", "pushed": 1, "score": 0.5, "x": {"y": 1}})
        );
        assert_eq!(artifact.string_property("name"), "m1");
        assert_eq!(artifact.string_property("pushed"), "");
        assert_eq!(artifact.int_property("pushed"), 1);
        assert_eq!(artifact.int_property("missing"), 0);
    }
}
