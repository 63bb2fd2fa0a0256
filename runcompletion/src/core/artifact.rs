//! Artifact model: definitions that select artifacts, and the artifacts a
//! run reports.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// The textual grammar of an artifact path:
/// `component:output[:index][[filter]]`.
pub const ARTIFACT_PATH_PATTERN: &str = r"^([^\[\]:]+):([^\[\]:]+)(?::(\d*))?(?:\[([^\[\]:]+)\])?$";

#[allow(clippy::expect_used)]
static ARTIFACT_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ARTIFACT_PATH_PATTERN).expect("artifact path pattern compiles"));

/// Error raised when an artifact path does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactPathError {
    /// The path did not match [`ARTIFACT_PATH_PATTERN`].
    #[error("ArtifactPath must match pattern {ARTIFACT_PATH_PATTERN}")]
    Pattern,

    /// The index segment was not a valid integer.
    #[error("invalid artifact index: {0}")]
    Index(String),
}

/// Locates an output artifact of a pipeline component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ArtifactLocator {
    /// The component (task) name.
    pub component: String,
    /// The output name on that component.
    pub artifact: String,
    /// The index among the output's artifact instances.
    pub index: usize,
}

impl ArtifactLocator {
    /// Creates a new locator.
    #[must_use]
    pub fn new(component: impl Into<String>, artifact: impl Into<String>, index: usize) -> Self {
        Self {
            component: component.into(),
            artifact: artifact.into(),
            index,
        }
    }
}

/// Renders the matchable name `component:output:index`.
impl fmt::Display for ArtifactLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.component, self.artifact, self.index)
    }
}

/// A locator plus an optional filter expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPath {
    /// Where the artifact lives.
    pub locator: ArtifactLocator,
    /// Filter over the artifact's custom properties.
    pub filter: Option<String>,
}

impl ArtifactPath {
    /// Creates a path without a filter.
    #[must_use]
    pub fn new(locator: ArtifactLocator) -> Self {
        Self {
            locator,
            filter: None,
        }
    }

    /// Sets the filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl FromStr for ArtifactPath {
    type Err = ArtifactPathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let captures = ARTIFACT_PATH_REGEX
            .captures(path)
            .ok_or(ArtifactPathError::Pattern)?;

        let component = captures.get(1).map_or("", |m| m.as_str());
        let artifact = captures.get(2).map_or("", |m| m.as_str());

        let index = match captures.get(3).map(|m| m.as_str()) {
            Some(index) if !index.is_empty() => index
                .parse()
                .map_err(|_| ArtifactPathError::Index(index.to_string()))?,
            _ => 0,
        };

        let filter = captures
            .get(4)
            .map(|m| m.as_str().to_string())
            .filter(|f| !f.is_empty());

        Ok(Self {
            locator: ArtifactLocator::new(component, artifact, index),
            filter,
        })
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}[{filter}]", self.locator),
            None => write!(f, "{}", self.locator),
        }
    }
}

impl TryFrom<String> for ArtifactPath {
    type Error = ArtifactPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactPath> for String {
    fn from(path: ArtifactPath) -> Self {
        path.to_string()
    }
}

/// A named request for an output artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactDefinition {
    /// The name the resolved artifact is reported under.
    pub name: String,
    /// Where to find it.
    pub path: ArtifactPath,
}

impl ArtifactDefinition {
    /// Creates a new definition.
    #[must_use]
    pub fn new(name: impl Into<String>, path: ArtifactPath) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }

    /// The name candidates must end with to match this definition.
    #[must_use]
    pub fn matchable_name(&self) -> String {
        self.path.locator.to_string()
    }

    /// The filter expression, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.path.filter.as_deref()
    }
}

/// A resolved artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    /// The artifact name.
    pub name: String,
    /// The artifact URI.
    pub location: String,
}

impl Artifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// An artifact is real only when both name and location are set.
    #[must_use]
    pub fn is_real(&self) -> bool {
        !self.name.is_empty() && !self.location.is_empty()
    }
}

/// One concrete artifact produced by a component output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentArtifactInstance {
    /// The artifact URI.
    pub uri: String,
    /// Backend custom properties.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A named component output and its instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentArtifact {
    /// The output name.
    pub name: String,
    /// The instances produced for the output.
    pub artifacts: Vec<ComponentArtifactInstance>,
}

/// A pipeline component (task) and its outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineComponent {
    /// The component name.
    pub name: String,
    /// The component's outputs.
    pub component_artifacts: Vec<ComponentArtifact>,
}
