//! Boolean filter expressions over artifact properties.
//!
//! Filters appear inside artifact paths (`trainer:model:0[pushed == 1]`) and
//! are evaluated against an artifact's custom properties rendered as JSON.
//!
//! Supported forms:
//! - `selector == value`, `!=`, `<`, `<=`, `>`, `>=`
//! - `selector is empty`, `selector is not empty`
//! - `selector contains value`, `selector not contains value`
//! - `selector matches "regex"`, `selector not matches "regex"`
//! - `value in selector`, `value not in selector`
//! - `and`, `or`, `not` and parentheses
//!
//! A selector is a dotted path; numeric segments index arrays. Nesting of
//! `not` and parentheses is capped at [`MAX_DEPTH`].

mod eval;
mod lexer;
mod parser;

pub use parser::{Comparison, Expr, Selector, MAX_DEPTH};

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when a filter expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct FilterParseError {
    /// What went wrong.
    pub message: String,
    /// Byte offset into the expression.
    pub offset: usize,
}

impl FilterParseError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Error raised while evaluating a filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterEvalError {
    /// The selector does not resolve.
    #[error("property {0} not found")]
    MissingProperty(String),

    /// The property's type does not support the operation.
    #[error("{operation} is not supported on {kind} property {selector}")]
    TypeMismatch {
        /// The selector.
        selector: String,
        /// The property's JSON type.
        kind: &'static str,
        /// The operation attempted.
        operation: &'static str,
    },

    /// The literal cannot be coerced to the property's type.
    #[error("cannot compare {selector} with {literal}")]
    Literal {
        /// The selector.
        selector: String,
        /// The literal.
        literal: String,
    },
}

/// A parsed filter expression.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    expr: Expr,
}

impl Filter {
    /// Parses a filter expression.
    pub fn parse(source: &str) -> Result<Self, FilterParseError> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    /// The expression text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates the filter against a JSON value.
    pub fn evaluate(&self, value: &Value) -> Result<bool, FilterEvalError> {
        eval::evaluate(&self.expr, value)
    }

    /// Returns true when `properties` satisfy the filter.
    ///
    /// Evaluation errors, such as a missing property, count as a non-match.
    #[must_use]
    pub fn matches(&self, properties: &Map<String, Value>) -> bool {
        let value = Value::Object(properties.clone());
        match self.evaluate(&value) {
            Ok(matched) => matched,
            Err(error) => {
                tracing::trace!(filter = %self.source, %error, "filter evaluation failed");
                false
            }
        }
    }
}

impl FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
