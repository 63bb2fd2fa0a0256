//! Evaluation of a parsed filter against JSON properties.

use super::parser::{Comparison, Expr, Selector};
use super::FilterEvalError;
use serde_json::Value;
use std::cmp::Ordering;

pub(crate) fn evaluate(expr: &Expr, value: &Value) -> Result<bool, FilterEvalError> {
    match expr {
        Expr::And(terms) => {
            for term in terms {
                if !evaluate(term, value)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Or(terms) => {
            for term in terms {
                if evaluate(term, value)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Not(inner) => Ok(!evaluate(inner, value)?),
        Expr::Compare {
            selector,
            op,
            value: literal,
        } => compare(selector, resolve(selector, value)?, *op, literal),
        Expr::IsEmpty(selector) => match resolve(selector, value)? {
            Value::Null => Ok(true),
            Value::String(s) => Ok(s.is_empty()),
            Value::Array(items) => Ok(items.is_empty()),
            Value::Object(map) => Ok(map.is_empty()),
            other => Err(mismatch(selector, other, "`is empty`")),
        },
        Expr::Contains {
            selector,
            value: needle,
        } => match resolve(selector, value)? {
            Value::String(s) => Ok(s.contains(needle.as_str())),
            Value::Object(map) => Ok(map.contains_key(needle)),
            Value::Array(items) => Ok(items.iter().any(|item| equals(item, needle))),
            other => Err(mismatch(selector, other, "`contains`")),
        },
        Expr::Matches { selector, pattern } => match resolve(selector, value)? {
            Value::String(s) => Ok(pattern.is_match(s)),
            other => Err(mismatch(selector, other, "`matches`")),
        },
    }
}

/// Walks the selector; numeric segments index into arrays.
fn resolve<'a>(selector: &Selector, value: &'a Value) -> Result<&'a Value, FilterEvalError> {
    let mut current = value;
    for segment in selector.segments() {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| FilterEvalError::MissingProperty(selector.to_string()))?;
    }
    Ok(current)
}

fn compare(
    selector: &Selector,
    actual: &Value,
    op: Comparison,
    literal: &str,
) -> Result<bool, FilterEvalError> {
    let ordering = match actual {
        Value::Number(number) => {
            let expected: f64 = literal.parse().map_err(|_| FilterEvalError::Literal {
                selector: selector.to_string(),
                literal: literal.to_string(),
            })?;
            number
                .as_f64()
                .and_then(|n| n.partial_cmp(&expected))
                .ok_or_else(|| mismatch(selector, actual, "ordering"))?
        }
        Value::String(s) => s.as_str().cmp(literal),
        Value::Bool(_) | Value::Null => {
            let equal = equals(actual, literal);
            return match op {
                Comparison::Equal => Ok(equal),
                Comparison::NotEqual => Ok(!equal),
                _ => Err(mismatch(selector, actual, "ordering")),
            };
        }
        Value::Array(_) | Value::Object(_) => return Err(mismatch(selector, actual, "comparison")),
    };

    Ok(match op {
        Comparison::Equal => ordering == Ordering::Equal,
        Comparison::NotEqual => ordering != Ordering::Equal,
        Comparison::Less => ordering == Ordering::Less,
        Comparison::LessOrEqual => ordering != Ordering::Greater,
        Comparison::Greater => ordering == Ordering::Greater,
        Comparison::GreaterOrEqual => ordering != Ordering::Less,
    })
}

/// Equality with the literal coerced to the value's type.
fn equals(actual: &Value, literal: &str) -> bool {
    match actual {
        Value::Number(number) => match (number.as_f64(), literal.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        Value::String(s) => s == literal,
        Value::Bool(b) => literal.parse::<bool>().is_ok_and(|l| l == *b),
        Value::Null => literal == "null",
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn mismatch(selector: &Selector, actual: &Value, operation: &'static str) -> FilterEvalError {
    let kind = match actual {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    FilterEvalError::TypeMismatch {
        selector: selector.to_string(),
        kind,
        operation,
    }
}
