//! Lenient accessors over untyped JSON responses.
//!
//! The upstream APIs mix numbers and numeric strings for the same fields,
//! so numeric reads accept both.

use crate::error::{FetchError, FetchResult};
use serde_json::Value;
use usd1_core::{fraction_to_percent, normalize_rate};

/// Read a number or numeric string. `"NaN"`, `"inf"` and overflowing
/// literals such as `"1e400"` read as absent.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    finite(n)
}

/// Keep `value` only while it is finite; unit conversions can overflow.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Fractional rate (0.0525) to percent, `None` when the result overflows.
pub fn percent(fraction: f64) -> Option<f64> {
    finite(fraction_to_percent(fraction))
}

/// Rate of undeclared unit to percent, `None` when the result overflows.
pub fn normalized_percent(value: f64) -> Option<f64> {
    finite(normalize_rate(value))
}

/// Read a numeric field from an object.
pub fn field_f64(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key).and_then(number)
}

/// Read a string field from an object.
pub fn field_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Follow `path` through nested objects, failing with `MissingField`.
pub fn require<'a>(value: &'a Value, path: &[&str]) -> FetchResult<&'a Value> {
    let mut current = value;
    for (depth, key) in path.iter().enumerate() {
        current = current
            .get(*key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| FetchError::missing(&path[..=depth]))?;
    }
    Ok(current)
}

/// Follow `path` and expect an array at the end.
pub fn require_array<'a>(value: &'a Value, path: &[&str]) -> FetchResult<&'a Vec<Value>> {
    require(value, path)?
        .as_array()
        .ok_or_else(|| FetchError::InvalidValue {
            field: path.join("."),
            reason: "expected an array".to_string(),
        })
}

/// Find the first object whose `key` matches `symbol` case-insensitively.
pub fn find_by_symbol<'a>(items: &'a [Value], key: &str, symbol: &str) -> Option<&'a Value> {
    items.iter().find(|item| {
        field_str(item, key).is_some_and(|s| s.trim().eq_ignore_ascii_case(symbol))
    })
}

/// Validate a monetary amount: finite and non-negative.
pub fn amount(field: &str, value: Option<f64>) -> FetchResult<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(FetchError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a non-negative amount, got {v}"),
        }),
        other => Ok(other),
    }
}
