//! Lenient accessors over a spec's free-form trait map.
//!
//! Traits are caller-supplied JSON. These helpers never fail: a missing key
//! or a value of the wrong type falls back to the default.

use serde_json::{Map, Value};

/// Extracts a non-empty string from `traits[name]`.
pub fn param_nonempty(traits: &Map<String, Value>, name: &str) -> Option<String> {
    traits
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Strings, numbers and booleans. Objects, arrays and nulls are not scalars.
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Every scalar trait except those named in `skip`, in key order.
pub fn scalar_params<'a>(
    traits: &'a Map<String, Value>,
    skip: &'a [&'a str],
) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
    traits
        .iter()
        .filter(move |(key, value)| is_scalar(value) && !skip.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value))
}
