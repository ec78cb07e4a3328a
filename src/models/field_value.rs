// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loose truthiness and string conversion for stored field values.
//!
//! Field values arrive as arbitrary JSON from the content platform (checkbox
//! lists, numeric flags, strings). These helpers follow the platform's loose
//! rules so `"0"` and `""` count as unchecked.

use serde_json::Value;

/// Whether a field value counts as set.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Whether a value is empty for the purpose of copying it into the payload.
pub fn is_empty(value: &Value) -> bool {
    !is_truthy(value)
}

/// Render a field value as the string sent to SFMC.
pub fn to_field_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(to_field_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}
