use serde_json::Value;

/// Navigate `value` by a dot-separated path (`data.items`, `rows.0.id`).
///
/// An empty path returns the value itself. Missing keys, out-of-range
/// indices, or traversal through a scalar yield `None`; this never fails.
pub fn get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// String form of a JSON value as used for labels, values and parent ids.
///
/// Strings pass through, numbers and booleans use their display form,
/// arrays join their coerced items with commas. `null` and objects have no
/// meaningful string form and become empty.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => String::new(),
    }
}

/// `get` followed by `coerce_to_string`; missing paths give an empty string.
pub fn get_string(value: &Value, path: &str) -> String {
    get(value, path).map(coerce_to_string).unwrap_or_default()
}
