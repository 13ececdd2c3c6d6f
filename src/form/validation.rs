use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::engine::path::coerce_to_string;
use crate::schema::field_model::Field;

/// Check every value-collecting field; returns `name -> message`.
pub fn validate(fields: &[Field], values: &Map<String, Value>) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter(|f| f.field_type.collects_value())
        .filter_map(|f| {
            validate_field(f, values.get(&f.name)).map(|message| (f.name.clone(), message))
        })
        .collect()
}

/// First failing rule for one field, if any.
pub fn validate_field(field: &Field, value: Option<&Value>) -> Option<String> {
    let rules = &field.validation;

    if is_blank(value) {
        if rules.required {
            return Some(format!("{} is required", field.display_name()));
        }
        return None;
    }

    let text = value.map(coerce_to_string).unwrap_or_default();
    let length = text.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            return Some(format!("Min {} chars", min));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Some(format!("Max {} chars", max));
        }
    }

    if let Some(pattern) = rules.pattern.as_deref().filter(|p| !p.is_empty()) {
        // Matches the whole value, like the HTML `pattern` attribute.
        let anchored = format!("^(?:{})$", pattern);
        if let Ok(re) = Regex::new(&anchored) {
            if !re.is_match(&text) {
                return Some(
                    rules
                        .pattern_message
                        .clone()
                        .unwrap_or_else(|| "Invalid format".to_string()),
                );
            }
        }
    }

    if rules.min.is_some() || rules.max.is_some() {
        if let Some(number) = as_number(value) {
            if let Some(min) = rules.min {
                if number < min {
                    return Some(format!("Must be at least {}", min));
                }
            }
            if let Some(max) = rules.max {
                if number > max {
                    return Some(format!("Must be at most {}", max));
                }
            }
        }
    }

    None
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
