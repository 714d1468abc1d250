//! Helper functions for template rendering

use crate::template::error::TemplateError;
use serde_json::{Map, Value};

use super::TemplateContext;

/// Resolve a dotted key (`paper.authors.0.name`) in the data
pub(crate) fn resolve_key<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = data;

    for part in key.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Stringify a data value for template output
pub(crate) fn stringify_value(value: &Value, key: &str) -> Result<String, TemplateError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) => Err(TemplateError::ArrayInNonEachContext {
            key: key.to_string(),
        }),
        Value::Object(_) => Err(TemplateError::TableInPlaceholder {
            key: key.to_string(),
        }),
    }
}

/// Truthiness used by `if` blocks; a missing key is false
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Position of the current item inside an `each` loop
pub(crate) struct LoopInfo {
    pub index: usize,
    pub len: usize,
}

/// Create a loop context binding `var_name` to `item` and `loop` to the position
pub(crate) fn create_loop_context(
    base_data: &Value,
    var_name: &str,
    item: Value,
    info: LoopInfo,
) -> TemplateContext {
    let mut table = if let Value::Object(t) = base_data {
        t.clone()
    } else {
        Map::new()
    };

    let mut position = Map::new();
    position.insert("index".to_string(), Value::from(info.index + 1));
    position.insert("first".to_string(), Value::Bool(info.index == 0));
    position.insert("last".to_string(), Value::Bool(info.index + 1 == info.len));

    table.insert(var_name.to_string(), item);
    table.insert("loop".to_string(), Value::Object(position));
    TemplateContext::new(Value::Object(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_and_indexed() {
        let data = json!({"a": {"b": [{"c": "deep"}]}});
        assert_eq!(resolve_key(&data, "a.b.0.c"), Some(&json!("deep")));
        assert_eq!(resolve_key(&data, "a.b.1.c"), None);
        assert_eq!(resolve_key(&data, "a.x"), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(!is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!("x"))));
        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!([1]))));
    }
}
