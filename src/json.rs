use crate::{Value, VariableStore};
pub use serde_json::Value as JsonValue;


impl VariableStore for JsonValue {
    fn get(&self, name: &str) -> Option<Value> {
        lookup(self, name).map(Value::from)
    }
}

// a key containing dots is tried as is before walking it as a path
fn lookup<'a>(json: &'a JsonValue, name: &str) -> Option<&'a JsonValue> {
    match json.get(name) {
        Some(value) => Some(value),
        None => name.split('.').try_fold(
            json,
            |node, key| match key.parse::<usize>() {
                Ok(index) if node.is_array() => node.get(index),
                _ => node.get(key)
            }
        )
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Text(n.to_string()), Value::Float)
            },
            JsonValue::String(s) => Value::Text(s.clone()),
            _ => Value::Text(json.to_string())
        }
    }
}
