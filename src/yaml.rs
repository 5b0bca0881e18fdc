use crate::{Value, VariableStore};
pub use serde_yaml::Value as YamlValue;


impl VariableStore for YamlValue {
    fn get(&self, name: &str) -> Option<Value> {
        lookup(self, name).map(Value::from)
    }
}

fn lookup<'a>(yaml: &'a YamlValue, name: &str) -> Option<&'a YamlValue> {
    match yaml.get(name) {
        Some(value) => Some(value),
        None => name.split('.').try_fold(
            yaml,
            |node, key| match key.parse::<usize>() {
                Ok(index) if node.is_sequence() => node.get(index),
                _ => node.get(key)
            }
        )
    }
}

impl From<&YamlValue> for Value {
    fn from(yaml: &YamlValue) -> Self {
        match yaml {
            YamlValue::Null => Value::Null,
            YamlValue::Bool(b) => Value::Bool(*b),
            YamlValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Text(n.to_string()), Value::Float)
            },
            YamlValue::String(s) => Value::Text(s.clone()),
            YamlValue::Tagged(tagged) => Value::from(&tagged.value),
            _ => Value::Text(
                serde_yaml::to_string(yaml)
                    .map(|text| text.trim_end().to_owned())
                    .unwrap_or_default()
            )
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_lookup() {
        let data = serde_yaml::from_str::<YamlValue>(r#"
          name: john
          age: 42
          admin: false
          address:
            city: little
        "#).unwrap();
        assert_eq!(VariableStore::get(&data, "name"), Some(Value::from("john")));
        assert_eq!(VariableStore::get(&data, "age"), Some(Value::Int(42)));
        assert_eq!(VariableStore::get(&data, "admin"), Some(Value::Bool(false)));
        assert_eq!(VariableStore::get(&data, "address.city"), Some(Value::from("little")));
        assert_eq!(VariableStore::get(&data, "citizen"), None);
    }

    #[test]
    fn sequence_index() {
        let data = serde_yaml::from_str::<YamlValue>("team: [ann, bob]").unwrap();
        assert_eq!(VariableStore::get(&data, "team.0"), Some(Value::from("ann")));
    }
}
