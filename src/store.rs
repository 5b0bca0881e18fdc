use std::collections::HashMap;
use crate::Value;


/// A named source of variable values.
///
/// A model searches its stores in order and takes the first store that
/// [contains](VariableStore::contains) the name.
pub trait VariableStore {
    fn get(&self, name: &str) -> Option<Value>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl VariableStore for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}
