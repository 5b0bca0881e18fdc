use std::fmt;


/// A resolved variable value.
///
/// Optional values are flattened on conversion: `Some(v)` becomes `v` and
/// `None` becomes [Value::Null].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Truthiness used by `<t:if>` and the conditional operators.
    ///
    /// Text is false when empty, `"0"` or `"false"` in any case; numbers are
    /// false when zero.
    pub fn truthiness(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(text) => {
                !(text.is_empty() || text == "0" || text.eq_ignore_ascii_case("false"))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i as i64)
                }
            }
        )*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32, usize);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&String> for Value {
    fn from(text: &String) -> Self {
        Value::Text(text.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_truthiness() {
        assert!(Value::from("yes").truthiness());
        assert!(Value::from(" ").truthiness());
        assert!(!Value::from("").truthiness());
        assert!(!Value::from("0").truthiness());
        assert!(!Value::from("FALSE").truthiness());
        assert!(!Value::from("false").truthiness());
    }

    #[test]
    fn number_truthiness() {
        assert!(!Value::from(0).truthiness());
        assert!(!Value::from(0.0).truthiness());
        assert!(Value::from(-3).truthiness());
        assert!(Value::from(0.5).truthiness());
    }

    #[test]
    fn optional_is_flattened() {
        assert_eq!(Value::from(Some(true)), Value::Bool(true));
        assert_eq!(Value::from(None::<bool>), Value::Null);
        assert!(!Value::from(None::<&str>).truthiness());
    }

    #[test]
    fn display() {
        assert_eq!(Value::from(27).to_string(), "27");
        assert_eq!(Value::from(15.323452).to_string(), "15.323452");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
