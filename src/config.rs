use serde::{Deserialize, Serialize};
use crate::{Error, Result};


/// Processing options.
///
/// Every field has a default, so partial documents deserialize:
///
/// ```
/// use tinytemplate::Options;
///
/// let options = Options::from_yaml("missing-variable-throws: false").unwrap();
/// assert!(!options.missing_variable_throws);
/// assert!(options.nulls_are_empty);
/// assert_eq!(options.argument_separator, ',');
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Options {
    /// Render null and missing values as `""` rather than `null`.
    pub nulls_are_empty: bool,
    /// Fail when `${name}` refers to a variable no scope defines.
    pub missing_variable_throws: bool,
    /// Fail when `<t:if>` names nothing the model knows, instead of
    /// treating it as false. The `?`, `-`, `+` and `=` operators always
    /// treat a missing name as false.
    pub missing_condition_throws: bool,
    /// Fail when `<t:include>`, `<t:list>` or `<t:object>` name something
    /// the model does not define. Otherwise a missing include expands to
    /// nothing and a missing list or object passes its tags through.
    pub missing_include_throws: bool,
    /// Separates the arguments of a `${%key arg0,arg1}` marker.
    pub argument_separator: char,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            nulls_are_empty: true,
            missing_variable_throws: true,
            missing_condition_throws: false,
            missing_include_throws: true,
            argument_separator: ',',
        }
    }
}

impl Options {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(
            |err| Error::InvalidOptions(err.to_string())
        )
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(
            |err| Error::InvalidOptions(err.to_string())
        )
    }

    /// Lenient everywhere: nothing missing is ever an error.
    pub fn lenient() -> Self {
        Options {
            missing_variable_throws: false,
            missing_condition_throws: false,
            missing_include_throws: false,
            ..Options::default()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_names_are_kebab_case() {
        let options = Options::from_json(r#"{
            "nulls-are-empty": false,
            "missing-condition-throws": true,
            "argument-separator": ";"
        }"#).unwrap();
        assert!(!options.nulls_are_empty);
        assert!(options.missing_condition_throws);
        assert!(options.missing_variable_throws);
        assert_eq!(options.argument_separator, ';');
    }

    #[test]
    fn unknown_separator_type_is_rejected() {
        let result = Options::from_json(r#"{ "argument-separator": ";;" }"#);
        assert!(matches!(result, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(Options::from_json("{}").unwrap(), Options::default());
    }
}
