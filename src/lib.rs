//! A small text templating engine.
//!
//! A [TemplateModel] holds template text together with the named conditions,
//! variables, lists, objects, includes and localization bundles it refers to.
//! A [TemplateProcessor] walks the text once, expanding `${...}` markers with
//! a [VariableExpander] and interpreting `<t:...>` directives:
//!
//! | directive                      | effect                                        |
//! |--------------------------------|-----------------------------------------------|
//! | `<t:if name>..<t:else/>..</t:if>` | keeps one branch, `!name` or `not name` negate |
//! | `<t:include name/>`            | expands another model, isolated from this one |
//! | `<t:list name>..</t:list>`     | repeats the block once per row model          |
//! | `<t:object name>..</t:object>` | expands the block against a child model       |
//! | `<t:ignore>..</t:ignore>`      | copies the block without interpreting it      |
//! | `<t:instruct reset/>`          | drops everything produced so far              |
//! | `<t:instruct end/>`            | stops output for the rest of the model        |
//!
//! A backslash before any character takes away its special meaning.
//!
//!
//! # Samples
//!
//! ## Hello world
//!
//! ```
//! use tinytemplate::{TemplateModel, TemplateProcessor};
//!
//! let model = TemplateModel::of_content("<p>${NAME}</p>")
//!     .variable("NAME", "Ann");
//!
//! let result = TemplateProcessor::builder().build().process(&model).unwrap();
//! assert_eq!(result, "<p>Ann</p>");
//! ```
//!
//! ## Conditions
//!
//! ```
//! use tinytemplate::{TemplateModel, TemplateProcessor};
//!
//! let model = TemplateModel::of_content(
//!     "<t:if admin>Welcome back<t:else/>${user:?Hello ${user}:Please log in}</t:if>"
//! )
//!     .condition("admin", false)
//!     .variable("user", "ann");
//!
//! let result = TemplateProcessor::builder().build().process(&model).unwrap();
//! assert_eq!(result, "Hello ann");
//! ```
//!
//! ## Localization
//!
//! ```
//! use tinytemplate::{MapBundle, TemplateModel, TemplateProcessor};
//!
//! let bundle = MapBundle::from_properties("greet={0}, hello\n");
//! let model = TemplateModel::of_content("${%greet Ann}")
//!     .bundle(bundle);
//!
//! let result = TemplateProcessor::builder().build().process(&model).unwrap();
//! assert_eq!(result, "Ann, hello");
//! ```
//!
//! ## Variables from data
//!
//! ```
//! use tinytemplate::{JsonValue, TemplateModel, TemplateProcessor};
//!
//! let data = serde_json::from_str::<JsonValue>(r#"{
//!     "user": { "name": "john", "roles": ["admin"] }
//! }"#).unwrap();
//! let model = TemplateModel::of_content("${user.name} is ${user.roles.0}")
//!     .variables(data);
//!
//! let result = TemplateProcessor::builder().build().process(&model).unwrap();
//! assert_eq!(result, "john is admin");
//! ```
mod error;
mod logger;
mod value;
mod store;
mod json;
mod yaml;
mod bundle;
mod reader;
mod model;
mod expander;
mod processor;
mod config;

pub use self::error::{Error, Result};
pub use self::logger::{Logger, TracingLogger, format_message};
pub use self::value::Value;
pub use self::store::VariableStore;
pub use self::json::JsonValue;
pub use self::yaml::YamlValue;
pub use self::bundle::{Bundle, MapBundle, Locale};
pub use self::model::TemplateModel;
pub use self::expander::VariableExpander;
pub use self::processor::TemplateProcessor;
pub use self::config::Options;
