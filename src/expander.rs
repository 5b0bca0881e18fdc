use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;
use regex::Regex;
use crate::logger::format_message;
use crate::{Bundle, Error, Logger, Options, Result, TracingLogger, Value};


static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(%?)([a-zA-Z_][a-zA-Z._\-0-9]+)(:?)([-=?+]?)(.*)$")
        .expect("Invalid expression regex")
});

type ConditionEvaluator<'a> = Box<dyn Fn(&str) -> bool + 'a>;
type VariableSupplier<'a> = Box<dyn Fn(&str) -> Option<Value> + 'a>;


/// Expands the body of a single `${...}` marker.
///
/// | form         | name false | name true        |
/// |--------------|------------|------------------|
/// | `name`       | the value  | the value        |
/// | `name:?A:B`  | `B`        | `A`              |
/// | `name:-A`    | `A`        | the value        |
/// | `name:+A`    | nothing    | `A`              |
/// | `name:=A`    | `A`        | nothing          |
/// | `%key a,b`   | localized text of `key` with `a` and `b` as arguments ||
///
/// `A` and `B` may themselves contain markers. Whether a name is true is up
/// to the condition evaluator, values come from the variable supplier.
///
/// ```
/// use std::collections::HashMap;
/// use tinytemplate::{Value, VariableExpander};
///
/// let mut vars = HashMap::new();
/// vars.insert("NAME".to_owned(), Value::from("Ann"));
///
/// let expander = VariableExpander::builder().from_map(&vars).build();
/// assert_eq!(expander.expand("NAME").unwrap(), "Ann");
/// assert_eq!(expander.expand("NAME:?known:unknown").unwrap(), "known");
/// assert_eq!(expander.expand("OTHER:-nobody").unwrap(), "nobody");
/// ```
pub struct VariableExpander<'a> {
    condition_evaluator: ConditionEvaluator<'a>,
    variable_supplier: VariableSupplier<'a>,
    bundles: Vec<Rc<dyn Bundle>>,
    nulls_are_empty: bool,
    missing_throws: bool,
    argument_separator: char,
    logger: Option<Rc<dyn Logger>>,
}

impl<'a> VariableExpander<'a> {
    pub fn builder() -> Builder<'a> {
        Builder::new()
    }

    /// Expands every `${...}` marker found in `text`.
    pub fn process(&self, text: &str) -> Result<String> {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let body = &rest[start + 2..];
            match closing_brace(body) {
                Some(end) => {
                    result.push_str(&self.expand(&body[..end])?);
                    rest = &body[end + 1..];
                },
                None => {
                    result.push_str(&rest[start..]);
                    return Ok(result);
                }
            }
        }
        result.push_str(rest);
        Ok(result)
    }

    /// Expands the inside of one marker, `NAME:-default` for `${NAME:-default}`.
    pub fn expand(&self, input: &str) -> Result<String> {
        self.debug("Expanding `{0}`", &[&input]);

        let Some(captures) = EXPRESSION.captures(input) else {
            self.warning("Invalid variable syntax `{0}` in variable expression.", &[&input]);
            return Ok(input.to_owned());
        };
        let intro = captures.get(1).map_or("", |m| m.as_str());
        let name = captures.get(2).map_or("", |m| m.as_str());
        let separator = captures.get(3).map_or("", |m| m.as_str());
        let op = captures.get(4).map_or("", |m| m.as_str());
        let word = captures.get(5).map_or("", |m| m.as_str());

        if intro == "%" {
            return Ok(self.localize(input, name));
        }
        if separator.is_empty() {
            return self.value(name);
        }
        match op {
            "?" => match split_alternatives(word) {
                Some((when_true, when_false)) => {
                    if self.evaluate(name) {
                        self.process(when_true)
                    } else {
                        self.process(when_false)
                    }
                },
                None => {
                    self.warning(
                        "Invalid variable syntax `{0}` in variable expression. Expected true value and false value separated by `:`, not `{1}`",
                        &[&input, &word]
                    );
                    Ok(input.to_owned())
                }
            },
            "-" => {
                if self.evaluate(name) {
                    self.value(name)
                } else {
                    self.process(word)
                }
            },
            "+" => {
                if self.evaluate(name) {
                    self.process(word)
                } else {
                    Ok(String::new())
                }
            },
            "=" => {
                if self.evaluate(name) {
                    Ok(String::new())
                } else {
                    self.process(word)
                }
            },
            _ => {
                self.warning(
                    "Invalid variable syntax `{0}` in variable expression. Unexpected option character `{1}`",
                    &[&input, &op]
                );
                Ok(input.to_owned())
            }
        }
    }

    fn evaluate(&self, name: &str) -> bool {
        (self.condition_evaluator)(name)
    }

    fn value(&self, name: &str) -> Result<String> {
        match (self.variable_supplier)(name) {
            Some(value) => Ok(self.render(value)),
            None if self.missing_throws => Err(Error::MissingVariable(name.to_owned())),
            None => Ok(self.render(Value::Null))
        }
    }

    fn render(&self, value: Value) -> String {
        if value.is_null() && self.nulls_are_empty {
            String::new()
        } else {
            value.to_string()
        }
    }

    // a key no bundle knows expands to the marker text itself
    fn localize(&self, input: &str, key: &str) -> String {
        let args = match input.find(' ') {
            Some(p) => self.split_arguments(&input[p + 1..])
                .iter()
                .map(|arg| self.expand_argument(arg))
                .collect::<Vec<_>>(),
            None => Vec::new()
        };
        for bundle in &self.bundles {
            if let Some(text) = bundle.get(key) {
                return if args.is_empty() {
                    text
                } else {
                    format_message(&text, &args)
                };
            }
        }
        input.to_owned()
    }

    fn expand_argument(&self, arg: &str) -> String {
        if arg.contains("${") {
            return self.process(arg).unwrap_or_else(|_| arg.to_owned());
        }
        match (self.variable_supplier)(arg) {
            Some(value) => self.render(value),
            None => arg.to_owned()
        }
    }

    fn split_arguments(&self, input: &str) -> Vec<String> {
        let mut args = Vec::new();
        let mut arg = String::new();
        let mut escaped = false;
        for c in input.chars() {
            if c == '\\' && !escaped {
                escaped = true;
            } else if c == self.argument_separator && !escaped {
                args.push(std::mem::take(&mut arg));
            } else {
                arg.push(c);
                escaped = false;
            }
        }
        if !arg.is_empty() {
            args.push(arg);
        }
        args
    }

    fn warning(&self, message: &str, args: &[&dyn fmt::Display]) {
        if let Some(logger) = &self.logger {
            logger.warning(message, args);
        }
    }

    fn debug(&self, message: &str, args: &[&dyn fmt::Display]) {
        if let Some(logger) = &self.logger {
            logger.debug(message, args);
        }
    }
}

// position of the `}` closing a marker whose `${` precedes `body`
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 1;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            },
            _ => {}
        }
    }
    None
}

// splits `A:B` on the first colon outside of nested markers
fn split_alternatives(word: &str) -> Option<(&str, &str)> {
    let mut depth = 0;
    for (i, c) in word.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ':' if depth <= 0 => return Some((&word[..i], &word[i + 1..])),
            _ => {}
        }
    }
    None
}


pub struct Builder<'a> {
    condition_evaluator: Option<ConditionEvaluator<'a>>,
    variable_supplier: Option<VariableSupplier<'a>>,
    bundles: Vec<Rc<dyn Bundle>>,
    nulls_are_empty: bool,
    missing_throws: bool,
    argument_separator: char,
    logger: Option<Rc<dyn Logger>>,
}

impl<'a> Builder<'a> {
    fn new() -> Self {
        let options = Options::default();
        Builder {
            condition_evaluator: None,
            variable_supplier: None,
            bundles: Vec::new(),
            nulls_are_empty: options.nulls_are_empty,
            missing_throws: options.missing_variable_throws,
            argument_separator: options.argument_separator,
            logger: Some(Rc::new(TracingLogger)),
        }
    }

    pub fn with_options(mut self, options: &Options) -> Self {
        self.nulls_are_empty = options.nulls_are_empty;
        self.missing_throws = options.missing_variable_throws;
        self.argument_separator = options.argument_separator;
        self
    }

    pub fn with_argument_separator(mut self, separator: char) -> Self {
        self.argument_separator = separator;
        self
    }

    pub fn with_nulls_are_empty(mut self, nulls_are_empty: bool) -> Self {
        self.nulls_are_empty = nulls_are_empty;
        self
    }

    pub fn with_nulls_as_null(self) -> Self {
        self.with_nulls_are_empty(false)
    }

    pub fn with_missing_throws(mut self, missing_throws: bool) -> Self {
        self.missing_throws = missing_throws;
        self
    }

    pub fn with_missing_as_null(self) -> Self {
        self.with_missing_throws(false)
    }

    pub fn with_bundle<B: Bundle + 'static>(mut self, bundle: B) -> Self {
        self.bundles.push(Rc::new(bundle));
        self
    }

    pub fn with_bundles(mut self, bundles: Vec<Rc<dyn Bundle>>) -> Self {
        self.bundles.extend(bundles);
        self
    }

    pub fn with_condition_evaluator<F>(mut self, evaluator: F) -> Self
    where F: Fn(&str) -> bool + 'a {
        self.condition_evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn with_variable_supplier<F>(mut self, supplier: F) -> Self
    where F: Fn(&str) -> Option<Value> + 'a {
        self.variable_supplier = Some(Box::new(supplier));
        self
    }

    /// Values come from `map` and a name is true when its value is.
    pub fn from_map(self, map: &'a HashMap<String, Value>) -> Self {
        self.with_variable_supplier(move |name| map.get(name).cloned())
            .with_condition_evaluator(move |name| map.get(name).is_some_and(Value::truthiness))
    }

    pub fn with_logger<L: Logger + 'static>(self, logger: L) -> Self {
        self.with_shared_logger(Rc::new(logger))
    }

    pub fn with_shared_logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn without_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    pub fn build(self) -> VariableExpander<'a> {
        VariableExpander {
            condition_evaluator: self.condition_evaluator.unwrap_or_else(|| Box::new(|_| false)),
            variable_supplier: self.variable_supplier.unwrap_or_else(|| Box::new(|_| None)),
            bundles: self.bundles,
            nulls_are_empty: self.nulls_are_empty,
            missing_throws: self.missing_throws,
            argument_separator: self.argument_separator,
            logger: self.logger,
        }
    }
}
