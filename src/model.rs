use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::rc::Rc;
use crate::bundle::{Bundle, Locale};
use crate::logger::format_message;
use crate::reader::Content;
use crate::{Result, Value, VariableStore};


type ConditionFn = Rc<dyn Fn() -> bool>;
type ListFn = Rc<dyn Fn(&str) -> Vec<TemplateModel>>;
type ObjectFn = Rc<dyn Fn(&str) -> TemplateModel>;
type IncludeFn = Rc<dyn Fn() -> TemplateModel>;
type BundleFn = Rc<dyn Fn(&Locale) -> Rc<dyn Bundle>>;

#[derive(Clone)]
enum Local {
    Value(Rc<dyn Fn() -> Value>),
    I18n { key: String, args: Vec<String> },
}


/// The data a template is expanded against, together with the template text.
///
/// Everything is registered by name and computed lazily: providers are called
/// each time the interpreter looks the name up.
///
/// ```
/// use tinytemplate::{TemplateModel, TemplateProcessor};
///
/// let model = TemplateModel::of_content("<t:list days>${_number}:${day} </t:list>")
///     .list("days", |content| {
///         ["Mon", "Tue"].iter()
///             .map(|day| TemplateModel::of_content(content).variable("day", *day))
///             .collect()
///     });
///
/// let result = TemplateProcessor::builder().build().process(&model).unwrap();
/// assert_eq!(result, "1:Mon 2:Tue ");
/// ```
#[derive(Clone)]
pub struct TemplateModel {
    content: Content,
    conditions: HashMap<String, ConditionFn>,
    variables: HashMap<String, Local>,
    stores: Vec<Rc<dyn VariableStore>>,
    lists: HashMap<String, ListFn>,
    objects: HashMap<String, ObjectFn>,
    includes: HashMap<String, IncludeFn>,
    bundles: Vec<BundleFn>,
    locale: Option<Locale>,
    instruction: Option<Rc<dyn Fn(&str)>>,
}

impl TemplateModel {
    fn new(content: Content) -> Self {
        TemplateModel {
            content,
            conditions: HashMap::new(),
            variables: HashMap::new(),
            stores: Vec::new(),
            lists: HashMap::new(),
            objects: HashMap::new(),
            includes: HashMap::new(),
            bundles: Vec::new(),
            locale: None,
            instruction: None,
        }
    }

    pub fn of_content(text: &str) -> Self {
        TemplateModel::new(Content::from_text(text))
    }

    /// A model reading its text from `reader` the first time it is processed.
    pub fn of_reader<R: Read + 'static>(reader: R) -> Self {
        TemplateModel::new(Content::from_reader(reader))
    }

    pub fn of_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(TemplateModel::of_reader(BufReader::new(file)))
    }

    /// A copy of this model with different text.
    ///
    /// All definitions are shared with the original, which is what list and
    /// object producers usually want for their rows.
    pub fn with_content(&self, text: &str) -> Self {
        TemplateModel {
            content: Content::from_text(text),
            ..self.clone()
        }
    }

    pub fn variable<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.set_variable(name, value.into());
        self
    }

    pub fn variable_with<V, F>(mut self, name: &str, supplier: F) -> Self
    where V: Into<Value>, F: Fn() -> V + 'static {
        self.variables.insert(
            name.to_owned(),
            Local::Value(Rc::new(move || supplier().into()))
        );
        self
    }

    /// Adds a store searched after the variables set directly on the model.
    pub fn variables<S: VariableStore + 'static>(mut self, store: S) -> Self {
        self.stores.push(Rc::new(store));
        self
    }

    /// A variable holding the localized text for `key`, formatted with `args`.
    pub fn i18n(mut self, name: &str, key: &str, args: &[&str]) -> Self {
        self.variables.insert(
            name.to_owned(),
            Local::I18n {
                key: key.to_owned(),
                args: args.iter().map(|it| it.to_string()).collect()
            }
        );
        self
    }

    pub fn condition(mut self, name: &str, value: bool) -> Self {
        self.set_condition(name, value);
        self
    }

    pub fn condition_with<F>(mut self, name: &str, condition: F) -> Self
    where F: Fn() -> bool + 'static {
        self.conditions.insert(name.to_owned(), Rc::new(condition));
        self
    }

    /// Registers a list producer, called with the raw text of the
    /// `<t:list>` block and returning one model per row.
    pub fn list<F>(mut self, name: &str, rows: F) -> Self
    where F: Fn(&str) -> Vec<TemplateModel> + 'static {
        self.lists.insert(name.to_owned(), Rc::new(rows));
        self
    }

    pub fn list_of(self, name: &str, rows: Vec<TemplateModel>) -> Self {
        self.list(name, move |_| rows.clone())
    }

    pub fn object<F>(mut self, name: &str, object: F) -> Self
    where F: Fn(&str) -> TemplateModel + 'static {
        self.objects.insert(name.to_owned(), Rc::new(object));
        self
    }

    pub fn object_of(self, name: &str, model: TemplateModel) -> Self {
        self.object(name, move |_| model.clone())
    }

    pub fn include(self, name: &str, model: TemplateModel) -> Self {
        self.include_with(name, move || model.clone())
    }

    pub fn include_with<F>(mut self, name: &str, model: F) -> Self
    where F: Fn() -> TemplateModel + 'static {
        self.includes.insert(name.to_owned(), Rc::new(model));
        self
    }

    pub fn bundle<B: Bundle + 'static>(self, bundle: B) -> Self {
        let bundle: Rc<dyn Bundle> = Rc::new(bundle);
        self.bundle_with(move |_| Rc::clone(&bundle))
    }

    /// Adds a bundle chosen by locale when the template is processed.
    pub fn bundle_with<F>(mut self, bundle: F) -> Self
    where F: Fn(&Locale) -> Rc<dyn Bundle> + 'static {
        self.bundles.push(Rc::new(bundle));
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Receives the names of `<t:instruct>` directives other than
    /// `reset` and `end`.
    pub fn instruction<F>(mut self, instruction: F) -> Self
    where F: Fn(&str) + 'static {
        self.instruction = Some(Rc::new(instruction));
        self
    }

    pub(crate) fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(
            name.to_owned(),
            Local::Value(Rc::new(move || value.clone()))
        );
    }

    pub(crate) fn set_condition(&mut self, name: &str, value: bool) {
        self.conditions.insert(name.to_owned(), Rc::new(move || value));
    }

    pub(crate) fn inject_row(&mut self, index: usize, size: usize) {
        self.set_variable("_size", Value::from(size));
        self.set_variable("_index", Value::from(index));
        self.set_variable("_number", Value::from(index + 1));
        self.set_condition("_first", index == 0);
        self.set_condition("_last", index + 1 == size);
        self.set_condition("_odd", index % 2 == 1);
        self.set_condition("_even", index % 2 == 0);
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
            || self.stores.iter().any(|store| store.contains(name))
    }

    /// Looks a variable up the way the template would.
    pub fn get(&self, name: &str) -> Option<Value> {
        Scope::root(self).variable(name)
    }

    pub fn condition_value(&self, name: &str) -> Option<bool> {
        self.conditions.get(name).map(|condition| condition())
    }

    pub fn current_locale(&self) -> Locale {
        self.locale.clone().unwrap_or_else(Locale::current)
    }

    pub(crate) fn content(&self) -> &Content {
        &self.content
    }

    pub(crate) fn list_rows(&self, name: &str) -> Option<ListFn> {
        self.lists.get(name).cloned()
    }

    pub(crate) fn object_model(&self, name: &str) -> Option<ObjectFn> {
        self.objects.get(name).cloned()
    }

    pub(crate) fn include_model(&self, name: &str) -> Option<TemplateModel> {
        self.includes.get(name).map(|include| include())
    }

    pub(crate) fn on_instruction(&self, name: &str) -> bool {
        match &self.instruction {
            Some(instruction) => {
                instruction(name);
                true
            },
            None => false
        }
    }
}

impl fmt::Debug for TemplateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateModel")
            .field("content", &self.content)
            .field("conditions", &sorted_keys(&self.conditions))
            .field("variables", &sorted_keys(&self.variables))
            .field("stores", &self.stores.len())
            .field("lists", &sorted_keys(&self.lists))
            .field("objects", &sorted_keys(&self.objects))
            .field("includes", &sorted_keys(&self.includes))
            .field("bundles", &self.bundles.len())
            .field("locale", &self.locale)
            .finish()
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys = map.keys().map(String::as_str).collect::<Vec<_>>();
    keys.sort_unstable();
    keys
}


/// A model being processed, linked to the model of the enclosing list row or
/// object while that block is interpreted.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) model: &'a TemplateModel,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn root(model: &'a TemplateModel) -> Self {
        Scope { model, parent: None }
    }

    pub(crate) fn child(model: &'a TemplateModel, parent: &'a Scope<'a>) -> Self {
        Scope { model, parent: Some(parent) }
    }

    /// Resolves `name` to a boolean: conditions first, then includes, lists
    /// and objects (the latter two only when block content is given), then
    /// variables, then the enclosing scope. `None` when nothing matches.
    pub(crate) fn condition_or_variable(&self, name: &str, content: Option<&str>) -> Option<bool> {
        let model = self.model;
        if let Some(condition) = model.conditions.get(name) {
            return Some(condition());
        }
        if model.includes.contains_key(name) {
            return Some(true);
        }
        if let (Some(content), Some(list)) = (content, model.lists.get(name)) {
            return Some(!list(content).is_empty());
        }
        if content.is_some() && model.objects.contains_key(name) {
            return Some(true);
        }
        if let Some(value) = self.local_variable(name) {
            return Some(value.truthiness());
        }
        self.parent.and_then(|parent| parent.condition_or_variable(name, content))
    }

    pub(crate) fn variable(&self, name: &str) -> Option<Value> {
        self.local_variable(name)
            .or_else(|| self.parent.and_then(|parent| parent.variable(name)))
    }

    fn local_variable(&self, name: &str) -> Option<Value> {
        match self.model.variables.get(name) {
            Some(Local::Value(supplier)) => Some(supplier()),
            Some(Local::I18n { key, args }) => Some(self.localize(key, args).into()),
            None => self.model.stores.iter()
                .find(|store| store.contains(name))
                .map(|store| store.get(name).unwrap_or(Value::Null))
        }
    }

    /// The bundle chain of this scope: the model's own bundles followed by
    /// those of the enclosing scopes, all resolved for the model's locale.
    pub(crate) fn bundles(&self) -> Vec<Rc<dyn Bundle>> {
        let locale = self.model.current_locale();
        let mut bundles = Vec::new();
        let mut scope = Some(self);
        while let Some(current) = scope {
            bundles.extend(current.model.bundles.iter().map(|bundle| bundle(&locale)));
            scope = current.parent;
        }
        bundles
    }

    pub(crate) fn localize(&self, key: &str, args: &[String]) -> Option<String> {
        self.bundles().iter()
            .find_map(|bundle| bundle.get(key))
            .map(|text| if args.is_empty() { text } else { format_message(&text, args) })
    }
}
