use std::fmt;
use std::mem;
use std::rc::Rc;
use crate::model::Scope;
use crate::reader::Reader;
use crate::{Error, Logger, Options, Result, TemplateModel, TracingLogger, VariableExpander};


/// Expands a [TemplateModel] in a single pass over its text.
///
/// ```
/// use tinytemplate::{TemplateModel, TemplateProcessor};
///
/// let model = TemplateModel::of_content("<t:if a><p>Y</p><t:else/><p>N</p></t:if>")
///     .condition("a", false);
///
/// let result = TemplateProcessor::builder().build().process(&model).unwrap();
/// assert_eq!(result, "<p>N</p>");
/// ```
pub struct TemplateProcessor {
    options: Options,
    logger: Option<Rc<dyn Logger>>,
}

impl TemplateProcessor {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn process(&self, model: &TemplateModel) -> Result<String> {
        let block = self.run(Scope::root(model), 0)?;
        Ok(block.out)
    }

    // a fresh block over the whole text of the scope's model
    fn run<'s>(&self, scope: Scope<'s>, depth: usize) -> Result<Block<'s>> {
        let mut reader = scope.model.content().reader()?;
        let mut block = Block::new(scope, self.expander(scope), depth);
        self.read(&mut block, &mut reader)?;
        Ok(block)
    }

    fn expander<'s>(&self, scope: Scope<'s>) -> Rc<VariableExpander<'s>> {
        let logger = self.logger.clone();
        let builder = VariableExpander::builder()
            .with_options(&self.options)
            .with_bundles(scope.bundles())
            .with_variable_supplier(move |name| scope.variable(name))
            .with_condition_evaluator(move |name| {
                match scope.condition_or_variable(name, Some("")) {
                    Some(value) => value,
                    None => {
                        if let Some(logger) = &logger {
                            logger.debug("Missing condition {0}, assuming {1}", &[&name, &false]);
                        }
                        false
                    }
                }
            });
        let builder = match &self.logger {
            Some(logger) => builder.with_shared_logger(Rc::clone(logger)),
            None => builder.without_logger()
        };
        Rc::new(builder.build())
    }

    fn read<'s>(&self, block: &mut Block<'s>, reader: &mut Reader) -> Result<()> {
        let mut buf = String::new();
        let mut escaped = false;
        while let Some(c) = reader.pop_front() {
            if c == '\\' && !escaped {
                escaped = true;
                // captured rows are re-read later, so they keep their escapes
                if block.replays() && self.step(block, &mut buf, c, true, reader)? {
                    return Ok(());
                }
                continue;
            }
            if self.step(block, &mut buf, c, escaped, reader)? {
                return Ok(());
            }
            escaped = false;
        }
        // unterminated markers and tags are plain text
        block.flush(&mut buf, None);
        Ok(())
    }

    // feeds one character, true once the block's own closing tag is consumed
    fn step<'s>(
        &self, block: &mut Block<'s>, buf: &mut String, c: char, escaped: bool, reader: &mut Reader
    ) -> Result<bool> {
        match block.state {
            State::Literal => block.literal(buf, c, escaped),

            State::VariableOpenSeen => {
                if c == '{' && !escaped {
                    block.state = State::VariableBody;
                    block.brace_depth = 1;
                    buf.push(c);
                } else {
                    block.restart(buf, c, escaped);
                }
            },
            State::VariableBody => {
                if escaped {
                    buf.push(c);
                } else if c == '{' {
                    block.brace_depth += 1;
                    buf.push(c);
                } else if c == '}' {
                    block.brace_depth -= 1;
                    if block.brace_depth == 0 {
                        let text = block.expander.expand(&buf[2..])?;
                        block.emit(&text);
                        buf.clear();
                        block.state = State::Literal;
                    } else {
                        buf.push(c);
                    }
                } else {
                    buf.push(c);
                }
            },

            State::TagOpenSeen => match c {
                '/' if !escaped => {
                    block.state = State::OrdinaryTagClose;
                    buf.push(c);
                },
                't' if !escaped => {
                    block.state = State::DirectiveTagOpenSeen;
                    buf.push(c);
                },
                _ => block.restart(buf, c, escaped)
            },
            State::DirectiveTagOpenSeen => {
                if c == ':' && !escaped {
                    block.state = State::DirectiveName;
                    buf.push(c);
                } else {
                    block.restart(buf, c, escaped);
                }
            },
            State::DirectiveName => match c {
                '>' if !escaped => {
                    let directive = buf[3..].trim().to_owned();
                    self.open_tag(block, buf, &directive, reader)?;
                },
                '/' if !escaped => {
                    block.state = State::DirectiveLeafClose;
                    buf.push(c);
                },
                _ => buf.push(c)
            },
            State::DirectiveLeafClose => match c {
                '>' if !escaped => {
                    let directive = buf[3..]
                        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
                        .trim()
                        .to_owned();
                    self.leaf_tag(block, buf, &directive, reader)?;
                },
                '/' if !escaped => buf.push(c),
                c if c.is_whitespace() && !escaped => buf.push(c),
                _ => {
                    block.state = State::DirectiveName;
                    buf.push(c);
                }
            },

            State::OrdinaryTagClose => {
                if c == 't' && !escaped {
                    block.state = State::DirectiveCloseOpenSeen;
                    buf.push(c);
                } else {
                    block.restart(buf, c, escaped);
                }
            },
            State::DirectiveCloseOpenSeen => {
                if c == ':' && !escaped {
                    block.state = State::DirectiveCloseTagSeen;
                    buf.push(c);
                } else {
                    block.restart(buf, c, escaped);
                }
            },
            State::DirectiveCloseTagSeen => {
                if c == '>' && !escaped {
                    block.flush(buf, Some(c));
                    block.state = State::Literal;
                } else {
                    block.state = State::DirectiveClose;
                    buf.push(c);
                }
            },
            State::DirectiveClose => {
                if c == '>' && !escaped {
                    let directive = buf[4..].trim().to_owned();
                    return Ok(self.close_tag(block, buf, &directive));
                }
                buf.push(c);
            }
        }
        Ok(false)
    }

    fn open_tag<'s>(
        &self, block: &mut Block<'s>, buf: &mut String, directive: &str, reader: &mut Reader
    ) -> Result<()> {
        let processing = block.processing();
        self.debug(block, "Tag found {0}. Process {1}", &[&directive, &processing]);

        let dispatched = processing && self.dispatch(block, directive, reader)?;
        if dispatched {
            buf.clear();
        } else {
            // the closing tag of a skipped or failed block must still pair up
            if is_nesting(directive_name(directive)) {
                block.nest_depth += 1;
                self.debug(block, "Nest depth increases for {0} to {1}", &[&directive, &block.nest_depth]);
            }
            block.flush(buf, Some('>'));
        }
        block.state = State::Literal;
        Ok(())
    }

    fn leaf_tag<'s>(
        &self, block: &mut Block<'s>, buf: &mut String, directive: &str, reader: &mut Reader
    ) -> Result<()> {
        let processing = block.processing();
        self.debug(
            block,
            "Leaf end {0}. Process {1}, Match {2}. Nest Depth {3}",
            &[&directive, &processing, &block.matched, &block.nest_depth]
        );

        if directive == "else" && !block.capture {
            if self.otherwise(block) {
                buf.clear();
            } else {
                block.flush(buf, Some('>'));
            }
        } else if processing && self.dispatch(block, directive, reader)? {
            buf.clear();
        } else {
            block.flush(buf, Some('>'));
        }
        block.state = State::Literal;
        Ok(())
    }

    fn close_tag(&self, block: &mut Block<'_>, buf: &mut String, name: &str) -> bool {
        self.debug(block, "Tag end {0}. Process {1}", &[&name, &block.processing()]);

        let nesting = is_nesting(name);
        if nesting {
            block.nest_depth = block.nest_depth.saturating_sub(1);
            self.debug(block, "Nest depth decreases for {0} to {1}", &[&name, &block.nest_depth]);
        }
        let own = block.directive.is_some_and(|directive| directive.name() == name);
        if own && (!nesting || block.nest_depth == 0) {
            self.debug(block, "Leaving scope {0}", &[&name]);
            buf.clear();
            return true;
        }
        block.flush(buf, Some('>'));
        block.state = State::Literal;
        false
    }

    // `<t:else/>`, false when it is to be passed through as text
    fn otherwise(&self, block: &mut Block<'_>) -> bool {
        if block.directive != Some(Directive::If) {
            self.warning("Unexpected else outside of a condition", &[]);
            return false;
        }
        if block.nest_depth > 1 {
            // belongs to a nested condition being skipped
            return !block.matched;
        }
        self.debug(
            block,
            "Else for {0}. Matching changing from {1} to {2}",
            &[&block.depth, &block.matched, &!block.matched]
        );
        block.matched = !block.matched;
        true
    }

    fn dispatch<'s>(&self, block: &mut Block<'s>, directive: &str, reader: &mut Reader) -> Result<bool> {
        let name = directive_name(directive);
        let arg = directive[name.len()..].trim();
        self.debug(block, "Process directive {0}. Var {1}", &[&name, &arg]);

        if arg.is_empty() && matches!(name, "if" | "include" | "list" | "object" | "instruct") {
            self.warning("Missing name for {0} directive", &[&name]);
            return Ok(false);
        }
        match name {
            "if" => self.condition(block, arg, reader),
            "include" => self.include(block, arg),
            "list" => self.list(block, arg, reader),
            "object" => self.object(block, arg, reader),
            "ignore" => {
                let content = self.capture(block, Directive::Ignore, reader)?;
                block.emit(&content);
                Ok(true)
            },
            "instruct" => {
                self.instruct(block, arg);
                Ok(true)
            },
            _ => {
                self.warning("Unknown directive t:{0}", &[&name]);
                Ok(false)
            }
        }
    }

    fn condition<'s>(&self, block: &mut Block<'s>, arg: &str, reader: &mut Reader) -> Result<bool> {
        let condition = Condition::parse(arg);
        let matched = match block.scope.condition_or_variable(condition.name, Some("")) {
            Some(value) => value,
            None if self.options.missing_condition_throws => {
                return Err(Error::MissingCondition(condition.name.to_owned()));
            },
            None => {
                self.warning("No condition in model named {0}, assuming {1}", &[&condition.name, &false]);
                false
            }
        };
        let matched = matched != condition.negate;
        self.debug(block, "Condition {0} evaluates to {1}", &[&arg, &matched]);

        let mut child = block.nested(Directive::If, matched, false);
        self.read(&mut child, reader)?;
        block.merge(child, true);
        Ok(true)
    }

    fn include(&self, block: &mut Block<'_>, name: &str) -> Result<bool> {
        let Some(model) = block.scope.model.include_model(name) else {
            if self.options.missing_include_throws {
                return Err(Error::MissingInclude(name.to_owned()));
            }
            self.warning("No include in model named {0}", &[&name]);
            return Ok(true);
        };
        self.debug(block, "** Including template {0} **", &[&name]);
        let child = self.run(Scope::root(&model), block.depth + 1)?;
        block.merge(child, false);
        Ok(true)
    }

    fn list<'s>(&self, block: &mut Block<'s>, name: &str, reader: &mut Reader) -> Result<bool> {
        let Some(producer) = block.scope.model.list_rows(name) else {
            return self.missing(Error::MissingList(name.to_owned()), "No list in model named {0}", name);
        };
        let content = self.capture(block, Directive::List, reader)?;
        let mut rows = producer(content.as_str());
        let size = rows.len();
        let parent = block.scope;
        for (index, row) in rows.iter_mut().enumerate() {
            row.inject_row(index, size);
            let child = self.run(Scope::child(row, &parent), block.depth + 1)?;
            block.merge(child, false);
        }
        Ok(true)
    }

    fn object<'s>(&self, block: &mut Block<'s>, name: &str, reader: &mut Reader) -> Result<bool> {
        let Some(producer) = block.scope.model.object_model(name) else {
            return self.missing(Error::MissingObject(name.to_owned()), "No object in model named {0}", name);
        };
        let content = self.capture(block, Directive::Object, reader)?;
        let model = producer(content.as_str());
        let parent = block.scope;
        let child = self.run(Scope::child(&model, &parent), block.depth + 1)?;
        block.merge(child, false);
        Ok(true)
    }

    // raw text up to the closing tag of `directive`
    fn capture<'s>(&self, block: &Block<'s>, directive: Directive, reader: &mut Reader) -> Result<String> {
        let mut child = block.nested(directive, true, true);
        self.read(&mut child, reader)?;
        Ok(child.out)
    }

    fn instruct(&self, block: &mut Block<'_>, instruction: &str) {
        self.debug(block, "Processing instruction `{0}`", &[&instruction]);
        match instruction {
            "reset" => {
                block.out.clear();
                block.reset = true;
            },
            "end" => block.write = false,
            _ => {
                if !block.scope.model.on_instruction(instruction) {
                    self.debug(block, "No handler for instruction `{0}`", &[&instruction]);
                }
            }
        }
    }

    fn missing(&self, error: Error, message: &str, name: &str) -> Result<bool> {
        if self.options.missing_include_throws {
            return Err(error);
        }
        self.warning(message, &[&name]);
        Ok(false)
    }

    fn warning(&self, message: &str, args: &[&dyn fmt::Display]) {
        if let Some(logger) = &self.logger {
            logger.warning(message, args);
        }
    }

    fn debug(&self, block: &Block<'_>, message: &str, args: &[&dyn fmt::Display]) {
        if let Some(logger) = &self.logger {
            if block.depth == 0 {
                logger.debug(message, args);
            } else {
                logger.debug(&format!("{:indent$}{}", "", message, indent = block.depth * 4), args);
            }
        }
    }
}


pub struct Builder {
    options: Options,
    logger: Option<Rc<dyn Logger>>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            options: Options::default(),
            logger: Some(Rc::new(TracingLogger)),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_nulls_are_empty(mut self, nulls_are_empty: bool) -> Self {
        self.options.nulls_are_empty = nulls_are_empty;
        self
    }

    pub fn with_nulls_as_null(self) -> Self {
        self.with_nulls_are_empty(false)
    }

    pub fn with_missing_variable_throws(mut self, throws: bool) -> Self {
        self.options.missing_variable_throws = throws;
        self
    }

    pub fn with_missing_as_null(self) -> Self {
        self.with_missing_variable_throws(false)
    }

    pub fn with_missing_condition_throws(mut self, throws: bool) -> Self {
        self.options.missing_condition_throws = throws;
        self
    }

    pub fn with_missing_include_throws(mut self, throws: bool) -> Self {
        self.options.missing_include_throws = throws;
        self
    }

    pub fn with_argument_separator(mut self, separator: char) -> Self {
        self.options.argument_separator = separator;
        self
    }

    pub fn with_logger<L: Logger + 'static>(mut self, logger: L) -> Self {
        self.logger = Some(Rc::new(logger));
        self
    }

    pub fn without_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    pub fn build(self) -> TemplateProcessor {
        TemplateProcessor {
            options: self.options,
            logger: self.logger,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    /// `<`
    TagOpenSeen,
    /// `<t`
    DirectiveTagOpenSeen,
    /// `<t:` up to `>` or `/`
    DirectiveName,
    /// `<t:name arg/` up to `>`
    DirectiveLeafClose,
    /// `</`
    OrdinaryTagClose,
    /// `</t`
    DirectiveCloseOpenSeen,
    /// `</t:`
    DirectiveCloseTagSeen,
    /// `</t:n` up to `>`
    DirectiveClose,
    /// `$`
    VariableOpenSeen,
    /// `${` up to the matching `}`
    VariableBody,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    If,
    List,
    Object,
    Ignore,
}

impl Directive {
    fn name(self) -> &'static str {
        match self {
            Directive::If => "if",
            Directive::List => "list",
            Directive::Object => "object",
            Directive::Ignore => "ignore",
        }
    }
}

fn directive_name(directive: &str) -> &str {
    directive.split(char::is_whitespace).next().unwrap_or_default()
}

fn is_nesting(name: &str) -> bool {
    matches!(name, "if" | "list" | "object")
}


struct Condition<'d> {
    negate: bool,
    name: &'d str,
}

impl<'d> Condition<'d> {
    fn parse(text: &'d str) -> Self {
        if let Some(rest) = text.strip_prefix("not") {
            if rest.starts_with(char::is_whitespace) {
                return Condition { negate: true, name: rest.trim() };
            }
        }
        match text.strip_prefix('!') {
            Some(rest) => Condition { negate: true, name: rest.trim() },
            None => Condition { negate: false, name: text }
        }
    }
}


/// One in-flight interpretation context.
struct Block<'s> {
    out: String,
    scope: Scope<'s>,
    expander: Rc<VariableExpander<'s>>,
    directive: Option<Directive>,
    state: State,
    matched: bool,
    capture: bool,
    write: bool,
    reset: bool,
    nest_depth: usize,
    brace_depth: usize,
    depth: usize,
}

impl<'s> Block<'s> {
    fn new(scope: Scope<'s>, expander: Rc<VariableExpander<'s>>, depth: usize) -> Self {
        Block {
            out: String::new(),
            scope,
            expander,
            directive: None,
            state: State::Literal,
            matched: true,
            capture: false,
            write: true,
            reset: false,
            nest_depth: 0,
            brace_depth: 0,
            depth,
        }
    }

    // a block reading on from the same text until the closing tag of `directive`
    fn nested(&self, directive: Directive, matched: bool, capture: bool) -> Self {
        Block {
            directive: Some(directive),
            matched,
            capture,
            nest_depth: 1,
            ..Block::new(self.scope, Rc::clone(&self.expander), self.depth + 1)
        }
    }

    fn replays(&self) -> bool {
        self.capture && self.directive != Some(Directive::Ignore)
    }

    fn processing(&self) -> bool {
        !self.capture && self.matched
    }

    fn emit(&mut self, text: &str) {
        if self.write {
            self.out.push_str(text);
        }
    }

    fn emit_char(&mut self, c: char) {
        if self.write {
            self.out.push(c);
        }
    }

    fn literal(&mut self, buf: &mut String, c: char, escaped: bool) {
        if !escaped && c == '$' && self.processing() {
            self.state = State::VariableOpenSeen;
            buf.push(c);
        } else if !escaped && c == '<' {
            self.state = State::TagOpenSeen;
            buf.push(c);
        } else if self.matched {
            self.emit_char(c);
        }
    }

    // gives up on the pending prefix and handles `c` as ordinary text
    fn restart(&mut self, buf: &mut String, c: char, escaped: bool) {
        self.flush(buf, None);
        self.state = State::Literal;
        self.literal(buf, c, escaped);
    }

    fn flush(&mut self, buf: &mut String, c: Option<char>) {
        if self.matched {
            let text = mem::take(buf);
            self.emit(&text);
            if let Some(c) = c {
                self.emit_char(c);
            }
        }
        buf.clear();
    }

    // `same_model` children share this block's text, so `end` carries over
    fn merge(&mut self, child: Block<'_>, same_model: bool) {
        if child.reset {
            self.out.clear();
            self.reset = true;
        }
        self.emit(&child.out);
        if same_model && !child.write {
            self.write = false;
        }
    }
}
