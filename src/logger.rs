use std::fmt;


/// Sink for the diagnostics produced while expanding templates.
///
/// Messages are positional templates (`{0}`, `{1}`, ...) rendered with
/// [format_message]; implementations decide whether and where to render them.
pub trait Logger {
    fn warning(&self, message: &str, args: &[&dyn fmt::Display]);

    fn debug(&self, message: &str, args: &[&dyn fmt::Display]);
}


/// Default [Logger], forwarding to `tracing` under the `tinytemplate` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn warning(&self, message: &str, args: &[&dyn fmt::Display]) {
        tracing::warn!(target: "tinytemplate", "{}", format_message(message, args));
    }

    fn debug(&self, message: &str, args: &[&dyn fmt::Display]) {
        if tracing::enabled!(target: "tinytemplate", tracing::Level::DEBUG) {
            tracing::debug!(target: "tinytemplate", "{}", format_message(message, args));
        }
    }
}


/// Positional message formatting.
///
/// `{n}` is replaced by the n-th argument (a `{n,type}` suffix is ignored),
/// `''` produces a single quote and text between single quotes is copied
/// literally. Placeholders without a matching argument are left as they are.
pub fn format_message<T: fmt::Display>(template: &str, args: &[T]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    result.push('\'');
                } else {
                    quoted = !quoted;
                }
            },
            '{' if !quoted => {
                let mut placeholder = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    placeholder.push(n);
                }
                let index = placeholder
                    .split(',')
                    .next()
                    .and_then(|it| it.trim().parse::<usize>().ok());
                match (closed, index) {
                    (true, Some(i)) if i < args.len() => {
                        result.push_str(&args[i].to_string())
                    },
                    _ => {
                        result.push('{');
                        result.push_str(&placeholder);
                        if closed {
                            result.push('}');
                        }
                    }
                }
            },
            _ => result.push(c)
        }
    }
    result
}
