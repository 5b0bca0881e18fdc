use std::collections::HashMap;
use std::env;
use std::fmt;


/// A set of localized strings.
pub trait Bundle {
    fn get(&self, key: &str) -> Option<String>;
}

impl Bundle for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}


/// A [Bundle] held in memory, typically parsed from `.properties` text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapBundle {
    entries: HashMap<String, String>
}

impl MapBundle {
    pub fn new() -> Self {
        MapBundle { entries: HashMap::new() }
    }

    pub fn with(mut self, key: &str, text: &str) -> Self {
        self.entries.insert(key.to_owned(), text.to_owned());
        self
    }

    /// Parses `key=value` or `key: value` lines.
    ///
    /// Lines starting with `#` or `!` are comments and a trailing backslash
    /// continues the value on the next line.
    pub fn from_properties(text: &str) -> Self {
        let mut entries = HashMap::new();
        let mut pending = String::new();
        for line in text.lines() {
            let line = line.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }
            match line.strip_suffix('\\') {
                Some(head) => {
                    pending.push_str(head);
                    continue;
                },
                None => pending.push_str(line)
            }
            if let Some((key, value)) = split_property(&pending) {
                entries.insert(key, value);
            }
            pending.clear();
        }
        if let Some((key, value)) = split_property(&pending) {
            entries.insert(key, value);
        }
        MapBundle { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_property(line: &str) -> Option<(String, String)> {
    if line.trim().is_empty() {
        return None;
    }
    let (key, value) = match line.find(['=', ':']) {
        Some(p) => (&line[..p], &line[p + 1..]),
        None => (line, "")
    };
    Some((key.trim().to_owned(), value.trim_start().to_owned()))
}

impl Bundle for MapBundle {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}


/// A locale tag such as `en_GB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: &str) -> Self {
        Locale(tag.to_owned())
    }

    /// The locale of the environment, from `LC_ALL`, `LC_MESSAGES` or `LANG`.
    pub fn current() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|name| env::var(name).ok())
            .map(|value| strip_encoding(&value).to_owned())
            .find(|tag| !tag.is_empty() && tag != "C" && tag != "POSIX")
            .map_or_else(|| Locale::new("en"), Locale)
    }

    pub fn tag(&self) -> &str {
        &self.0
    }

    /// The language part of the tag, `en` for `en_GB`.
    pub fn language(&self) -> &str {
        self.0.split(['_', '-']).next().unwrap_or_default()
    }
}

fn strip_encoding(value: &str) -> &str {
    value.split(['.', '@']).next().unwrap_or_default()
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
