//! Filters applied to placeholder values: `(( key | latex | newlines ))`
//!
//! Each engine owns its filter set; there is no process-wide registry.

use crate::escape::escape_latex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the escaping filter
pub const LATEX: &str = "latex";

/// Name of the filter marking a value as trusted TeX
pub const RAW: &str = "raw";

pub type Filter = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
pub struct FilterSet {
    filters: HashMap<String, Filter>,
}

impl FilterSet {
    /// An empty set, without even the built-ins
    pub fn empty() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// The built-in filters: `latex`, `raw`, `newlines`, `upper`, `lower`, `trim`
    pub fn builtin() -> Self {
        let mut set = Self::empty();
        set.register(LATEX, escape_latex);
        set.register(RAW, str::to_string);
        set.register("newlines", newlines_to_breaks);
        set.register("upper", str::to_uppercase);
        set.register("lower", str::to_lowercase);
        set.register("trim", |s: &str| s.trim().to_string());
        set
    }

    /// Register (or replace) a filter
    pub fn register<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Arc::new(filter));
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSet")
            .field("filters", &self.names())
            .finish()
    }
}

/// Join the non-blank lines of `text` with TeX line breaks (`\\`)
///
/// Blank lines are dropped: `\\` on an empty line is a TeX error.
fn newlines_to_breaks(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\\\\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(set: &FilterSet, name: &str, input: &str) -> String {
        (set.get(name).unwrap())(input)
    }

    #[test]
    fn test_builtin_names() {
        let set = FilterSet::builtin();
        assert_eq!(
            set.names(),
            vec!["latex", "lower", "newlines", "raw", "trim", "upper"]
        );
    }

    #[test]
    fn test_newlines_drops_blank_lines() {
        let set = FilterSet::builtin();
        assert_eq!(
            apply(&set, "newlines", "Swedish -- Mother tongue\n\nEnglish -- Fluent\n"),
            "Swedish -- Mother tongue\\\\\nEnglish -- Fluent"
        );
    }

    #[test]
    fn test_custom_filter_registration() {
        let mut set = FilterSet::empty();
        assert!(!set.contains("shout"));
        set.register("shout", |s: &str| format!("{}!", s.to_uppercase()));
        assert_eq!(apply(&set, "shout", "hi"), "HI!");
    }
}
