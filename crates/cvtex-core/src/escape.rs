//! LaTeX escaping for user-provided text
//!
//! Arbitrary input such as `50%`, `R&D`, `foo_bar` or `$100` must not be able to
//! break compilation once substituted into a template.
//!
//! Escaping is not a fixed point: `escape_latex(escape_latex(s))` escapes the
//! backslashes introduced by the first pass. The render path applies the
//! `latex` filter at most once per placeholder.

use serde_json::Value;

/// Characters with a special meaning in TeX, paired with their safe encoding
///
/// Backslash comes first: the other encodings introduce backslashes of their own.
const REPLACEMENTS: [(char, &str); 10] = [
    ('\\', r"\textbackslash{}"),
    ('&', r"\&"),
    ('%', r"\%"),
    ('$', r"\$"),
    ('#', r"\#"),
    ('_', r"\_"),
    ('{', r"\{"),
    ('}', r"\}"),
    ('~', r"\textasciitilde{}"),
    ('^', r"\textasciicircum{}"),
];

/// Escape TeX special characters in `text`
///
/// Works in a single pass over the input, so an encoding produced for one
/// character is never re-examined. Every other character, including newlines and
/// non-ASCII text, passes through unchanged.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match REPLACEMENTS.iter().find(|(special, _)| *special == ch) {
            Some((_, encoded)) => out.push_str(encoded),
            None => out.push(ch),
        }
    }
    out
}

/// Escape an optional value; `None` yields an empty string
pub fn escape_opt<T: ToString>(value: Option<T>) -> String {
    match value {
        Some(v) => escape_latex(&v.to_string()),
        None => String::new(),
    }
}

/// Escape a data value after stringifying it
///
/// `null` yields an empty string; strings are escaped without their JSON quotes;
/// lists and maps are escaped in their JSON text form.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_latex(s),
        other => escape_latex(&other.to_string()),
    }
}

/// Whether `ch` would be rewritten by [`escape_latex`]
pub fn is_special(ch: char) -> bool {
    REPLACEMENTS.iter().any(|(special, _)| *special == ch)
}
