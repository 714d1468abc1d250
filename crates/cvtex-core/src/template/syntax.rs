//! Delimiter configuration for the template language

/// Delimiter set used to recognise template tags
///
/// The defaults stay clear of the backslash so that TeX control sequences in a
/// template never need escaping:
///
/// - placeholders: `(( key | filter ))`
/// - blocks: `((* each items |item| *))`, `((* if key *))`, `((* else *))`, `((* /if *))`
/// - comments: `((# note #))`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub variable_start: String,
    pub variable_end: String,
    pub block_start: String,
    pub block_end: String,
    pub comment_start: String,
    pub comment_end: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            variable_start: "((".to_string(),
            variable_end: "))".to_string(),
            block_start: "((*".to_string(),
            block_end: "*))".to_string(),
            comment_start: "((#".to_string(),
            comment_end: "#))".to_string(),
        }
    }
}

impl Syntax {
    /// Check that every delimiter is non-empty and free of backslashes
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("variable_start", &self.variable_start),
            ("variable_end", &self.variable_end),
            ("block_start", &self.block_start),
            ("block_end", &self.block_end),
            ("comment_start", &self.comment_start),
            ("comment_end", &self.comment_end),
        ];
        for (name, delim) in all {
            if delim.is_empty() {
                return Err(format!("{} must not be empty", name));
            }
            if delim.contains('\\') {
                return Err(format!(
                    "{} '{}' contains a backslash, which collides with TeX control sequences",
                    name, delim
                ));
            }
        }
        if self.variable_start == self.block_start
            || self.variable_start == self.comment_start
            || self.block_start == self.comment_start
        {
            return Err("variable, block and comment start delimiters must differ".to_string());
        }
        Ok(())
    }

    /// Start delimiters with their tag class, longest first so that prefixes lose ties
    pub(crate) fn starts(&self) -> [(&str, TagClass); 3] {
        let mut starts = [
            (self.block_start.as_str(), TagClass::Block),
            (self.comment_start.as_str(), TagClass::Comment),
            (self.variable_start.as_str(), TagClass::Variable),
        ];
        starts.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        starts
    }

    pub(crate) fn end_for(&self, class: TagClass) -> &str {
        match class {
            TagClass::Variable => &self.variable_end,
            TagClass::Block => &self.block_end,
            TagClass::Comment => &self.comment_end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagClass {
    Variable,
    Block,
    Comment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_syntax_is_valid() {
        assert!(Syntax::default().validate().is_ok());
    }

    #[test]
    fn test_backslash_delimiter_rejected() {
        let syntax = Syntax {
            variable_start: r"\VAR{".to_string(),
            variable_end: "}".to_string(),
            ..Syntax::default()
        };
        let err = syntax.validate().unwrap_err();
        assert!(err.contains("backslash"));
    }

    #[test]
    fn test_shared_block_and_comment_start_rejected() {
        let syntax = Syntax {
            comment_start: "((*".to_string(),
            ..Syntax::default()
        };
        assert!(syntax.validate().unwrap_err().contains("must differ"));
    }

    #[test]
    fn test_longest_start_sorted_first() {
        let syntax = Syntax::default();
        let starts = syntax.starts();
        assert_eq!(starts[2], ("((", TagClass::Variable));
    }
}
