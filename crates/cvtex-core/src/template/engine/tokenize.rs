//! Tokenization for template engine
//!
//! Splits a template into literal text and tags in a single forward pass,
//! applying whitespace control around block and comment tags.

use crate::template::error::TemplateError;
use crate::template::syntax::{Syntax, TagClass};

/// Token classification
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Literal template text, emitted as-is
    Text(String),

    /// (( key | filter ))
    Placeholder { expr: String },

    /// ((* each items |var| *)) or ((* if key *))
    BlockStart { keyword: String, args: String },

    /// ((* else *))
    Else,

    /// ((* /each *)) or ((* /if *))
    BlockEnd { keyword: String },
}

/// A single token with the line it starts on (for error messages)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Tokenize `template` with the given delimiters
///
/// # Whitespace control
///
/// Block and comment tags remove the newline directly following them, and the
/// spaces or tabs between the start of their line and the tag. A tag alone on
/// its line therefore leaves no blank line behind.
pub(crate) fn tokenize(template: &str, syntax: &Syntax) -> Result<Vec<Token>, TemplateError> {
    let starts = syntax.starts();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < template.len() {
        let remaining = &template[pos..];

        let Some((offset, start_len, class)) = next_tag(remaining, &starts) else {
            push_text(&mut tokens, remaining, line);
            break;
        };

        let tag_pos = pos + offset;
        let mut text = &template[pos..tag_pos];
        let text_line = line;
        line += count_newlines(text);

        if class != TagClass::Variable {
            text = lstrip_tag_line(template, pos, tag_pos);
        }
        push_text(&mut tokens, text, text_line);

        let content_start = tag_pos + start_len;
        let end_delim = syntax.end_for(class);
        let close = template[content_start..]
            .find(end_delim)
            .ok_or_else(|| TemplateError::MalformedSyntax {
                message: format!("Unclosed tag: expected '{}'", end_delim),
                line,
            })?;
        let content = &template[content_start..content_start + close];
        let tag_line = line;
        line += count_newlines(content);
        pos = content_start + close + end_delim.len();

        if class != TagClass::Variable {
            let trimmed = trailing_newline_len(&template[pos..]);
            if trimmed > 0 {
                pos += trimmed;
                line += 1;
            }
        }

        if let Some(kind) = classify(class, content.trim(), tag_line)? {
            tokens.push(Token {
                kind,
                line: tag_line,
            });
        }
    }

    Ok(tokens)
}

/// Find the earliest tag start; on a tie the longest delimiter wins
fn next_tag(text: &str, starts: &[(&str, TagClass); 3]) -> Option<(usize, usize, TagClass)> {
    let mut best: Option<(usize, usize, TagClass)> = None;
    for (delim, class) in starts {
        if let Some(found) = text.find(delim) {
            let better = match best {
                None => true,
                Some((pos, len, _)) => found < pos || (found == pos && delim.len() > len),
            };
            if better {
                best = Some((found, delim.len(), *class));
            }
        }
    }
    best
}

/// Drop spaces/tabs between the start of the tag's line and the tag itself
fn lstrip_tag_line(template: &str, text_start: usize, tag_pos: usize) -> &str {
    let bytes = template.as_bytes();
    let mut cut = tag_pos;
    while cut > text_start && matches!(bytes[cut - 1], b' ' | b'\t') {
        cut -= 1;
    }
    let at_line_start = cut == 0 || bytes[cut - 1] == b'\n';
    if at_line_start {
        &template[text_start..cut]
    } else {
        &template[text_start..tag_pos]
    }
}

fn trailing_newline_len(rest: &str) -> usize {
    if rest.starts_with("\r\n") {
        2
    } else if rest.starts_with('\n') {
        1
    } else {
        0
    }
}

fn classify(class: TagClass, content: &str, line: usize) -> Result<Option<TokenKind>, TemplateError> {
    match class {
        TagClass::Comment => Ok(None),
        TagClass::Variable => {
            if content.is_empty() {
                return Err(TemplateError::MalformedSyntax {
                    message: "Empty placeholder".to_string(),
                    line,
                });
            }
            Ok(Some(TokenKind::Placeholder {
                expr: content.to_string(),
            }))
        }
        TagClass::Block => {
            let (keyword, args) = match content.split_once(char::is_whitespace) {
                Some((keyword, args)) => (keyword, args.trim()),
                None => (content, ""),
            };
            match keyword {
                "" => Err(TemplateError::MalformedSyntax {
                    message: "Empty block tag".to_string(),
                    line,
                }),
                "else" => Ok(Some(TokenKind::Else)),
                k if k.starts_with('/') => Ok(Some(TokenKind::BlockEnd {
                    keyword: k[1..].trim().to_string(),
                })),
                k => Ok(Some(TokenKind::BlockStart {
                    keyword: k.to_string(),
                    args: args.to_string(),
                })),
            }
        }
    }
}

fn push_text(tokens: &mut Vec<Token>, text: &str, line: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            kind: TokenKind::Text(text.to_string()),
            line,
        });
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}
