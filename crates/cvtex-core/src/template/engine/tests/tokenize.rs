//! Tokenizer tests

use crate::template::engine::tokenize::{tokenize, Token, TokenKind};
use super::*;

fn kinds(template: &str) -> Vec<TokenKind> {
    tokenize(template, &Syntax::default())
        .unwrap()
        .into_iter()
        .map(|t: Token| t.kind)
        .collect()
}

#[test]
fn test_tokenize_classifies_tags() {
    assert_eq!(
        kinds("a ((x|latex)) ((* each xs |x| *))((* else *))((* /each *))((# c #))"),
        vec![
            TokenKind::Text("a ".to_string()),
            TokenKind::Placeholder {
                expr: "x|latex".to_string()
            },
            TokenKind::Text(" ".to_string()),
            TokenKind::BlockStart {
                keyword: "each".to_string(),
                args: "xs |x|".to_string()
            },
            TokenKind::Else,
            TokenKind::BlockEnd {
                keyword: "each".to_string()
            },
        ]
    );
}

#[test]
fn test_longest_delimiter_wins_on_tie() {
    // "((*" and "((" start at the same position
    assert_eq!(
        kinds("((* if a *))"),
        vec![TokenKind::BlockStart {
            keyword: "if".to_string(),
            args: "a".to_string()
        }]
    );
}

#[test]
fn test_line_numbers_follow_trimmed_newlines() {
    let tokens = tokenize("((* if a *))\nline2\n((x))", &Syntax::default()).unwrap();
    let placeholder = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::Placeholder { .. }))
        .unwrap();
    assert_eq!(placeholder.line, 3);
}

#[test]
fn test_unclosed_tag_is_malformed() {
    let err = tokenize("text ((* if a", &Syntax::default()).unwrap_err();
    assert!(matches!(err, TemplateError::MalformedSyntax { line: 1, .. }));
}

#[test]
fn test_empty_placeholder_is_malformed() {
    let err = tokenize("(( ))", &Syntax::default()).unwrap_err();
    assert!(matches!(err, TemplateError::MalformedSyntax { .. }));
}
