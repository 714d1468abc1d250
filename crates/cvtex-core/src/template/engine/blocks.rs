//! Block structure: turns the flat token list into a tree of nodes
//!
//! `each` and `if` blocks nest arbitrarily; every block must be closed by the
//! matching `/each` or `/if` tag.

use super::tokenize::{Token, TokenKind};
use crate::template::error::TemplateError;

/// A parsed placeholder expression: `key | filter | filter`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expr {
    pub key: String,
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Placeholder {
        expr: Expr,
        line: usize,
    },
    Each {
        key: String,
        var_name: String,
        body: Vec<Node>,
        line: usize,
    },
    If {
        key: String,
        negate: bool,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
}

/// What ended a sequence of nodes
enum Terminator {
    Eof,
    Else { line: usize },
    End { keyword: String, line: usize },
}

/// Parse tokens into a node tree
pub(crate) fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut iter = tokens.into_iter();
    let (nodes, terminator) = parse_sequence(&mut iter)?;
    match terminator {
        Terminator::Eof => Ok(nodes),
        Terminator::Else { line } => Err(TemplateError::MalformedSyntax {
            message: "Unexpected else outside of an if block".to_string(),
            line,
        }),
        Terminator::End { keyword, line } => Err(TemplateError::MalformedSyntax {
            message: format!("Unexpected /{} without matching {}", keyword, keyword),
            line,
        }),
    }
}

fn parse_sequence(
    iter: &mut std::vec::IntoIter<Token>,
) -> Result<(Vec<Node>, Terminator), TemplateError> {
    let mut nodes = Vec::new();

    while let Some(token) = iter.next() {
        match token.kind {
            TokenKind::Text(text) => nodes.push(Node::Text(text)),
            TokenKind::Placeholder { expr } => nodes.push(Node::Placeholder {
                expr: parse_expr(&expr, token.line)?,
                line: token.line,
            }),
            TokenKind::Else => return Ok((nodes, Terminator::Else { line: token.line })),
            TokenKind::BlockEnd { keyword } => {
                return Ok((
                    nodes,
                    Terminator::End {
                        keyword,
                        line: token.line,
                    },
                ))
            }
            TokenKind::BlockStart { keyword, args } => {
                let node = match keyword.as_str() {
                    "each" => parse_each(iter, &args, token.line)?,
                    "if" => parse_if(iter, &args, token.line)?,
                    other => {
                        return Err(TemplateError::MalformedSyntax {
                            message: format!("Unknown block keyword '{}'", other),
                            line: token.line,
                        })
                    }
                };
                nodes.push(node);
            }
        }
    }

    Ok((nodes, Terminator::Eof))
}

fn parse_each(
    iter: &mut std::vec::IntoIter<Token>,
    args: &str,
    line: usize,
) -> Result<Node, TemplateError> {
    let (key, var_name) = parse_each_syntax(args, line)?;
    let (body, terminator) = parse_sequence(iter)?;
    expect_end(terminator, "each", key, line)?;
    Ok(Node::Each {
        key: key.to_string(),
        var_name: var_name.to_string(),
        body,
        line,
    })
}

fn parse_if(
    iter: &mut std::vec::IntoIter<Token>,
    args: &str,
    line: usize,
) -> Result<Node, TemplateError> {
    let (negate, key) = match args.strip_prefix("not ") {
        Some(rest) => (true, rest.trim()),
        None => (false, args.trim()),
    };
    if key.is_empty() {
        return Err(TemplateError::MalformedSyntax {
            message: "Invalid if syntax: expected 'if key' or 'if not key'".to_string(),
            line,
        });
    }

    let (then_branch, terminator) = parse_sequence(iter)?;
    let else_branch = match terminator {
        Terminator::Else { .. } => {
            let (else_branch, terminator) = parse_sequence(iter)?;
            expect_end(terminator, "if", key, line)?;
            else_branch
        }
        other => {
            expect_end(other, "if", key, line)?;
            Vec::new()
        }
    };

    Ok(Node::If {
        key: key.to_string(),
        negate,
        then_branch,
        else_branch,
    })
}

fn expect_end(
    terminator: Terminator,
    keyword: &str,
    key: &str,
    open_line: usize,
) -> Result<(), TemplateError> {
    match terminator {
        Terminator::End { keyword: found, .. } if found == keyword => Ok(()),
        Terminator::End { keyword: found, line } => Err(TemplateError::MalformedSyntax {
            message: format!("Expected /{} but found /{}", keyword, found),
            line,
        }),
        Terminator::Else { line } => Err(TemplateError::MalformedSyntax {
            message: format!("Unexpected else inside {} block", keyword),
            line,
        }),
        Terminator::Eof => Err(TemplateError::MalformedSyntax {
            message: format!("Unclosed {} block for key '{}'", keyword, key),
            line: open_line,
        }),
    }
}

/// Parse each loop syntax: "items |item|" → (key, var_name)
fn parse_each_syntax(rest: &str, line: usize) -> Result<(&str, &str), TemplateError> {
    let pipe_pos = rest
        .find('|')
        .ok_or_else(|| TemplateError::MalformedSyntax {
            message: format!("Invalid each syntax: expected |var| in 'each {}'", rest),
            line,
        })?;

    let key = rest[..pipe_pos].trim();
    let var_end = rest[pipe_pos + 1..]
        .find('|')
        .ok_or_else(|| TemplateError::MalformedSyntax {
            message: format!("Invalid each syntax: unclosed |var| in 'each {}'", rest),
            line,
        })?;

    let var_name = rest[pipe_pos + 1..pipe_pos + 1 + var_end].trim();
    if key.is_empty() || !is_identifier(var_name) {
        return Err(TemplateError::MalformedSyntax {
            message: format!("Invalid each syntax: 'each {}'", rest),
            line,
        });
    }
    Ok((key, var_name))
}

/// Parse "key | filter | filter"
fn parse_expr(expr: &str, line: usize) -> Result<Expr, TemplateError> {
    let mut parts = expr.split('|').map(str::trim);
    let key = parts.next().unwrap_or_default();
    if key.is_empty() || !key.split('.').all(is_identifier) {
        return Err(TemplateError::MalformedSyntax {
            message: format!("Invalid placeholder expression '{}'", expr),
            line,
        });
    }

    let filters: Vec<String> = parts.map(str::to_string).collect();
    if filters.iter().any(|f| f.is_empty()) {
        return Err(TemplateError::MalformedSyntax {
            message: format!("Empty filter name in '{}'", expr),
            line,
        });
    }

    Ok(Expr {
        key: key.to_string(),
        filters,
    })
}

fn is_identifier(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
