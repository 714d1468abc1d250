//! Template engine implementation

mod blocks;
mod helpers;
mod tokenize;

use crate::template::error::TemplateError;
use crate::template::filters::{FilterSet, LATEX, RAW};
use crate::template::syntax::Syntax;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

use blocks::{parse, Expr, Node};
use helpers::{create_loop_context, is_truthy, resolve_key, stringify_value, LoopInfo};

/// Maximum duration for template rendering (malformed input protection)
const RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Check if rendering has exceeded the timeout
fn check_timeout(start: Instant) -> Result<(), TemplateError> {
    let elapsed = start.elapsed();
    if elapsed >= RENDER_TIMEOUT {
        return Err(TemplateError::Timeout {
            max_duration: RENDER_TIMEOUT,
            elapsed,
        });
    }
    Ok(())
}

/// Whether placeholders are escaped without the template asking for it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escaping {
    /// Only placeholders with a `latex` filter are escaped; the template author
    /// is responsible for every free-text field
    #[default]
    Manual,
    /// Every placeholder is escaped unless its pipeline contains `raw` or `latex`
    Auto,
}

/// Template context holding document data for rendering
#[derive(Debug, Clone)]
pub struct TemplateContext {
    data: Value,
}

impl TemplateContext {
    /// Create a new template context from a data value
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Get the underlying data value
    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// Template engine for rendering templates with document data
///
/// An engine is configured explicitly at construction; two engines never share
/// filters or delimiters.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    syntax: Syntax,
    filters: FilterSet,
    escaping: Escaping,
}

impl TemplateEngine {
    /// Create a new template engine with default delimiters and built-in filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom delimiters
    ///
    /// # Errors
    ///
    /// Returns `InvalidSyntax` for empty, ambiguous or backslash-bearing delimiters.
    pub fn with_syntax(mut self, syntax: Syntax) -> Result<Self, TemplateError> {
        syntax
            .validate()
            .map_err(|message| TemplateError::InvalidSyntax { message })?;
        self.syntax = syntax;
        Ok(self)
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_escaping(mut self, escaping: Escaping) -> Self {
        self.escaping = escaping;
        self
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub fn escaping(&self) -> Escaping {
        self.escaping
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    /// Render a template with the given context
    pub fn render(
        &self,
        template: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let start = Instant::now();
        let nodes = self.compile(template)?;
        let mut output = String::with_capacity(template.len());
        self.render_nodes(&nodes, context, &mut output, start)?;
        Ok(output)
    }

    /// Tokenize, parse and check filter names without rendering
    pub fn check(&self, template: &str) -> Result<(), TemplateError> {
        self.compile(template).map(|_| ())
    }

    fn compile(&self, template: &str) -> Result<Vec<Node>, TemplateError> {
        let tokens = tokenize::tokenize(template, &self.syntax)?;
        let nodes = parse(tokens)?;
        self.check_filters(&nodes)?;
        Ok(nodes)
    }

    fn check_filters(&self, nodes: &[Node]) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Placeholder { expr, line } => {
                    if let Some(name) = expr.filters.iter().find(|f| !self.filters.contains(f)) {
                        return Err(TemplateError::UnknownFilter {
                            name: name.clone(),
                            line: *line,
                        });
                    }
                }
                Node::Each { body, .. } => self.check_filters(body)?,
                Node::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.check_filters(then_branch)?;
                    self.check_filters(else_branch)?;
                }
            }
        }
        Ok(())
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        context: &TemplateContext,
        output: &mut String,
        start: Instant,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            check_timeout(start)?;
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Placeholder { expr, line } => {
                    self.process_placeholder(expr, *line, context, output)?
                }
                Node::Each {
                    key,
                    var_name,
                    body,
                    line,
                } => self.process_each_loop(key, var_name, body, *line, context, output, start)?,
                Node::If {
                    key,
                    negate,
                    then_branch,
                    else_branch,
                } => {
                    let truthy = is_truthy(resolve_key(context.data(), key)) != *negate;
                    let branch = if truthy { then_branch } else { else_branch };
                    self.render_nodes(branch, context, output, start)?;
                }
            }
        }
        Ok(())
    }

    /// Render the loop body once per array item
    #[allow(clippy::too_many_arguments)]
    fn process_each_loop(
        &self,
        key: &str,
        var_name: &str,
        body: &[Node],
        line: usize,
        context: &TemplateContext,
        output: &mut String,
        start: Instant,
    ) -> Result<(), TemplateError> {
        let items = resolve_array(context.data(), key, line)?;
        let len = items.len();
        for (index, item) in items.iter().enumerate() {
            let loop_context =
                create_loop_context(context.data(), var_name, item.clone(), LoopInfo { index, len });
            self.render_nodes(body, &loop_context, output, start)?;
        }
        Ok(())
    }

    /// Process a placeholder ((key | filter))
    fn process_placeholder(
        &self,
        expr: &Expr,
        line: usize,
        context: &TemplateContext,
        output: &mut String,
    ) -> Result<(), TemplateError> {
        let value =
            resolve_key(context.data(), &expr.key).ok_or_else(|| TemplateError::UndefinedKey {
                key: expr.key.clone(),
                line,
            })?;

        let mut text = stringify_value(value, &expr.key)?;
        for name in self.pipeline(expr) {
            let filter = self
                .filters
                .get(name)
                .ok_or_else(|| TemplateError::UnknownFilter {
                    name: name.to_string(),
                    line,
                })?;
            text = filter(&text);
        }
        output.push_str(&text);
        Ok(())
    }

    /// Filters to apply, with `latex` prepended in auto mode
    fn pipeline<'a>(&self, expr: &'a Expr) -> Vec<&'a str> {
        let explicit = expr.filters.iter().map(String::as_str);
        let opted_out = expr.filters.iter().any(|f| f == RAW || f == LATEX);
        if self.escaping == Escaping::Auto && !opted_out {
            std::iter::once(LATEX).chain(explicit).collect()
        } else {
            explicit.collect()
        }
    }
}

/// Resolve an array value from context
fn resolve_array<'a>(
    data: &'a Value,
    key: &str,
    line: usize,
) -> Result<&'a Vec<Value>, TemplateError> {
    let array = resolve_key(data, key).ok_or_else(|| TemplateError::UndefinedKey {
        key: key.to_string(),
        line,
    })?;

    array
        .as_array()
        .ok_or_else(|| TemplateError::MalformedSyntax {
            message: format!("Key '{}' is not an array", key),
            line,
        })
}

/// Convenience function to render a template with a default engine
pub fn render(template: &str, context: &TemplateContext) -> Result<String, TemplateError> {
    TemplateEngine::new().render(template, context)
}

#[cfg(test)]
mod tests;
