//! Basic rendering tests for template engine

use super::helpers::{cv_context, simple_context};
use super::*;

#[test]
fn test_render_simple_placeholder() {
    let context = simple_context();
    let result = render("Title: ((title))", &context).unwrap();
    assert_eq!(result, "Title: My Title");
}

#[test]
fn test_render_placeholder_with_spaces() {
    let context = simple_context();
    let result = render("Title: ((  title  ))", &context).unwrap();
    assert_eq!(result, "Title: My Title");
}

#[test]
fn test_render_nested_key() {
    let context = cv_context();
    let result = render("First: (( right_blocks.0.heading ))", &context).unwrap();
    assert_eq!(result, "First: Skills");
}

#[test]
fn test_render_scalar_values() {
    let context = simple_context();
    let result = render("(( count )) / (( price )) / (( enabled ))", &context).unwrap();
    assert_eq!(result, "42 / 9.99 / true");
}

#[test]
fn test_render_null_is_empty() {
    let context = simple_context();
    let result = render("[(( nothing ))]", &context).unwrap();
    assert_eq!(result, "[]");
}

#[test]
fn test_tex_control_sequences_pass_through() {
    // Backslashes and braces in the template are TeX, never template syntax
    let context = cv_context();
    let template = r"\section*{\textbf{(( first_name )) (( last_name ))}} \\ {{literal}}";
    let result = render(template, &context).unwrap();
    assert_eq!(
        result,
        r"\section*{\textbf{Chief Chiefsson}} \\ {{literal}}"
    );
}

#[test]
fn test_single_parenthesis_is_text() {
    let context = simple_context();
    let result = render(r"f(x) = (a)(b) and \( x \)", &context).unwrap();
    assert_eq!(result, r"f(x) = (a)(b) and \( x \)");
}

#[test]
fn test_render_no_placeholders() {
    let context = simple_context();
    let template = "This is plain text with no placeholders.";
    let result = render(template, &context).unwrap();
    assert_eq!(result, template);
}

#[test]
fn test_custom_syntax() {
    let engine = TemplateEngine::new().with_syntax(Syntax {
        variable_start: "<<".to_string(),
        variable_end: ">>".to_string(),
        block_start: "<%".to_string(),
        block_end: "%>".to_string(),
        comment_start: "<#".to_string(),
        comment_end: "#>".to_string(),
    })
    .unwrap();
    let context = cv_context();
    let template = "<% if summary_enabled %>\n<< first_name >> ((ignored))\n<% /if %>\n";
    let result = engine.render(template, &context).unwrap();
    assert_eq!(result, "Chief ((ignored))\n");
}

#[test]
fn test_engine_refuses_backslash_delimiters() {
    let err = TemplateEngine::new()
        .with_syntax(Syntax {
            variable_start: r"\VAR{".to_string(),
            variable_end: "}".to_string(),
            ..Syntax::default()
        })
        .unwrap_err();
    match err {
        TemplateError::InvalidSyntax { message } => assert!(message.contains("backslash")),
        other => panic!("Expected InvalidSyntax error, got {other:?}"),
    }
}
