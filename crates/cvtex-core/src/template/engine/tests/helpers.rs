//! Shared test helpers for template engine tests

use crate::template::engine::TemplateContext;
use serde_json::json;

/// Create a simple test context with basic scalar values
pub(super) fn simple_context() -> TemplateContext {
    TemplateContext::new(json!({
        "title": "My Title",
        "count": 42,
        "price": 9.99,
        "enabled": true,
        "nothing": null,
        "profile_text": "50% theory & 50% practice. R&D, foo_bar, $100.",
    }))
}

/// Create a nested test context shaped like a CV record
pub(super) fn cv_context() -> TemplateContext {
    TemplateContext::new(json!({
        "first_name": "Chief",
        "last_name": "Chiefsson",
        "summary_enabled": true,
        "blank_last_page": false,
        "right_blocks": [
            {"heading": "Skills", "body": "Python, Matlab"},
            {"heading": "Keywords", "body": "R&D, CFD"},
        ],
        "employment_rows": [
            {"year": "2026", "org": "CHIEF CONSULTING AB"},
            {"year": "2022-2025", "org": "POC SPORTS"},
        ],
        "experience": [],
        "languages_block": "Swedish -- Mother tongue\nEnglish -- Fluent",
    }))
}
