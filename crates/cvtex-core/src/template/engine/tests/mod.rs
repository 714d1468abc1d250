//! Tests for template engine
//!
//! Organized into focused submodules by concern.

use super::*;

// Test helper functions
mod helpers;

// Tokenizer tests
mod tokenize;

// Rendering tests
mod render_basic;
