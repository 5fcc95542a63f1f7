//! Output module for presenting run outcomes
//!
//! This module handles:
//! - Formatting an outcome as human-readable markdown-style text
//! - Serializing an outcome as JSON for scripting

mod report;

pub use report::{format_json, format_text};
