//! Tree formatting and display
//!
//! This module provides formatters for outputting trees:
//! - Console output with colors
//! - JSON output
//!
//! Nested markup (braces, XML, markdown) lives in `crate::markup`.
//!
//! # Module Structure
//!
//! - `config` - Output configuration types
//! - `utils` - Shared helpers (prefixes, size formatting)
//! - `tree` - Buffered tree formatter
//! - `json` - JSON output

mod config;
mod json;
mod tree;
mod utils;

pub use config::OutputConfig;
pub use json::{print_flat_json, print_json};
pub use tree::TreeFormatter;
pub use utils::{continuation_prefix, format_size};
