//! Output configuration types

/// Configuration for output formatting.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
    /// Append the `total_size` (or `size`) attribute to each line.
    pub show_size: bool,
    /// Deepest level drawn; deeper nodes are folded away.
    pub max_level: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            show_size: false,
            max_level: None,
        }
    }
}
