//! Tree formatter for buffered output
//!
//! Draws a `Tree` with box-drawing connectors, root first. The walk keeps an
//! explicit stack so depth is bounded only by memory.

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::tree::{NodeId, Tree, TreeNode};

use super::config::OutputConfig;
use super::utils::{connector, continuation_prefix, format_size, node_size};

/// One line of drawn output before it is written anywhere.
struct Line<'a> {
    prefix: String,
    connector: &'static str,
    node: &'a TreeNode,
}

/// Formatter for buffered tree output.
pub struct TreeFormatter {
    config: OutputConfig,
}

impl TreeFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, tree: &Tree) -> String {
        let mut output = String::new();
        let lines = self.lines(tree);
        for line in &lines {
            output.push_str(&line.prefix);
            output.push_str(line.connector);
            output.push_str(&line.node.name);
            output.push_str(&self.size_suffix(line.node));
            output.push('\n');
        }
        output.push_str(&summary(&lines));
        output
    }

    pub fn print(&self, tree: &Tree) -> io::Result<()> {
        let choice = if self.config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(choice);
        let lines = self.lines(tree);
        for line in &lines {
            write!(stdout, "{}{}", line.prefix, line.connector)?;
            if line.node.is_leaf {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::White)))?;
            } else {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
            }
            write!(stdout, "{}", line.node.name)?;
            stdout.reset()?;

            let suffix = self.size_suffix(line.node);
            if !suffix.is_empty() {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                write!(stdout, "{}", suffix)?;
                stdout.reset()?;
            }
            writeln!(stdout)?;
        }
        write!(stdout, "{}", summary(&lines))?;
        Ok(())
    }

    /// Collect drawn lines in pre-order, honoring `max_level`.
    fn lines<'a>(&self, tree: &'a Tree) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        // (id, prefix, is_last, is_root)
        let mut stack: Vec<(&'a NodeId, String, bool, bool)> =
            vec![(tree.root_id(), String::new(), true, true)];

        while let Some((id, prefix, is_last, is_root)) = stack.pop() {
            let Ok(node) = tree.get_node(id) else {
                continue;
            };
            let child_prefix = if is_root {
                String::new()
            } else {
                continuation_prefix(&prefix, is_last)
            };
            lines.push(Line {
                prefix,
                connector: if is_root { "" } else { connector(is_last) },
                node,
            });

            if self.config.max_level.is_some_and(|max| node.level >= max) {
                continue;
            }
            let count = node.children.len();
            for (i, child) in node.children.iter().enumerate().rev() {
                stack.push((child, child_prefix.clone(), i + 1 == count, false));
            }
        }
        lines
    }

    fn size_suffix(&self, node: &TreeNode) -> String {
        if !self.config.show_size {
            return String::new();
        }
        node_size(node)
            .map(|size| format!("  [{}]", format_size(size)))
            .unwrap_or_default()
    }
}

fn summary(lines: &[Line<'_>]) -> String {
    let leaves = lines.iter().filter(|line| line.node.is_leaf).count();
    format!("\n{} nodes, {} leaves\n", lines.len(), leaves)
}
