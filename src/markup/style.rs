//! Markup dialects for `TreeMarkup`

/// How single nodes are written. The bottom-up traversal in `TreeMarkup` is
/// the same for every dialect.
pub trait MarkupStyle {
    /// Indentation written once per level.
    fn indent_unit(&self) -> &str {
        "    "
    }

    fn indent(&self, level: usize) -> String {
        self.indent_unit().repeat(level)
    }

    /// A node without children.
    fn render_leaf(&self, label: &str, level: usize) -> String;

    /// Opening line of a node with children.
    fn open_tag(&self, label: &str, level: usize) -> String;

    /// Closing line of a node with children, if the dialect has one.
    fn close_tag(&self, label: &str, level: usize) -> Option<String>;

    fn join_children(&self, children: &[String]) -> String {
        children.join("\n")
    }

    /// A node with children, given its children's finished markup.
    fn render_branch(&self, label: &str, level: usize, children: &[String]) -> String {
        let mut out = self.open_tag(label, level);
        if !children.is_empty() {
            out.push('\n');
            out.push_str(&self.join_children(children));
        }
        if let Some(close) = self.close_tag(label, level) {
            out.push('\n');
            out.push_str(&close);
        }
        out
    }
}

/// `{name` ... `}` blocks; leaves are `{name}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceStyle;

impl MarkupStyle for BraceStyle {
    fn render_leaf(&self, label: &str, level: usize) -> String {
        format!("{}{{{}}}", self.indent(level), label)
    }

    fn open_tag(&self, label: &str, level: usize) -> String {
        format!("{}{{{}", self.indent(level), label)
    }

    fn close_tag(&self, _label: &str, level: usize) -> Option<String> {
        Some(format!("{}}}", self.indent(level)))
    }
}

/// `<node name="...">` elements; leaves are self-closing.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlStyle;

impl MarkupStyle for XmlStyle {
    fn render_leaf(&self, label: &str, level: usize) -> String {
        format!("{}<node name=\"{}\"/>", self.indent(level), escape_xml(label))
    }

    fn open_tag(&self, label: &str, level: usize) -> String {
        format!("{}<node name=\"{}\">", self.indent(level), escape_xml(label))
    }

    fn close_tag(&self, _label: &str, level: usize) -> Option<String> {
        Some(format!("{}</node>", self.indent(level)))
    }
}

/// Nested bullet list: branches in bold, leaves in backticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownStyle;

impl MarkupStyle for MarkdownStyle {
    fn render_leaf(&self, label: &str, level: usize) -> String {
        format!("{}- `{}`", self.indent(level), label)
    }

    fn open_tag(&self, label: &str, level: usize) -> String {
        format!("{}- **{}**", self.indent(level), label)
    }

    fn close_tag(&self, _label: &str, _level: usize) -> Option<String> {
        None
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
