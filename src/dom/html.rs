//! Serialise a [`Document`] to indented HTML.

use super::{Document, NodeId};

const VOID_TAGS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

/// Render the whole document. Text and attribute values are escaped.
pub fn render_html(doc: &Document) -> String {
    let mut out = String::with_capacity(8192);
    write_node(&mut out, doc, doc.root(), 0);
    out
}

/// Render a single element subtree.
pub fn render_subtree(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(&mut out, doc, node, 0);
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

fn write_node(out: &mut String, doc: &Document, node: NodeId, level: usize) {
    let el = doc.get(node);
    indent(out, level);
    out.push('<');
    out.push_str(&el.tag);
    if let Some(id) = &el.id {
        write_attr(out, "id", id);
    }
    if !el.classes.is_empty() {
        let joined = el.classes.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
        write_attr(out, "class", &joined);
    }
    if !el.style.is_empty() {
        let css = el
            .style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        write_attr(out, "style", &css);
    }
    for (k, v) in &el.attrs {
        write_attr(out, k, v);
    }
    if VOID_TAGS.contains(&el.tag.as_str()) {
        out.push_str(">\n");
        return;
    }
    out.push('>');
    if el.children.is_empty() {
        out.push_str(&html_escape::encode_text(&el.text));
        out.push_str("</");
        out.push_str(&el.tag);
        out.push_str(">\n");
        return;
    }
    out.push('\n');
    if !el.text.is_empty() {
        indent(out, level + 1);
        out.push_str(&html_escape::encode_text(&el.text));
        out.push('\n');
    }
    for &child in &el.children {
        write_node(out, doc, child, level + 1);
    }
    indent(out, level);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push_str(">\n");
}
