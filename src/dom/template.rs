//! Container markup: the standard slot grid and XHTML template parsing.
//!
//! The projector never creates elements; it only fills the containers built
//! here. Custom markup may omit containers, in which case projection skips
//! them and logs a missing-element error.

use anyhow::{Context, Result};
use roxmltree::{Document as XmlDocument, Node};

use super::{Document, NodeId};
use crate::model::{Channel, SlotName};
use crate::projector::naming::{
    self, COLLAPSED_CLASS, NOTICE_ID, REGION_CLASS, REGION_ROW_ID, SLOT_CLASS, SLOT_ROW_ID,
    SUBSLOT_CLASS, TOP_DISPLAY_ID, TOP_DISPLAY_TEXT_ID,
};

/// Build the standard document: notice, slot row (with the top display
/// banner), one container per slot and one collapsed region per slot holding
/// ten subslot containers.
pub fn build_default_document() -> Result<Document> {
    let mut doc = Document::new("body");
    let root = doc.root();

    let notice = doc.create_element(root, "div", Some(NOTICE_ID))?;
    doc.add_class(notice, "notice");
    doc.set_style(notice, "display", "none");

    let row = doc.create_element(root, "div", Some(SLOT_ROW_ID))?;
    doc.add_class(row, "slot-row");

    let banner = doc.create_element(row, "div", Some(TOP_DISPLAY_ID))?;
    doc.add_class(banner, "top-display");
    doc.set_style(banner, "display", "none");
    let banner_text = doc.create_element(banner, "span", Some(TOP_DISPLAY_TEXT_ID))?;
    doc.add_class(banner_text, "top-display-text");

    for slot in SlotName::ALL {
        let id = naming::slot_container_id(slot);
        let c = doc.create_element(row, "div", Some(&id))?;
        doc.add_class(c, SLOT_CLASS);
        doc.set_attr(c, "data-slot", slot.as_str());
        add_channel_parts(&mut doc, c, &id)?;
        let toggle_id = naming::toggle_button_id(slot);
        let t = doc.create_element(c, "button", Some(&toggle_id))?;
        doc.add_class(t, "subslot-toggle");
        doc.set_attr(t, "aria-expanded", "false");
        doc.set_attr(t, "data-parent", slot.as_str());
        doc.set_text(t, "▼");
    }

    let area = doc.create_element(root, "div", Some(REGION_ROW_ID))?;
    doc.add_class(area, "subslot-area");
    for parent in SlotName::ALL {
        let region_id = naming::subslot_region_id(parent);
        let region = doc.create_element(area, "div", Some(&region_id))?;
        doc.add_class(region, REGION_CLASS);
        doc.add_class(region, COLLAPSED_CLASS);
        doc.set_attr(region, "data-parent", parent.as_str());
        doc.set_style(region, "display", "none");
        for name in SlotName::ALL {
            let id = naming::subslot_container_id(parent, name);
            let c = doc.create_element(region, "div", Some(&id))?;
            doc.add_class(c, SUBSLOT_CLASS);
            doc.set_attr(c, "data-slot", name.as_str());
            add_channel_parts(&mut doc, c, &id)?;
        }
    }
    Ok(doc)
}

fn add_channel_parts(doc: &mut Document, container: NodeId, container_id: &str) -> Result<()> {
    for channel in [Channel::Image, Channel::Text, Channel::AuxText] {
        let part_id = naming::channel_part_id(container_id, channel);
        let tag = if channel == Channel::Image { "img" } else { "div" };
        let part = doc.create_element(container, tag, Some(&part_id))?;
        doc.add_class(part, &format!("slot-{}", naming::channel_part(channel)));
    }
    Ok(())
}

/// Parse container markup written as XHTML.
///
/// The root element becomes the document root. `id`, `class` and `style`
/// attributes are split out; everything else is kept as a plain attribute.
/// Text directly inside an element (trimmed) becomes its text content.
pub fn parse_template(xhtml: &str) -> Result<Document> {
    let xml = XmlDocument::parse(xhtml).context("Failed to parse template markup")?;
    let root_node = xml.root_element();
    let mut doc = Document::new(root_node.tag_name().name());
    let root = doc.root();
    apply_node_attrs(&mut doc, root, root_node);
    for child in root_node.children().filter(|n| n.is_element()) {
        append_node(&mut doc, root, child)?;
    }
    Ok(doc)
}

fn append_node(doc: &mut Document, parent: NodeId, node: Node<'_, '_>) -> Result<()> {
    let id = node.attribute("id");
    let idx = doc
        .create_element(parent, node.tag_name().name(), id)
        .with_context(|| format!("In template element <{}>", node.tag_name().name()))?;
    apply_node_attrs(doc, idx, node);
    for child in node.children().filter(|n| n.is_element()) {
        append_node(doc, idx, child)?;
    }
    Ok(())
}

fn apply_node_attrs(doc: &mut Document, idx: NodeId, node: Node<'_, '_>) {
    for attr in node.attributes() {
        match attr.name() {
            "id" => {}
            "class" => {
                for class in attr.value().split_whitespace() {
                    doc.add_class(idx, class);
                }
            }
            "style" => {
                for decl in attr.value().split(';') {
                    if let Some((prop, value)) = decl.split_once(':') {
                        let (prop, value) = (prop.trim(), value.trim());
                        if !prop.is_empty() {
                            doc.set_style(idx, prop, value);
                        }
                    }
                }
            }
            name => {
                doc.set_attr(idx, name, attr.value());
            }
        }
    }
    let text: String = node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    if !text.is_empty() {
        doc.set_text(idx, text);
    }
}
