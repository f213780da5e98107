//! In-memory document: the element tree the projector writes into.
//!
//! This is a deliberately small DOM stand-in. Elements live in an arena and are
//! addressed by [`NodeId`]; elements with an `id` attribute are also indexed by
//! it. Every mutation can be recorded together with its [`MutationOrigin`] so
//! a re-sync scheduler can tell the projector's own writes apart from external
//! ones.
//!
//! - [`template`] – default container markup and XHTML template parsing
//! - [`html`] – HTML serialisation

pub mod html;
pub mod template;

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use indexmap::{IndexMap, IndexSet};

use crate::error::CoreError;

/// Index of an element in its [`Document`].
pub type NodeId = usize;

/// Axis-aligned layout box in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
    pub fn left(&self) -> f32 {
        self.x
    }
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: Option<String>,
    pub tag: String,
    pub classes: IndexSet<String>,
    pub text: String,
    pub attrs: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub rect: Option<Rect>,
}

impl Element {
    fn new(tag: &str, id: Option<&str>, parent: Option<NodeId>) -> Self {
        Self {
            id: id.map(str::to_string),
            tag: tag.to_string(),
            classes: IndexSet::new(),
            text: String::new(),
            attrs: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
            parent,
            rect: None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn style(&self, prop: &str) -> Option<&str> {
        self.style.get(prop).map(String::as_str)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// What kind of change a [`Mutation`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Text,
    Class,
    Style,
    Attribute,
    ChildList,
}

/// Who made a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationOrigin {
    /// Writes performed by the projector while projecting or re-applying state.
    Projector,
    /// Anything else (front-end code, speech highlighting, user scripts).
    #[default]
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub target: NodeId,
    pub kind: MutationKind,
    pub origin: MutationOrigin,
}

/// Visible area used to clamp positioned regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
    by_id: HashMap<String, NodeId>,
    root: NodeId,
    viewport: Viewport,
    observing: bool,
    origin: MutationOrigin,
    mutations: Vec<Mutation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new("body")
    }
}

impl Document {
    /// Empty document with a single root element.
    pub fn new(root_tag: &str) -> Self {
        Self {
            elements: vec![Element::new(root_tag, None, None)],
            by_id: HashMap::new(),
            root: 0,
            viewport: Viewport::default(),
            observing: false,
            origin: MutationOrigin::External,
            mutations: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // ── structure ──────────────────────────────────────────────────────────

    /// Append a new element under `parent`. Ids must be unique.
    pub fn create_element(&mut self, parent: NodeId, tag: &str, id: Option<&str>) -> Result<NodeId> {
        if parent >= self.elements.len() {
            bail!("parent node {} does not exist", parent);
        }
        if let Some(id) = id {
            if self.by_id.contains_key(id) {
                bail!("duplicate element id '{}'", id);
            }
        }
        let idx = self.elements.len();
        self.elements.push(Element::new(tag, id, Some(parent)));
        if let Some(id) = id {
            self.by_id.insert(id.to_string(), idx);
        }
        self.elements[parent].children.push(idx);
        self.record(parent, MutationKind::ChildList);
        Ok(idx)
    }

    pub fn get(&self, node: NodeId) -> &Element {
        &self.elements[node]
    }

    /// Look up an element by id.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.find(id).map(|n| &self.elements[n])
    }

    /// Look up an element by id, reporting a [`CoreError::MissingElement`].
    pub fn require(&self, id: &str) -> std::result::Result<NodeId, CoreError> {
        self.find(id).ok_or_else(|| CoreError::MissingElement {
            element_id: id.to_string(),
        })
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.elements[node].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.elements[node].parent
    }

    /// Ids of the direct children that have one, in child order.
    pub fn child_ids(&self, node: NodeId) -> Vec<&str> {
        self.elements[node]
            .children
            .iter()
            .filter_map(|&c| self.elements[c].id.as_deref())
            .collect()
    }

    /// Reorder the children of `parent`. `order` must be a permutation of them.
    pub fn reorder_children(&mut self, parent: NodeId, order: &[NodeId]) -> Result<()> {
        let current = &self.elements[parent].children;
        if current.as_slice() == order {
            return Ok(());
        }
        let mut a = current.clone();
        let mut b = order.to_vec();
        a.sort_unstable();
        b.sort_unstable();
        if a != b {
            return Err(anyhow!("new child order of node {} is not a permutation", parent));
        }
        self.elements[parent].children = order.to_vec();
        self.record(parent, MutationKind::ChildList);
        Ok(())
    }

    // ── content ────────────────────────────────────────────────────────────

    /// Set text content; returns whether anything changed.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> bool {
        if self.elements[node].text == text {
            return false;
        }
        self.elements[node].text = text.to_string();
        self.record(node, MutationKind::Text);
        true
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> bool {
        if !self.elements[node].classes.insert(class.to_string()) {
            return false;
        }
        self.record(node, MutationKind::Class);
        true
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> bool {
        if !self.elements[node].classes.shift_remove(class) {
            return false;
        }
        self.record(node, MutationKind::Class);
        true
    }

    /// Add or remove `class` depending on `on`.
    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) -> bool {
        if on {
            self.add_class(node, class)
        } else {
            self.remove_class(node, class)
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements[node].has_class(class)
    }

    pub fn set_style(&mut self, node: NodeId, prop: &str, value: &str) -> bool {
        if self.elements[node].style(prop) == Some(value) {
            return false;
        }
        self.elements[node]
            .style
            .insert(prop.to_string(), value.to_string());
        self.record(node, MutationKind::Style);
        true
    }

    pub fn remove_style(&mut self, node: NodeId, prop: &str) -> bool {
        if self.elements[node].style.shift_remove(prop).is_none() {
            return false;
        }
        self.record(node, MutationKind::Style);
        true
    }

    pub fn style(&self, node: NodeId, prop: &str) -> Option<&str> {
        self.elements[node].style(prop)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        if self.elements[node].attr(name) == Some(value) {
            return false;
        }
        self.elements[node]
            .attrs
            .insert(name.to_string(), value.to_string());
        self.record(node, MutationKind::Attribute);
        true
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> bool {
        if self.elements[node].attrs.shift_remove(name).is_none() {
            return false;
        }
        self.record(node, MutationKind::Attribute);
        true
    }

    /// Layout boxes are not content; setting one is never recorded.
    pub fn set_rect(&mut self, node: NodeId, rect: Option<Rect>) {
        self.elements[node].rect = rect;
    }

    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.elements[node].rect
    }

    /// False when the element or any ancestor has `display: none`.
    pub fn is_rendered(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.elements[n].style("display") == Some("none") {
                return false;
            }
            cur = self.elements[n].parent;
        }
        true
    }

    // ── mutation observation ───────────────────────────────────────────────

    /// Start or stop recording mutations. Stopping drops pending records.
    pub fn observe(&mut self, on: bool) {
        self.observing = on;
        if !on {
            self.mutations.clear();
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Run `f` with every mutation attributed to `origin`.
    pub fn with_origin<R>(&mut self, origin: MutationOrigin, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.origin, origin);
        let out = f(self);
        self.origin = previous;
        out
    }

    /// Drain recorded mutations.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        if self.observing {
            self.mutations.push(Mutation {
                target,
                kind,
                origin: self.origin,
            });
        }
    }
}
