//! In-Memory Backend
//!
//! A complete display tree kept in a slot map. It follows the usual browser
//! attribute conventions:
//!
//! - `onXxx` attributes holding a handler become listeners keyed by the
//!   lowercased event name (`onClick` → `click`).
//! - `className` is split on whitespace into a class list.
//! - `style` holds a property map that replaces the previous one.
//! - Everything else is stored as a string attribute.
//!
//! Every structural or attribute change is appended to a mutation log, which
//! makes the backend useful for asserting exactly what a commit did. Removed
//! nodes are freed along with their descendants; the log may still name them.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;
use slotmap::{new_key_type, SlotMap};
use tracing::warn;

use super::Backend;
use crate::element::{AttrValue, AttributePatch, Element, Event, EventHandler};
use crate::error::BackendError;

new_key_type! {
    /// Handle of a node in a [`MemoryBackend`].
    pub struct DomNodeId;
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum DomNodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        classes: Vec<String>,
        style: IndexMap<String, String>,
        listeners: IndexMap<String, EventHandler>,
    },
    Text(String),
}

/// A node plus its tree links.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: DomNodeKind,
    pub parent: Option<DomNodeId>,
    pub children: Vec<DomNodeId>,
}

/// One recorded backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(DomNodeId),
    Patch {
        node: DomNodeId,
        set: Vec<String>,
        removed: Vec<String>,
    },
    SetText {
        node: DomNodeId,
        text: String,
    },
    Insert {
        parent: DomNodeId,
        node: DomNodeId,
        anchor: DomNodeId,
    },
    Append {
        parent: DomNodeId,
        node: DomNodeId,
    },
    Remove {
        parent: DomNodeId,
        node: DomNodeId,
    },
}

impl Mutation {
    /// Whether this mutation changes tree structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::Insert { .. } | Mutation::Append { .. } | Mutation::Remove { .. }
        )
    }
}

/// Serializable view of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomSnapshot {
    Text(String),
    Element {
        tag: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        attributes: Vec<(String, String)>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        classes: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        style: Vec<(String, String)>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        listeners: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        children: Vec<DomSnapshot>,
    },
}

/// Reference backend holding the display tree in memory.
pub struct MemoryBackend {
    nodes: SlotMap<DomNodeId, DomNode>,
    root: DomNodeId,
    log: Vec<Mutation>,
}

impl MemoryBackend {
    /// A backend with a single empty container node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(DomNode {
            kind: element_kind("#root"),
            parent: None,
            children: Vec::new(),
        });
        Self {
            nodes,
            root,
            log: Vec::new(),
        }
    }

    /// The container node renders are mounted into.
    pub fn container(&self) -> DomNodeId {
        self.root
    }

    /// Get a reference to a stored node.
    pub fn node(&self, id: DomNodeId) -> Option<&DomNode> {
        self.nodes.get(id)
    }

    /// Number of stored nodes, container included. Removed nodes are freed,
    /// so this only counts nodes that are attached or not yet inserted.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Child ids of `id`, empty for unknown or text nodes.
    pub fn children(&self, id: DomNodeId) -> &[DomNodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Tag of an element node.
    pub fn tag(&self, id: DomNodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            DomNodeKind::Element { tag, .. } => Some(tag),
            DomNodeKind::Text(_) => None,
        }
    }

    /// Content of a text node.
    pub fn text(&self, id: DomNodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            DomNodeKind::Text(text) => Some(text),
            DomNodeKind::Element { .. } => None,
        }
    }

    /// String attribute of an element node.
    pub fn attribute(&self, id: DomNodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            DomNodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            DomNodeKind::Text(_) => None,
        }
    }

    /// Class list of an element node.
    pub fn classes(&self, id: DomNodeId) -> &[String] {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(DomNodeKind::Element { classes, .. }) => classes,
            _ => &[],
        }
    }

    /// Inline style property of an element node.
    pub fn style(&self, id: DomNodeId, property: &str) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            DomNodeKind::Element { style, .. } => style.get(property).map(String::as_str),
            DomNodeKind::Text(_) => None,
        }
    }

    /// Whether a listener for `event` is registered on `id`.
    pub fn has_listener(&self, id: DomNodeId, event: &str) -> bool {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(DomNodeKind::Element { listeners, .. }) => listeners.contains_key(event),
            _ => false,
        }
    }

    /// Whether the node is reachable from the container.
    pub fn is_attached(&self, id: DomNodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|node| node.parent);
        }
        false
    }

    /// Attached element nodes with the given tag, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<DomNodeId> {
        let mut found = Vec::new();
        self.walk(self.root, &mut |id, node| {
            if matches!(&node.kind, DomNodeKind::Element { tag: t, .. } if t == tag) {
                found.push(id);
            }
        });
        found
    }

    fn walk(&self, id: DomNodeId, visit: &mut dyn FnMut(DomNodeId, &DomNode)) {
        if let Some(node) = self.nodes.get(id) {
            visit(id, node);
            for child in &node.children {
                self.walk(*child, visit);
            }
        }
    }

    /// Invoke the listener registered for `event.name` on `id`. Returns
    /// whether a listener ran.
    pub fn dispatch(&self, id: DomNodeId, event: &Event) -> bool {
        let handler = match self.nodes.get(id).map(|node| &node.kind) {
            Some(DomNodeKind::Element { listeners, .. }) => listeners.get(&event.name).cloned(),
            _ => None,
        };
        match handler {
            Some(handler) => {
                handler.call(event);
                true
            }
            None => false,
        }
    }

    /// Every mutation recorded so far.
    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    /// Drain the mutation log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    /// Serialize the container's children as markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: DomNodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            DomNodeKind::Text(text) => out.push_str(&escape(text)),
            DomNodeKind::Element {
                tag,
                attributes,
                classes,
                style,
                ..
            } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
                if !classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape(&classes.join(" ")));
                }
                if !style.is_empty() {
                    let css: Vec<String> = style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    let _ = write!(out, " style=\"{}\"", escape(&css.join("; ")));
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// Serializable snapshot of a subtree.
    pub fn snapshot(&self, id: DomNodeId) -> Option<DomSnapshot> {
        let node = self.nodes.get(id)?;
        Some(match &node.kind {
            DomNodeKind::Text(text) => DomSnapshot::Text(text.clone()),
            DomNodeKind::Element {
                tag,
                attributes,
                classes,
                style,
                listeners,
            } => DomSnapshot::Element {
                tag: tag.clone(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                classes: classes.clone(),
                style: style.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                listeners: listeners.keys().cloned().collect(),
                children: node
                    .children
                    .iter()
                    .filter_map(|child| self.snapshot(*child))
                    .collect(),
            },
        })
    }

    fn node_mut(&mut self, id: DomNodeId) -> Result<&mut DomNode, BackendError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| BackendError::UnknownNode(format!("{id:?}")))
    }

    fn ensure_container(&self, id: DomNodeId) -> Result<(), BackendError> {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(DomNodeKind::Element { .. }) => Ok(()),
            Some(DomNodeKind::Text(_)) => Err(BackendError::NotAContainer(format!("{id:?}"))),
            None => Err(BackendError::UnknownNode(format!("{id:?}"))),
        }
    }

    /// Unlink `node` from whatever parent it currently has.
    fn detach(&mut self, node: DomNodeId) -> Result<(), BackendError> {
        if let Some(parent) = self.node_mut(node)?.parent.take() {
            self.node_mut(parent)?.children.retain(|child| *child != node);
        }
        Ok(())
    }

    /// Drop a detached node and everything below it from the store.
    fn free(&mut self, node: DomNodeId) {
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                pending.extend(removed.children);
            }
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    type Node = DomNodeId;

    fn create_node(&mut self, element: &Element) -> Result<Option<DomNodeId>, BackendError> {
        let (kind, patch) = match element {
            Element::Empty => return Ok(None),
            Element::Text(text) => (DomNodeKind::Text(text.to_string()), None),
            Element::Native(native) => (
                element_kind(&native.tag),
                Some(AttributePatch::initial(&native.props)),
            ),
            Element::Component(_) | Element::List(_) => {
                return Err(BackendError::Unsupported(element.describe()))
            }
        };

        let id = self.nodes.insert(DomNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.log.push(Mutation::Create(id));

        if let Some(patch) = patch.filter(|patch| !patch.is_empty()) {
            apply_to_kind(&mut self.node_mut(id)?.kind, &patch);
        }
        Ok(Some(id))
    }

    fn apply_patch(&mut self, node: &DomNodeId, patch: &AttributePatch) -> Result<(), BackendError> {
        apply_to_kind(&mut self.node_mut(*node)?.kind, patch);
        self.log.push(Mutation::Patch {
            node: *node,
            set: patch.set.iter().map(|(name, _)| name.clone()).collect(),
            removed: patch.removed.clone(),
        });
        Ok(())
    }

    fn set_text(&mut self, node: &DomNodeId, text: &str) -> Result<(), BackendError> {
        match &mut self.node_mut(*node)?.kind {
            DomNodeKind::Text(content) => {
                *content = text.to_string();
            }
            DomNodeKind::Element { .. } => {
                return Err(BackendError::Unsupported(format!("set_text on element {node:?}")))
            }
        }
        self.log.push(Mutation::SetText {
            node: *node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn child_at(&self, parent: &DomNodeId, index: usize) -> Option<DomNodeId> {
        self.children(*parent).get(index).copied()
    }

    fn insert_before(
        &mut self,
        parent: &DomNodeId,
        node: &DomNodeId,
        anchor: &DomNodeId,
    ) -> Result<(), BackendError> {
        self.ensure_container(*parent)?;
        let position = self
            .children(*parent)
            .iter()
            .position(|child| child == anchor)
            .ok_or_else(|| BackendError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{anchor:?}"),
            })?;

        self.detach(*node)?;
        // detaching may have shifted the anchor if node was an earlier sibling
        let position = self
            .children(*parent)
            .iter()
            .position(|child| child == anchor)
            .unwrap_or(position);

        self.node_mut(*parent)?.children.insert(position, *node);
        self.node_mut(*node)?.parent = Some(*parent);
        self.log.push(Mutation::Insert {
            parent: *parent,
            node: *node,
            anchor: *anchor,
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &DomNodeId, node: &DomNodeId) -> Result<(), BackendError> {
        self.ensure_container(*parent)?;
        self.detach(*node)?;
        self.node_mut(*parent)?.children.push(*node);
        self.node_mut(*node)?.parent = Some(*parent);
        self.log.push(Mutation::Append {
            parent: *parent,
            node: *node,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &DomNodeId, node: &DomNodeId) -> Result<(), BackendError> {
        if self.nodes.get(*node).and_then(|n| n.parent) != Some(*parent) {
            return Err(BackendError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{node:?}"),
            });
        }
        self.detach(*node)?;
        self.free(*node);
        self.log.push(Mutation::Remove {
            parent: *parent,
            node: *node,
        });
        Ok(())
    }
}

fn element_kind(tag: &str) -> DomNodeKind {
    DomNodeKind::Element {
        tag: tag.to_string(),
        attributes: IndexMap::new(),
        classes: Vec::new(),
        style: IndexMap::new(),
        listeners: IndexMap::new(),
    }
}

fn apply_to_kind(kind: &mut DomNodeKind, patch: &AttributePatch) {
    let DomNodeKind::Element {
        attributes,
        classes,
        style,
        listeners,
        ..
    } = kind
    else {
        return;
    };

    for name in &patch.removed {
        if let Some(event) = event_name(name) {
            listeners.shift_remove(&event);
        } else if name == "className" {
            classes.clear();
        } else if name == "style" {
            style.clear();
        } else {
            attributes.shift_remove(name);
        }
    }

    for (name, value) in &patch.set {
        match (event_name(name), value) {
            (Some(event), AttrValue::Handler(handler)) => {
                listeners.insert(event, handler.clone());
            }
            (_, AttrValue::Style(map)) if name == "style" => {
                *style = map.clone();
            }
            (_, value) if name == "className" => {
                *classes = value
                    .to_text()
                    .map(|text| text.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
            }
            (_, value) => match value.to_text() {
                Some(text) => {
                    attributes.insert(name.clone(), text);
                }
                None => warn!(attribute = %name, "ignoring attribute with no text form"),
            },
        }
    }
}

/// `onClick` → `click`. Names that are just `on` or continue in lowercase
/// (`one`, `online`) are ordinary attributes.
fn event_name(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix("on")?;
    let first = rest.chars().next()?;
    first.is_uppercase().then(|| rest.to_lowercase())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    fn create(backend: &mut MemoryBackend, element: Element) -> DomNodeId {
        backend.create_node(&element).unwrap().unwrap()
    }

    #[test]
    fn empty_elements_have_no_node() {
        let mut backend = MemoryBackend::new();
        assert!(backend.create_node(&Element::Empty).unwrap().is_none());
        assert!(backend.mutations().is_empty());
    }

    #[test]
    fn native_nodes_get_initial_attributes() {
        let mut backend = MemoryBackend::new();
        let node = create(
            &mut backend,
            Element::native(
                "p",
                Props::new()
                    .with("className", "lead  red")
                    .with("href", "/x")
                    .style([("color", "red")])
                    .on("click", |_| {}),
            ),
        );

        assert_eq!(backend.tag(node), Some("p"));
        assert_eq!(backend.classes(node), ["lead", "red"]);
        assert_eq!(backend.attribute(node, "href"), Some("/x"));
        assert_eq!(backend.style(node, "color"), Some("red"));
        assert!(backend.has_listener(node, "click"));
        assert!(!backend.is_attached(node));
    }

    #[test]
    fn patch_removes_style_and_keeps_unrelated_attributes() {
        let mut backend = MemoryBackend::new();
        let old = Props::new()
            .with("className", "x")
            .with("id", "main")
            .style([("color", "red")]);
        let new = Props::new().with("className", "y").with("id", "main");
        let node = create(&mut backend, Element::native("div", old.clone()));

        backend
            .apply_patch(&node, &AttributePatch::between(&old, &new))
            .unwrap();

        assert_eq!(backend.classes(node), ["y"]);
        assert_eq!(backend.style(node, "color"), None);
        assert_eq!(backend.attribute(node, "id"), Some("main"));
    }

    #[test]
    fn insert_before_and_remove() {
        let mut backend = MemoryBackend::new();
        let root = backend.container();
        let a = create(&mut backend, Element::text("a"));
        let b = create(&mut backend, Element::text("b"));
        let c = create(&mut backend, Element::text("c"));

        backend.append_child(&root, &a).unwrap();
        backend.append_child(&root, &c).unwrap();
        backend.insert_before(&root, &b, &c).unwrap();
        assert_eq!(backend.to_html(), "abc");
        assert_eq!(backend.child_at(&root, 1), Some(b));

        backend.remove_child(&root, &a).unwrap();
        assert_eq!(backend.to_html(), "bc");
        assert!(!backend.is_attached(a));
    }

    #[test]
    fn removal_frees_the_whole_subtree() {
        let mut backend = MemoryBackend::new();
        let root = backend.container();
        let list = create(&mut backend, Element::native("ul", Props::new()));
        let item = create(&mut backend, Element::native("li", Props::new()));
        let text = create(&mut backend, Element::text("x"));
        backend.append_child(&item, &text).unwrap();
        backend.append_child(&list, &item).unwrap();
        backend.append_child(&root, &list).unwrap();
        assert_eq!(backend.node_count(), 4);

        backend.remove_child(&root, &list).unwrap();

        assert!(backend.node(list).is_none());
        assert!(backend.node(item).is_none());
        assert!(backend.node(text).is_none());
        assert_eq!(backend.node_count(), 1);
        assert!(matches!(
            backend.mutations().last(),
            Some(Mutation::Remove { node, .. }) if *node == list
        ));
    }

    #[test]
    fn insert_before_unknown_anchor_fails() {
        let mut backend = MemoryBackend::new();
        let root = backend.container();
        let a = create(&mut backend, Element::text("a"));
        let stray = create(&mut backend, Element::text("stray"));

        let err = backend.insert_before(&root, &a, &stray).unwrap_err();
        assert!(matches!(err, BackendError::NotAChild { .. }));
    }

    #[test]
    fn text_nodes_cannot_hold_children() {
        let mut backend = MemoryBackend::new();
        let text = create(&mut backend, Element::text("t"));
        let other = create(&mut backend, Element::text("u"));

        let err = backend.append_child(&text, &other).unwrap_err();
        assert!(matches!(err, BackendError::NotAContainer(_)));
    }

    #[test]
    fn dispatch_runs_listener() {
        let mut backend = MemoryBackend::new();
        let clicks = Arc::new(AtomicI32::new(0));
        let clicks_clone = clicks.clone();
        let button = create(
            &mut backend,
            Element::native(
                "button",
                Props::new().on("click", move |_| {
                    clicks_clone.fetch_add(1, Ordering::SeqCst);
                }),
            ),
        );

        assert!(backend.dispatch(button, &Event::new("click")));
        assert!(!backend.dispatch(button, &Event::new("keydown")));
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn html_escapes_text_and_attributes() {
        let mut backend = MemoryBackend::new();
        let root = backend.container();
        let a = create(
            &mut backend,
            Element::native("a", Props::new().with("title", "\"q\"")),
        );
        let t = create(&mut backend, Element::text("1 < 2"));
        backend.append_child(&a, &t).unwrap();
        backend.append_child(&root, &a).unwrap();

        assert_eq!(backend.to_html(), "<a title=\"&quot;q&quot;\">1 &lt; 2</a>");
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut backend = MemoryBackend::new();
        let li = create(
            &mut backend,
            Element::native("li", Props::new().with("className", "item")),
        );
        let t = create(&mut backend, Element::text("item1"));
        backend.append_child(&li, &t).unwrap();

        let json = serde_json::to_value(backend.snapshot(li).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tag": "li", "classes": ["item"], "children": ["item1"]})
        );
    }

    #[test]
    fn event_names_need_uppercase_after_on() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("online"), None);
        assert_eq!(event_name("on"), None);
    }
}
