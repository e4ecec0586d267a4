use std::collections::BTreeMap;
use std::fmt::Write;

use super::{Document, POPUP_CLOSE_ID, POPUP_HEADER_ID, POPUP_ID, ROOM_ID, SENSOR_TABLE_ID};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Default, Clone)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    toggle: Option<String>,
}

/// Headless DOM used by the native viewer and by tests.
///
/// Nodes are never freed; a removed node keeps its data but is no longer
/// reachable from the root, so node identity stays stable for the lifetime of
/// the document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates the page skeleton: room, sensor table and popup.
    pub fn new() -> Self {
        let mut document = Self::empty();
        let root = document.root;

        document.build(root, "div", ROOM_ID);
        document.build(root, "table", SENSOR_TABLE_ID);
        let popup = document.build(root, "div", POPUP_ID);
        document.build(popup, "div", POPUP_HEADER_ID);
        document.build(popup, "span", POPUP_CLOSE_ID);

        document
    }

    /// A document with only a `body` root.
    pub fn empty() -> Self {
        Self {
            nodes: vec![NodeData {
                tag: "body".to_string(),
                ..Default::default()
            }],
            root: NodeId(0),
        }
    }

    fn build(&mut self, parent: NodeId, tag: &str, id: &str) -> NodeId {
        let node = self.alloc(tag);
        self.nodes[node.0].id = Some(id.to_string());
        self.link(parent, node);
        node
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            ..Default::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.unlink(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0)
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| Error::document(format!("unknown node {}", node.0)))
    }

    /// A class token as `DOMTokenList` accepts it: non-empty, no ASCII whitespace.
    fn check_token(class: &str) -> Result<()> {
        if class.is_empty() {
            return Err(Error::document("SyntaxError: empty class token"));
        }
        if class.chars().any(|c| c.is_ascii_whitespace()) {
            return Err(Error::document(format!(
                "InvalidCharacterError: class token {class:?} contains whitespace"
            )));
        }
        Ok(())
    }

    /// Attached nodes in tree order, root excluded.
    fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[self.root.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        order
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.data(current).and_then(|data| data.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.data(node).map(|data| data.tag.as_str())
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.data(node).and_then(|data| data.id.as_deref())
    }

    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.data(node)
            .map(|data| data.classes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.data(node)
            .and_then(|data| data.style.get(property))
            .map(String::as_str)
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeId, text: &mut String) {
        if let Some(data) = self.data(node) {
            text.push_str(&data.text);
            for child in &data.children {
                self.collect_text(*child, text);
            }
        }
    }

    /// Simulates a click; returns the device the node toggles, if any.
    pub fn click(&self, node: NodeId) -> Option<String> {
        if !self.is_attached(node) {
            return None;
        }
        self.data(node).and_then(|data| data.toggle.clone())
    }

    /// Indented outline of the attached tree, one element per line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        self.render_node(self.root, 0, &mut out);
        out
    }

    fn render_node(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(data) = self.data(node) else {
            return;
        };

        let _ = write!(out, "{:indent$}<{}", "", data.tag, indent = depth * 2);
        if let Some(id) = &data.id {
            let _ = write!(out, " id=\"{id}\"");
        }
        if !data.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", data.classes.join(" "));
        }
        if !data.style.is_empty() {
            let style: Vec<String> = data.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            let _ = write!(out, " style=\"{}\"", style.join("; "));
        }
        out.push('>');
        if !data.text.is_empty() {
            out.push_str(&data.text);
        }
        out.push('\n');

        for child in &data.children {
            self.render_node(*child, depth + 1, out);
        }
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|node| self.nodes[node.0].id.as_deref() == Some(id))
    }

    fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|node| self.nodes[node.0].classes.iter().any(|c| c == class))
            .collect()
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.data(*node).map(|data| data.children.clone()).unwrap_or_default()
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() {
            return Err(Error::document("empty tag name"));
        }
        Ok(self.alloc(tag))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<()> {
        if self.data(*parent).is_none() || self.data(*child).is_none() {
            return Err(Error::document("append of unknown node"));
        }

        let mut ancestor = Some(*parent);
        while let Some(current) = ancestor {
            if current == *child {
                return Err(Error::document("cannot append a node to its own subtree"));
            }
            ancestor = self.nodes[current.0].parent;
        }

        self.link(*parent, *child);
        Ok(())
    }

    fn remove(&mut self, node: &NodeId) {
        if *node != self.root && self.data(*node).is_some() {
            self.unlink(*node);
        }
    }

    fn set_id(&mut self, node: &NodeId, id: &str) {
        if let Ok(data) = self.data_mut(*node) {
            data.id = Some(id.to_string());
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.data(*node).and_then(|data| data.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<()> {
        self.data_mut(*node)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.data(*node)
            .map(|data| data.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) -> Result<()> {
        Self::check_token(class)?;
        let data = self.data_mut(*node)?;
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) -> Result<()> {
        Self::check_token(class)?;
        self.data_mut(*node)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) -> Result<()> {
        self.data_mut(*node)?
            .style
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if let Ok(data) = self.data_mut(*node) {
            data.text = text.to_string();
        }
    }

    fn bind_toggle(&mut self, node: &NodeId, device_id: &str) -> Result<()> {
        self.data_mut(*node)?.toggle = Some(device_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_containers() {
        let document = MemoryDocument::new();

        let room = document.element_by_id(ROOM_ID).unwrap();
        let table = document.element_by_id(SENSOR_TABLE_ID).unwrap();
        let header = document.element_by_id(POPUP_HEADER_ID).unwrap();

        assert_eq!(document.tag(room), Some("div"));
        assert_eq!(document.tag(table), Some("table"));
        assert!(document.is_attached(header));
        assert!(MemoryDocument::empty().element_by_id(ROOM_ID).is_none());
    }

    #[test]
    fn test_removed_nodes_are_invisible() {
        let mut document = MemoryDocument::new();
        let room = document.element_by_id(ROOM_ID).unwrap();
        let div = document.create_element("div").unwrap();
        document.set_id(&div, "control_tv");
        document.add_class(&div, "control").unwrap();

        assert!(document.element_by_id("control_tv").is_none());
        document.append_child(&room, &div).unwrap();
        assert_eq!(document.element_by_id("control_tv"), Some(div));
        assert_eq!(document.elements_by_class("control"), vec![div]);

        document.remove(&div);
        assert!(document.element_by_id("control_tv").is_none());
        assert!(document.elements_by_class("control").is_empty());
        assert!(!document.is_attached(div));
        assert_eq!(document.id(div), Some("control_tv"));
    }

    #[test]
    fn test_element_by_id_uses_tree_order() {
        let mut document = MemoryDocument::new();
        let room = document.element_by_id(ROOM_ID).unwrap();
        let first = document.create_element("div").unwrap();
        let second = document.create_element("div").unwrap();
        document.set_id(&first, "dup");
        document.set_id(&second, "dup");
        document.append_child(&room, &first).unwrap();
        document.append_child(&room, &second).unwrap();

        assert_eq!(document.element_by_id("dup"), Some(first));
    }

    #[test]
    fn test_classes_are_a_set() {
        let mut document = MemoryDocument::new();
        let node = document.create_element("div").unwrap();
        document.add_class(&node, "control").unwrap();
        document.add_class(&node, "light").unwrap();
        document.add_class(&node, "control").unwrap();

        assert_eq!(document.classes(node), vec!["control", "light"]);

        document.remove_class(&node, "control").unwrap();
        assert!(!document.has_class(&node, "control"));
        assert!(document.has_class(&node, "light"));
    }

    #[test]
    fn test_class_tokens_follow_dom_rules() {
        let mut document = MemoryDocument::new();
        let node = document.create_element("div").unwrap();

        assert!(document.add_class(&node, "ceiling light").is_err());
        assert!(document.add_class(&node, "light\n").is_err());
        assert!(document.add_class(&node, "").is_err());
        assert!(document.remove_class(&node, "a b").is_err());
        assert!(document.classes(node).is_empty());

        document.add_class(&node, "ceiling_light").unwrap();
        assert_eq!(document.classes(node), vec!["ceiling_light"]);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let mut document = MemoryDocument::new();
        let outer = document.create_element("div").unwrap();
        let inner = document.create_element("div").unwrap();
        document.append_child(&outer, &inner).unwrap();

        assert!(document.append_child(&inner, &outer).is_err());
        assert!(document.append_child(&outer, &outer).is_err());
    }

    #[test]
    fn test_click_only_reaches_attached_bound_nodes() {
        let mut document = MemoryDocument::new();
        let room = document.element_by_id(ROOM_ID).unwrap();
        let node = document.create_element("div").unwrap();
        document.bind_toggle(&node, "tv").unwrap();

        assert_eq!(document.click(node), None);
        document.append_child(&room, &node).unwrap();
        assert_eq!(document.click(node), Some("tv".to_string()));
        assert_eq!(document.click(room), None);
    }

    #[test]
    fn test_render_text_outline() {
        let mut document = MemoryDocument::new();
        let table = document.element_by_id(SENSOR_TABLE_ID).unwrap();
        let row = document.create_element("tr").unwrap();
        document.set_id(&row, "sensor_light_sensor");
        let cell = document.create_element("td").unwrap();
        document.set_text(&cell, "100.00");
        document.append_child(&row, &cell).unwrap();
        document.append_child(&table, &row).unwrap();

        let outline = document.render_text();
        assert!(outline.starts_with("<body>\n"));
        assert!(outline.contains("  <table id=\"sensorsTable\">\n"));
        assert!(outline.contains("    <tr id=\"sensor_light_sensor\">\n"));
        assert!(outline.contains("      <td>100.00\n"));
        assert_eq!(document.text_content(table), "100.00");
    }
}
