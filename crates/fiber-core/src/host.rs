//! The host collaborator: whatever actually owns the rendered nodes.
//!
//! The engine never touches a host tree directly; every mutation goes through
//! [`Host`]. [`MemoryHost`] is the in-memory implementation used by tests,
//! benches and the demo.

use std::fmt;
use std::fmt::Write as _;

use indexmap::IndexMap;
use thiserror::Error;

use crate::collections::map::HashMap;
use crate::element::{Callback, PropValue, NODE_VALUE};

/// Tag used for text nodes in dumps and mutation logs.
pub const TEXT_TAG: &str = "#text";

/// Primitive kind handed to [`Host::create_node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Element(&'a str),
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host operation `{operation}` failed: {message}")]
pub struct HostError {
    pub operation: &'static str,
    pub message: String,
}

impl HostError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Node creation and mutation primitives of a rendering target.
pub trait Host {
    /// Handle to a host node. Cloning must not duplicate the node itself.
    type Node: Clone + fmt::Debug;

    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<Self::Node, HostError>;

    fn set_property(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn clear_property(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    fn bind_event(
        &mut self,
        node: &Self::Node,
        event: &str,
        callback: &Callback,
    ) -> Result<(), HostError>;

    fn unbind_event(
        &mut self,
        node: &Self::Node,
        event: &str,
        callback: &Callback,
    ) -> Result<(), HostError>;

    fn insert_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
}

pub type NodeId = usize;

/// One host call recorded by [`MemoryHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Create { node: NodeId, tag: String },
    SetProperty { node: NodeId, name: String, value: PropValue },
    ClearProperty { node: NodeId, name: String },
    BindEvent { node: NodeId, event: String },
    UnbindEvent { node: NodeId, event: String },
    InsertChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

impl Mutation {
    /// Whether the mutation changes the shape of the host tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::InsertChild { .. } | Mutation::RemoveChild { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct MemoryNode {
    tag: String,
    properties: IndexMap<String, PropValue>,
    listeners: HashMap<String, Callback>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            properties: IndexMap::new(),
            listeners: HashMap::default(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    /// Payload of a text node, rendered as a string.
    pub fn text(&self) -> Option<String> {
        if !self.is_text() {
            return None;
        }
        Some(
            self.properties
                .get(NODE_VALUE)
                .map(ToString::to_string)
                .unwrap_or_default(),
        )
    }

    pub fn has_listener(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// In-memory host tree with a mutation log.
///
/// Removing a node only detaches it, so stale ids stay inspectable until
/// [`collect_detached`](Self::collect_detached) frees them. Freed ids are
/// handed out again by later creations.
#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<Option<MemoryNode>>,
    free: Vec<NodeId>,
    containers: Vec<NodeId>,
    mutations: Vec<Mutation>,
    muted: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached container node without logging a mutation.
    /// Containers are never collected.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        let id = self.alloc(tag);
        self.containers.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frees every node that is not reachable from a container and returns
    /// how many were freed.
    ///
    /// Only call this while no render pass is in flight: nodes of an
    /// unfinished pass are still detached and would be freed with the rest.
    pub fn collect_detached(&mut self) -> usize {
        let mut live = vec![false; self.nodes.len()];
        let mut stack = self.containers.clone();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !std::mem::replace(&mut live[id], true) {
                stack.extend(node.children.iter().copied());
            }
        }
        let mut freed = 0;
        for (id, slot) in self.nodes.iter_mut().enumerate() {
            if slot.is_some() && !live[id] {
                *slot = None;
                self.free.push(id);
                freed += 1;
            }
        }
        log::debug!("memory host freed {freed} detached nodes");
        freed
    }

    /// Turns the mutation log on or off. Long-running hosts that never read
    /// the log switch it off.
    pub fn record_mutations(&mut self, enabled: bool) {
        self.muted = !enabled;
        if self.muted {
            self.mutations.clear();
        }
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Invokes the listener bound for `event` on `node`. Returns whether one
    /// was bound.
    pub fn dispatch(&self, node: NodeId, event: &str) -> bool {
        let callback = self
            .node(node)
            .and_then(|node| node.listeners.get(event))
            .cloned();
        match callback {
            Some(callback) => {
                callback.call();
                true
            }
            None => false,
        }
    }

    /// All attached descendants of `root` with the given tag, in tree order.
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                if node.tag == tag {
                    found.push(id);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    /// Concatenated payload of every text node below `root`.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut output = String::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                if let Some(text) = node.text() {
                    output.push_str(&text);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        output
    }

    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.node(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        if let Some(text) = node.text() {
            let _ = writeln!(output, "{indent}[{id}] {text:?}");
            return;
        }
        let _ = write!(output, "{indent}[{id}] <{}", node.tag);
        for (name, value) in &node.properties {
            let _ = write!(output, " {name}={:?}", value.to_string());
        }
        let mut events: Vec<&String> = node.listeners.keys().collect();
        events.sort();
        for event in events {
            let _ = write!(output, " @{event}");
        }
        output.push_str(">\n");
        for &child in &node.children {
            self.dump_node(output, child, depth + 1);
        }
    }

    fn node_mut(
        &mut self,
        id: NodeId,
        operation: &'static str,
    ) -> Result<&mut MemoryNode, HostError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| HostError::new(operation, format!("node {id} missing")))
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let node = MemoryNode::new(tag);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn record(&mut self, mutation: Mutation) {
        if !self.muted {
            self.record(mutation);
        }
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("nodes", &self.len())
            .field("mutations", &self.mutations.len())
            .finish()
    }
}

impl Host for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<NodeId, HostError> {
        let tag = match kind {
            NodeKind::Element(tag) => tag,
            NodeKind::Text => TEXT_TAG,
        };
        let node = self.alloc(tag);
        self.record(Mutation::Create {
            node,
            tag: tag.to_owned(),
        });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.node_mut(*node, "set_property")?
            .properties
            .insert(name.to_owned(), value.clone());
        self.record(Mutation::SetProperty {
            node: *node,
            name: name.to_owned(),
            value: value.clone(),
        });
        Ok(())
    }

    fn clear_property(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        self.node_mut(*node, "clear_property")?
            .properties
            .shift_remove(name);
        self.record(Mutation::ClearProperty {
            node: *node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn bind_event(
        &mut self,
        node: &NodeId,
        event: &str,
        callback: &Callback,
    ) -> Result<(), HostError> {
        self.node_mut(*node, "bind_event")?
            .listeners
            .insert(event.to_owned(), callback.clone());
        self.record(Mutation::BindEvent {
            node: *node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn unbind_event(
        &mut self,
        node: &NodeId,
        event: &str,
        callback: &Callback,
    ) -> Result<(), HostError> {
        let listeners = &mut self.node_mut(*node, "unbind_event")?.listeners;
        if listeners
            .get(event)
            .is_some_and(|bound| bound.ptr_eq(callback))
        {
            listeners.remove(event);
        }
        self.record(Mutation::UnbindEvent {
            node: *node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn insert_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let (parent, child) = (*parent, *child);
        if parent == child {
            return Err(HostError::new(
                "insert_child",
                format!("node {child} cannot contain itself"),
            ));
        }
        let existing = self.node_mut(child, "insert_child")?.parent;
        if let Some(existing) = existing {
            return Err(HostError::new(
                "insert_child",
                format!("node {child} is already attached to {existing}"),
            ));
        }
        self.node_mut(parent, "insert_child")?.children.push(child);
        self.node_mut(child, "insert_child")?.parent = Some(parent);
        self.record(Mutation::InsertChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let (parent, child) = (*parent, *child);
        let children = &mut self.node_mut(parent, "remove_child")?.children;
        let Some(index) = children.iter().position(|&id| id == child) else {
            return Err(HostError::new(
                "remove_child",
                format!("node {child} is not a child of {parent}"),
            ));
        };
        children.remove(index);
        self.node_mut(child, "remove_child")?.parent = None;
        self.record(Mutation::RemoveChild { parent, child });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_maintain_links() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let div = host.create_node(NodeKind::Element("div")).unwrap();
        host.insert_child(&root, &div).unwrap();
        assert_eq!(host.children(root), &[div]);
        assert_eq!(host.node(div).unwrap().parent(), Some(root));

        host.remove_child(&root, &div).unwrap();
        assert!(host.children(root).is_empty());
        assert_eq!(host.node(div).unwrap().parent(), None);
    }

    #[test]
    fn removing_a_stranger_is_an_error() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let div = host.create_node(NodeKind::Element("div")).unwrap();
        let err = host.remove_child(&root, &div).unwrap_err();
        assert_eq!(err.operation, "remove_child");
    }

    #[test]
    fn double_attach_is_an_error() {
        let mut host = MemoryHost::new();
        let a = host.create_container("a");
        let b = host.create_container("b");
        let child = host.create_node(NodeKind::Text).unwrap();
        host.insert_child(&a, &child).unwrap();
        assert!(host.insert_child(&b, &child).is_err());
    }

    #[test]
    fn collect_detached_frees_subtrees_and_reuses_ids() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let kept = host.create_node(NodeKind::Element("div")).unwrap();
        let dropped = host.create_node(NodeKind::Element("ul")).unwrap();
        let item = host.create_node(NodeKind::Element("li")).unwrap();
        host.insert_child(&root, &kept).unwrap();
        host.insert_child(&dropped, &item).unwrap();
        assert_eq!(host.len(), 4);

        assert_eq!(host.collect_detached(), 2);
        assert_eq!(host.len(), 2);
        assert!(host.node(dropped).is_none());
        assert!(host.node(item).is_none());
        assert!(host.node(kept).is_some());
        assert!(host.set_property(&item, "x", &PropValue::from(1)).is_err());

        let reused = host.create_node(NodeKind::Text).unwrap();
        assert!(reused == dropped || reused == item);
        assert!(host.node(reused).unwrap().is_text());
        assert_eq!(host.collect_detached(), 1);
    }

    #[test]
    fn muted_host_keeps_no_log() {
        let mut host = MemoryHost::new();
        host.record_mutations(false);
        let div = host.create_node(NodeKind::Element("div")).unwrap();
        host.set_property(&div, "id", &PropValue::from("a")).unwrap();
        assert!(host.mutations().is_empty());
        assert_eq!(host.node(div).unwrap().property("id"), Some(&PropValue::from("a")));

        host.record_mutations(true);
        host.clear_property(&div, "id").unwrap();
        assert_eq!(host.mutations().len(), 1);
    }

    #[test]
    fn dispatch_invokes_bound_listener_only() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut host = MemoryHost::new();
        let button = host.create_node(NodeKind::Element("button")).unwrap();
        let clicks = Rc::new(Cell::new(0));
        let callback = {
            let clicks = Rc::clone(&clicks);
            Callback::new(move || clicks.set(clicks.get() + 1))
        };
        host.bind_event(&button, "click", &callback).unwrap();
        assert!(host.dispatch(button, "click"));
        assert!(!host.dispatch(button, "hover"));
        assert_eq!(clicks.get(), 1);

        host.unbind_event(&button, "click", &Callback::new(|| {}))
            .unwrap();
        assert!(host.node(button).unwrap().has_listener("click"));
        host.unbind_event(&button, "click", &callback).unwrap();
        assert!(!host.dispatch(button, "click"));
    }

    #[test]
    fn dump_tree_renders_text_and_attributes() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let div = host.create_node(NodeKind::Element("div")).unwrap();
        let text = host.create_node(NodeKind::Text).unwrap();
        host.set_property(&div, "id", &PropValue::from("foo")).unwrap();
        host.set_property(&text, NODE_VALUE, &PropValue::from("hi"))
            .unwrap();
        host.insert_child(&root, &div).unwrap();
        host.insert_child(&div, &text).unwrap();

        let dump = host.dump_tree(root);
        assert_eq!(
            dump,
            "[0] <root>\n  [1] <div id=\"foo\">\n    [2] \"hi\"\n"
        );
        assert_eq!(host.text_content(root), "hi");
    }
}
