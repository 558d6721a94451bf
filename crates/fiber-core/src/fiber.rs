//! Fiber records and the arena that owns them.
//!
//! Parent, child, sibling and alternate links are plain [`FiberId`]s into one
//! generational arena, so the tree can point both ways without ownership
//! cycles. A stale id (its fiber was collected) simply fails to resolve.

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::collections::map::HashSet;
use crate::element::{Element, ElementKind, Props};
use crate::error::RenderError;
use crate::hooks::HookSlot;

new_key_type! {
    /// Handle to a fiber in a root's arena.
    pub struct FiberId;
}

/// Pending host mutation recorded for a fiber during render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

#[derive(Clone, Debug)]
pub(crate) enum FiberKind {
    /// Wraps the host container; its only child is the rendered element.
    Root,
    Element(ElementKind),
}

impl FiberKind {
    pub(crate) fn same_kind(&self, kind: &ElementKind) -> bool {
        matches!(self, FiberKind::Element(own) if own == kind)
    }

    pub(crate) fn component_name(&self) -> Option<&'static str> {
        match self {
            FiberKind::Element(ElementKind::Component(component)) => Some(component.name()),
            _ => None,
        }
    }
}

pub(crate) struct Fiber<N> {
    pub(crate) kind: FiberKind,
    pub(crate) props: Rc<Props>,
    pub(crate) host_node: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<HookSlot>,
}

impl<N> Fiber<N> {
    pub(crate) fn root(container: N, props: Props, alternate: Option<FiberId>) -> Self {
        Self {
            kind: FiberKind::Root,
            props: Rc::new(props),
            host_node: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: None,
            hooks: Vec::new(),
        }
    }

    /// Fiber that reuses the host node of `alternate`, which held the same
    /// kind at this position in the last commit.
    pub(crate) fn update(
        element: &Element,
        parent: FiberId,
        alternate: FiberId,
        host_node: Option<N>,
    ) -> Self {
        Self {
            kind: FiberKind::Element(element.kind().clone()),
            props: element.shared_props(),
            host_node,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: Some(alternate),
            effect: Some(EffectTag::Update),
            hooks: Vec::new(),
        }
    }

    pub(crate) fn placement(element: &Element, parent: FiberId) -> Self {
        Self {
            kind: FiberKind::Element(element.kind().clone()),
            props: element.shared_props(),
            host_node: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect: Some(EffectTag::Placement),
            hooks: Vec::new(),
        }
    }
}

pub(crate) struct FiberTree<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N: Clone> FiberTree<N> {
    pub(crate) fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub(crate) fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    pub(crate) fn fiber(&self, id: FiberId) -> Result<&Fiber<N>, RenderError> {
        self.fibers.get(id).ok_or(RenderError::DetachedFiber)
    }

    pub(crate) fn fiber_mut(&mut self, id: FiberId) -> Result<&mut Fiber<N>, RenderError> {
        self.fibers.get_mut(id).ok_or(RenderError::DetachedFiber)
    }

    pub(crate) fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Next fiber in depth-first order (child, then sibling, then the nearest
    /// ancestor's sibling), never leaving the subtree rooted at `boundary`.
    pub(crate) fn next_in_order(&self, id: FiberId, boundary: FiberId) -> Option<FiberId> {
        if let Some(child) = self.get(id)?.child {
            return Some(child);
        }
        let mut cursor = id;
        loop {
            if cursor == boundary {
                return None;
            }
            let fiber = self.get(cursor)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent?;
        }
    }

    /// Host node of the nearest ancestor that owns one.
    pub(crate) fn host_parent(&self, id: FiberId) -> Option<N> {
        let mut cursor = self.get(id)?.parent;
        while let Some(ancestor) = cursor {
            let fiber = self.get(ancestor)?;
            if let Some(node) = &fiber.host_node {
                return Some(node.clone());
            }
            cursor = fiber.parent;
        }
        None
    }

    pub(crate) fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut children = Vec::new();
        let mut cursor = self.get(id).and_then(|fiber| fiber.child);
        while let Some(child) = cursor {
            children.push(child);
            cursor = self.get(child).and_then(|fiber| fiber.sibling);
        }
        children
    }

    /// Removes `id` from its parent's child chain. The fiber itself stays in
    /// the arena until the next [`retain_tree`](Self::retain_tree).
    pub(crate) fn unlink(&mut self, id: FiberId) {
        let Some(fiber) = self.get(id) else {
            return;
        };
        let (parent, next) = (fiber.parent, fiber.sibling);
        let Some(parent) = parent else {
            return;
        };
        let mut cursor = self.get(parent).and_then(|fiber| fiber.child);
        if cursor == Some(id) {
            if let Some(parent) = self.get_mut(parent) {
                parent.child = next;
            }
            return;
        }
        while let Some(current) = cursor {
            let Some(fiber) = self.get_mut(current) else {
                return;
            };
            if fiber.sibling == Some(id) {
                fiber.sibling = next;
                return;
            }
            cursor = fiber.sibling;
        }
    }

    /// Frees every fiber not reachable from `root` and clears the alternate
    /// links of the survivors. Returns how many fibers were freed.
    pub(crate) fn retain_tree(&mut self, root: Option<FiberId>) -> usize {
        let mut live: HashSet<FiberId> = HashSet::default();
        let mut stack: Vec<FiberId> = root.into_iter().collect();
        while let Some(id) = stack.pop() {
            if !live.insert(id) {
                continue;
            }
            if let Some(fiber) = self.fibers.get(id) {
                stack.extend(fiber.child);
                if Some(id) != root {
                    stack.extend(fiber.sibling);
                }
            }
        }
        let before = self.fibers.len();
        self.fibers.retain(|id, fiber| {
            let keep = live.contains(&id);
            if keep {
                fiber.alternate = None;
            }
            keep
        });
        before - self.fibers.len()
    }
}
