//! Positional child diffing.
//!
//! The new element list and the previous child chain are walked in lock-step.
//! There are no keys: position alone decides which old fiber an element is
//! compared with, so reordering children shows up as kind mismatches rather
//! than moves.

use crate::element::{Element, ElementKind};
use crate::error::RenderError;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};

/// Rebuilds the child chain of `wip` from `elements`, diffing against the
/// children of its alternate. Discarded old fibers are tagged
/// [`EffectTag::Deletion`] and appended to `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    fibers: &mut FiberTree<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) -> Result<(), RenderError> {
    for (position, element) in elements.iter().enumerate() {
        validate(element, position)?;
    }

    let alternate = fibers.fiber(wip)?.alternate;
    let mut old = alternate
        .and_then(|alternate| fibers.get(alternate))
        .and_then(|alternate| alternate.child);
    fibers.fiber_mut(wip)?.child = None;

    let mut previous_sibling: Option<FiberId> = None;
    let mut index = 0;
    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let (same_kind, old_sibling) = match old.and_then(|id| fibers.get(id)) {
            Some(old_fiber) => (
                element.is_some_and(|element| old_fiber.kind.same_kind(element.kind())),
                old_fiber.sibling,
            ),
            None => (false, None),
        };

        let mut new_fiber = None;
        if let Some(element) = element {
            match old {
                Some(old_id) if same_kind => {
                    let host_node = fibers.get(old_id).and_then(|fiber| fiber.host_node.clone());
                    new_fiber = Some(fibers.insert(Fiber::update(element, wip, old_id, host_node)));
                }
                _ => {
                    new_fiber = Some(fibers.insert(Fiber::placement(element, wip)));
                }
            }
        }
        if !same_kind {
            if let Some(old_id) = old {
                if let Some(old_fiber) = fibers.get_mut(old_id) {
                    old_fiber.effect = Some(EffectTag::Deletion);
                }
                deletions.push(old_id);
            }
        }

        if let Some(new_id) = new_fiber {
            match previous_sibling {
                Some(previous) => fibers.fiber_mut(previous)?.sibling = Some(new_id),
                None => fibers.fiber_mut(wip)?.child = Some(new_id),
            }
            previous_sibling = Some(new_id);
        }
        old = old_sibling;
        index += 1;
    }
    Ok(())
}

fn validate(element: &Element, position: usize) -> Result<(), RenderError> {
    match element.kind() {
        ElementKind::Host(tag) if tag.trim().is_empty() => Err(RenderError::MalformedElement {
            position,
            reason: "host element has an empty kind",
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
