//! Commit phase: applies a finished work-in-progress tree to the host in one
//! pass that never yields.

use std::mem;
use std::rc::Rc;

use crate::element::{event_name, is_event, is_property, Props};
use crate::error::RenderError;
use crate::fiber::{EffectTag, FiberId};
use crate::host::{Host, HostError};
use crate::root::Root;

/// Host work performed by one render pass, node creation during render
/// included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    pub nodes_created: usize,
    pub property_writes: usize,
    pub event_bindings: usize,
    pub event_unbindings: usize,
}

impl CommitStats {
    /// Whether the commit left the host tree untouched.
    pub fn is_noop(&self) -> bool {
        self.placements == 0
            && self.deletions == 0
            && self.nodes_created == 0
            && self.property_writes == 0
            && self.event_bindings == 0
            && self.event_unbindings == 0
    }
}

/// Host work applied so far by a commit that has not finished yet.
enum Applied<N> {
    Inserted {
        parent: N,
        node: N,
    },
    Updated {
        node: N,
        previous: Rc<Props>,
        next: Rc<Props>,
    },
}

impl<H: Host> Root<H> {
    /// Applies deletions, then placements and updates in depth-first order,
    /// and promotes the work-in-progress tree to the committed one.
    ///
    /// A host failure drops the pass. Placements and updates it already made
    /// are undone; deletions it already made are dropped from the committed
    /// tree so the next pass diffs against what the host really shows.
    pub(crate) fn commit_root(&mut self) -> Result<(), RenderError> {
        let Some(wip) = self.wip_root else {
            return Ok(());
        };
        let mut stats = mem::take(&mut self.pass_stats);
        let deletions = mem::take(&mut self.deletions);
        let mut journal = Vec::new();

        if let Err(err) = self.apply_effects(wip, &deletions, &mut journal, &mut stats) {
            self.roll_back(journal);
            return Err(self.abort(err));
        }

        self.current_root = Some(wip);
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.restarts = 0;
        let freed = self.fibers.retain_tree(self.current_root);
        log::debug!(
            "commit: {} placed, {} updated, {} deleted, {} property writes, {} fibers freed",
            stats.placements,
            stats.updates,
            stats.deletions,
            stats.property_writes,
            freed
        );
        self.last_commit = Some(stats);
        Ok(())
    }

    fn apply_effects(
        &mut self,
        wip: FiberId,
        deletions: &[FiberId],
        journal: &mut Vec<Applied<H::Node>>,
        stats: &mut CommitStats,
    ) -> Result<(), RenderError> {
        for &fiber in deletions {
            self.commit_deletion(fiber, stats)?;
        }
        let mut next = self.fibers.get(wip).and_then(|fiber| fiber.child);
        while let Some(id) = next {
            self.commit_work(id, journal, stats)?;
            next = self.fibers.next_in_order(id, wip);
        }
        Ok(())
    }

    /// Undoes journaled placements and updates, newest first. Failures are
    /// logged and skipped.
    fn roll_back(&mut self, journal: Vec<Applied<H::Node>>) {
        let mut scratch = CommitStats::default();
        for applied in journal.into_iter().rev() {
            let result = match applied {
                Applied::Inserted { parent, node } => self.host.remove_child(&parent, &node),
                Applied::Updated {
                    node,
                    previous,
                    next,
                } => update_properties(&mut self.host, &node, &next, &previous, &mut scratch),
            };
            if let Err(err) = result {
                log::error!("rollback of a failed commit incomplete: {err}");
            }
        }
    }

    /// Detaches the host node of a deleted fiber. Component fibers own no
    /// node, so their first descendant that does is removed instead. Once the
    /// host has let go of the node the fiber leaves the committed tree too.
    fn commit_deletion(&mut self, id: FiberId, stats: &mut CommitStats) -> Result<(), RenderError> {
        stats.deletions += 1;
        let Some(parent) = self.fibers.host_parent(id) else {
            log::error!("deleted fiber {id:?} has no host parent; skipped");
            return Ok(());
        };
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.fibers.fiber(current)?;
            if let Some(node) = fiber.host_node.clone() {
                log::trace!("remove {node:?} from {parent:?}");
                self.host.remove_child(&parent, &node)?;
                break;
            }
            cursor = fiber.child;
        }
        self.fibers.unlink(id);
        Ok(())
    }

    fn commit_work(
        &mut self,
        id: FiberId,
        journal: &mut Vec<Applied<H::Node>>,
        stats: &mut CommitStats,
    ) -> Result<(), RenderError> {
        let fiber = self.fibers.fiber(id)?;
        let node = fiber.host_node.clone();
        match fiber.effect {
            Some(EffectTag::Placement) => {
                stats.placements += 1;
                let Some(node) = node else {
                    return Ok(());
                };
                let Some(parent) = self.fibers.host_parent(id) else {
                    log::error!("placed fiber {id:?} has no host parent; skipped");
                    return Ok(());
                };
                log::trace!("insert {node:?} into {parent:?}");
                self.host.insert_child(&parent, &node)?;
                journal.push(Applied::Inserted { parent, node });
            }
            Some(EffectTag::Update) => {
                stats.updates += 1;
                let Some(node) = node else {
                    return Ok(());
                };
                let next = Rc::clone(&fiber.props);
                let Some(previous) = fiber
                    .alternate
                    .and_then(|alternate| self.fibers.get(alternate))
                    .map(|alternate| Rc::clone(&alternate.props))
                else {
                    log::error!("updated fiber {id:?} lost its alternate; skipped");
                    return Ok(());
                };
                // journaled first: a partial property diff is undone as a whole
                journal.push(Applied::Updated {
                    node: node.clone(),
                    previous: Rc::clone(&previous),
                    next: Rc::clone(&next),
                });
                update_properties(&mut self.host, &node, &previous, &next, stats)?;
            }
            Some(EffectTag::Deletion) | None => {}
        }
        Ok(())
    }
}

/// Brings the attributes of `node` from `previous` to `next`: stale listeners
/// are unbound, vanished properties cleared, new or changed properties set and
/// new or changed listeners bound, in that order.
pub(crate) fn update_properties<H: Host>(
    host: &mut H,
    node: &H::Node,
    previous: &Props,
    next: &Props,
    stats: &mut CommitStats,
) -> Result<(), HostError> {
    for (name, value) in previous.attributes().filter(|(name, _)| is_event(name)) {
        if next.get(name) == Some(value) {
            continue;
        }
        if let Some(callback) = value.as_callback() {
            host.unbind_event(node, &event_name(name), callback)?;
            stats.event_unbindings += 1;
        }
    }

    for (name, _) in previous.attributes().filter(|(name, _)| is_property(name)) {
        if next.get(name).is_none() {
            log::trace!("clear {name} on {node:?}");
            host.clear_property(node, name)?;
            stats.property_writes += 1;
        }
    }

    for (name, value) in next.attributes().filter(|(name, _)| is_property(name)) {
        if previous.get(name) != Some(value) {
            log::trace!("set {name} on {node:?}");
            host.set_property(node, name, value)?;
            stats.property_writes += 1;
        }
    }

    for (name, value) in next.attributes().filter(|(name, _)| is_event(name)) {
        if previous.get(name) == Some(value) {
            continue;
        }
        match value.as_callback() {
            Some(callback) => {
                host.bind_event(node, &event_name(name), callback)?;
                stats.event_bindings += 1;
            }
            None => log::warn!("event property `{name}` is not a callback; ignored"),
        }
    }
    Ok(())
}
