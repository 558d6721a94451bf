//! The cooperative render loop.
//!
//! Work is split into units of one fiber each. Between units the loop checks
//! the deadline and, when the slice is spent, hands control back to the host
//! with `next_unit_of_work` pointing at the exact place to resume. Nothing a
//! unit does is visible on screen until the whole pass commits.

use std::mem;
use std::rc::Rc;
use std::slice;

use crate::commit::update_properties;
use crate::element::{Component, ElementKind, Props};
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberKind};
use crate::hooks::{HookSlot, Hooks};
use crate::host::{Host, NodeKind};
use crate::platform::{Deadline, Unbounded};
use crate::reconciler::reconcile_children;
use crate::root::{Root, WorkStatus};

impl<H: Host> Root<H> {
    /// Idle-callback body: performs units of work until the deadline runs
    /// low, commits a finished pass, and asks for another idle callback while
    /// work remains.
    ///
    /// On error the in-flight pass is dropped and the host tree stays at its
    /// last commit.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
        let mut units = 0;
        loop {
            if self.signal.take_request() {
                self.restart()?;
            }
            let Some(unit) = self.next_unit_of_work else {
                break;
            };
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit_of_work = next,
                Err(err) => return Err(self.abort(err)),
            }
            if self.signal.is_requested() {
                self.requested_during_render = true;
            }
            units += 1;
            if self.should_yield(deadline, units) {
                break;
            }
        }

        let finished = self.next_unit_of_work.is_none() && self.wip_root.is_some();
        if finished && !self.signal.is_requested() {
            self.commit_root()?;
        }

        if self.has_pending_work() {
            log::debug!("yielding after {units} units of work");
            self.signal.scheduler().request_idle_callback();
            return Ok(WorkStatus::Yielded);
        }
        Ok(WorkStatus::Idle)
    }

    /// Runs the loop with a slice that never expires until nothing is left to
    /// render or commit.
    pub fn flush_sync(&mut self) -> Result<(), RenderError> {
        while self.work_loop(&Unbounded)? == WorkStatus::Yielded {}
        Ok(())
    }

    fn should_yield(&self, deadline: &dyn Deadline, units: usize) -> bool {
        if self
            .options
            .max_units_per_slice
            .is_some_and(|max| units >= max)
        {
            return true;
        }
        deadline.time_remaining() < self.options.yield_threshold
    }

    /// Replaces the pending work with a fresh pass diffed against the
    /// committed tree.
    ///
    /// Only restarts caused by a setter called while rendering count towards
    /// `max_restarts`; a request from outside the render (an event handler
    /// between slices) starts the count over.
    fn restart(&mut self) -> Result<(), RenderError> {
        let from_render = mem::take(&mut self.requested_during_render);
        if self.wip_root.is_some() {
            if from_render {
                self.restarts += 1;
            } else {
                self.restarts = 0;
            }
            if self.restarts > self.options.max_restarts {
                let restarts = self.restarts;
                return Err(self.abort(RenderError::RenderLoop { restarts }));
            }
            log::debug!("state update restarted the render pass ({} restarts)", self.restarts);
        }
        self.begin_pass();
        Ok(())
    }

    /// Drops the in-flight pass and frees its fibers. Returns `err` for the
    /// caller to propagate.
    pub(crate) fn abort(&mut self, err: RenderError) -> RenderError {
        log::error!("render pass aborted: {err}");
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.deletions.clear();
        self.restarts = 0;
        self.requested_during_render = false;
        self.fibers.retain_tree(self.current_root);
        err
    }

    /// Renders one fiber and reconciles its children. Returns the next fiber
    /// in depth-first order, or `None` when the pass is complete.
    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, RenderError> {
        let kind = self.fibers.fiber(id)?.kind.clone();
        match &kind {
            FiberKind::Element(ElementKind::Component(component)) => {
                log::trace!("unit {id:?}: component {}", component.name());
                self.update_function_component(id, component)?;
            }
            FiberKind::Element(ElementKind::Host(tag)) => {
                log::trace!("unit {id:?}: <{tag}>");
                self.update_host_component(id, Some(NodeKind::Element(&**tag)))?;
            }
            FiberKind::Element(ElementKind::Text) => {
                log::trace!("unit {id:?}: text");
                self.update_host_component(id, Some(NodeKind::Text))?;
            }
            FiberKind::Root => {
                log::trace!("unit {id:?}: root");
                self.update_host_component(id, None)?;
            }
        }
        Ok(self
            .wip_root
            .and_then(|root| self.fibers.next_in_order(id, root)))
    }

    fn update_function_component(
        &mut self,
        id: FiberId,
        component: &Component,
    ) -> Result<(), RenderError> {
        let fiber = self.fibers.fiber(id)?;
        let props = Rc::clone(&fiber.props);
        let previous: Option<Vec<HookSlot>> = fiber
            .alternate
            .and_then(|alternate| self.fibers.get(alternate))
            .map(|alternate| alternate.hooks.clone());

        let mut hooks = Hooks::new(component.name(), previous.as_deref(), self.render_handle());
        let child = component.render(&mut hooks, &props);
        let slots = hooks.finish()?;
        self.fibers.fiber_mut(id)?.hooks = slots;

        reconcile_children(
            &mut self.fibers,
            &mut self.deletions,
            id,
            slice::from_ref(&child),
        )
    }

    /// Creates the host node on first visit, writing the initial attributes
    /// onto it while it is still detached, then reconciles the children.
    fn update_host_component(
        &mut self,
        id: FiberId,
        node_kind: Option<NodeKind<'_>>,
    ) -> Result<(), RenderError> {
        let fiber = self.fibers.fiber(id)?;
        let props = Rc::clone(&fiber.props);
        let needs_node = fiber.host_node.is_none();
        if let Some(node_kind) = node_kind.filter(|_| needs_node) {
            let node = self.host.create_node(node_kind)?;
            self.pass_stats.nodes_created += 1;
            update_properties(
                &mut self.host,
                &node,
                &Props::new(),
                &props,
                &mut self.pass_stats,
            )?;
            self.fibers.fiber_mut(id)?.host_node = Some(node);
        }
        reconcile_children(&mut self.fibers, &mut self.deletions, id, props.children())
    }
}
