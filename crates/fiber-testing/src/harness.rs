use std::sync::Arc;

use fiber_core::{
    Element, Host, MemoryHost, Mutation, NodeId, RenderError, RenderHandle, Root, RootOptions,
    WorkStatus,
};

use crate::{CountdownDeadline, CountingScheduler, FailingHost};

/// Headless harness for exercising a root in tests.
///
/// Owns the root, its host and a [`CountingScheduler`], and exposes helpers
/// for driving the work loop either to completion or in slices of a fixed
/// number of units.
pub struct RootHarness<H: Host = MemoryHost> {
    root: Root<H>,
    scheduler: Arc<CountingScheduler>,
}

impl RootHarness<MemoryHost> {
    /// Create a new harness backed by a fresh in-memory host.
    pub fn new() -> Self {
        Self::with_options(RootOptions::default())
    }

    pub fn with_options(options: RootOptions) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        Self::with_host(host, container, options)
    }

    /// Indented dump of the committed host tree below the container.
    pub fn dump(&self) -> String {
        self.host().dump_tree(self.container_id())
    }

    /// Text of every text node below the container, in tree order.
    pub fn text(&self) -> String {
        self.host().text_content(self.container_id())
    }

    /// Fires `event` on `node`. Returns whether a listener was bound.
    pub fn dispatch(&self, node: NodeId, event: &str) -> bool {
        self.host().dispatch(node, event)
    }

    /// Attached nodes with `tag`, in tree order.
    pub fn find(&self, tag: &str) -> Vec<NodeId> {
        self.host().find_all(self.container_id(), tag)
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.host_mut().take_mutations()
    }

    fn container_id(&self) -> NodeId {
        *self.root.container()
    }
}

impl Default for RootHarness<MemoryHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl RootHarness<FailingHost> {
    /// Harness over a [`FailingHost`] configured by `configure`.
    pub fn failing(configure: impl FnOnce(FailingHost) -> FailingHost) -> Self {
        let mut memory = MemoryHost::new();
        let container = memory.create_container("root");
        let host = configure(FailingHost::new(memory));
        Self::with_host(host, container, RootOptions::default())
    }

    pub fn dump(&self) -> String {
        self.host().memory().dump_tree(*self.root.container())
    }
}

impl<H: Host> RootHarness<H> {
    pub fn with_host(host: H, container: H::Node, options: RootOptions) -> Self {
        let scheduler = Arc::new(CountingScheduler::new());
        let root = Root::with_scheduler(host, container, scheduler.clone(), options);
        Self { root, scheduler }
    }

    /// Render `element` and drive the work loop until the root is idle.
    pub fn set_content(&mut self, element: Element) -> Result<(), RenderError> {
        self.root.render(element);
        self.flush()
    }

    /// Schedule a render of `element` without performing any work.
    pub fn render(&mut self, element: Element) {
        self.root.render(element);
    }

    /// Drive the work loop until there is nothing left to render or commit.
    pub fn flush(&mut self) -> Result<(), RenderError> {
        self.root.flush_sync()
    }

    /// Run one slice that allows `units` units of work.
    pub fn run_slice(&mut self, units: usize) -> Result<WorkStatus, RenderError> {
        self.root.work_loop(&CountdownDeadline::new(units))
    }

    /// Run slices of `units` units each until the root is idle. Returns the
    /// number of slices it took.
    pub fn run_sliced(&mut self, units: usize) -> Result<usize, RenderError> {
        let mut slices = 1;
        while self.run_slice(units)? == WorkStatus::Yielded {
            slices += 1;
        }
        Ok(slices)
    }

    pub fn root(&self) -> &Root<H> {
        &self.root
    }

    pub fn host(&self) -> &H {
        self.root.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.root.host_mut()
    }

    pub fn render_handle(&self) -> RenderHandle {
        self.root.render_handle()
    }

    pub fn scheduler(&self) -> &CountingScheduler {
        &self.scheduler
    }

    /// Idle-callback requests made by the root so far.
    pub fn idle_requests(&self) -> usize {
        self.scheduler.requests()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RootHarness`.
pub fn run_test_root<R>(f: impl FnOnce(&mut RootHarness) -> R) -> R {
    let mut harness = RootHarness::new();
    f(&mut harness)
}
