//! A render root: one host container plus the bookkeeping of its render
//! passes.
//!
//! Everything that a classic implementation keeps in module globals (current
//! tree, work-in-progress tree, next unit of work, deletion list) lives here,
//! one instance per container.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::commit::CommitStats;
use crate::element::{Element, Props};
use crate::fiber::{Fiber, FiberId, FiberTree};
use crate::host::Host;
use crate::platform::{DefaultScheduler, IdleScheduler};
use crate::runtime::{RenderHandle, RenderSignal};

#[derive(Clone, Debug)]
pub struct RootOptions {
    /// Yield once the deadline reports less than this much time left.
    pub yield_threshold: Duration,
    /// Hard cap on units of work per slice, independent of the deadline.
    pub max_units_per_slice: Option<usize>,
    /// How many times state updates may restart an in-flight pass before it
    /// is reported as a render loop.
    pub max_restarts: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            max_units_per_slice: None,
            max_restarts: 64,
        }
    }
}

/// Outcome of one [`Root::work_loop`] slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing left to do; any finished pass has been committed.
    Idle,
    /// The slice ran out with work remaining; another idle callback has been
    /// requested.
    Yielded,
}

pub struct Root<H: Host> {
    pub(crate) host: H,
    pub(crate) container: H::Node,
    pub(crate) fibers: FiberTree<H::Node>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit_of_work: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) element: Option<Element>,
    pub(crate) signal: Rc<RenderSignal>,
    pub(crate) options: RootOptions,
    pub(crate) pass_stats: CommitStats,
    pub(crate) last_commit: Option<CommitStats>,
    pub(crate) restarts: usize,
    /// A render request was raised by a component while it rendered.
    pub(crate) requested_during_render: bool,
    pub(crate) passes: u64,
}

/// Creates a root rendering into `container` with no idle scheduler attached;
/// drive it with [`Root::work_loop`] or [`Root::flush_sync`].
pub fn create_root<H: Host>(host: H, container: H::Node) -> Root<H> {
    Root::new(host, container)
}

impl<H: Host> Root<H> {
    pub fn new(host: H, container: H::Node) -> Self {
        Self::with_scheduler(
            host,
            container,
            Arc::new(DefaultScheduler),
            RootOptions::default(),
        )
    }

    pub fn with_scheduler(
        host: H,
        container: H::Node,
        scheduler: Arc<dyn IdleScheduler>,
        options: RootOptions,
    ) -> Self {
        Self {
            host,
            container,
            fibers: FiberTree::new(),
            current_root: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Vec::new(),
            element: None,
            signal: RenderSignal::new(scheduler),
            options,
            pass_stats: CommitStats::default(),
            last_commit: None,
            restarts: 0,
            requested_during_render: false,
            passes: 0,
        }
    }

    /// Replaces whatever is scheduled with a fresh pass rendering `element`
    /// as the only child of the container.
    pub fn render(&mut self, element: Element) {
        self.element = Some(element);
        self.signal.take_request();
        self.restarts = 0;
        self.requested_during_render = false;
        self.begin_pass();
        self.signal.scheduler().request_idle_callback();
    }

    /// Starts a pass from the last requested element, diffing against the
    /// committed tree. In-flight progress is dropped and collected at the next
    /// commit.
    pub(crate) fn begin_pass(&mut self) -> bool {
        let Some(element) = self.element.clone() else {
            return false;
        };
        let root = self.fibers.insert(Fiber::root(
            self.container.clone(),
            Props::with_children(vec![element]),
            self.current_root,
        ));
        self.wip_root = Some(root);
        self.next_unit_of_work = Some(root);
        self.deletions.clear();
        self.pass_stats = CommitStats::default();
        self.passes += 1;
        log::debug!("render pass {} started", self.passes);
        true
    }

    pub fn has_pending_work(&self) -> bool {
        self.next_unit_of_work.is_some() || self.wip_root.is_some() || self.signal.is_requested()
    }

    /// Whether a pass is currently between its first unit and its commit.
    pub fn is_rendering(&self) -> bool {
        self.wip_root.is_some()
    }

    pub fn render_handle(&self) -> RenderHandle {
        RenderHandle::new(&self.signal)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn container(&self) -> &H::Node {
        &self.container
    }

    pub fn options(&self) -> &RootOptions {
        &self.options
    }

    /// Statistics of the most recent successful commit.
    pub fn last_commit(&self) -> Option<&CommitStats> {
        self.last_commit.as_ref()
    }

    /// Number of render passes started so far, restarts included.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Fibers currently held by the arena.
    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }

    /// Fibers of the committed tree, container fiber excluded.
    pub fn committed_fiber_count(&self) -> usize {
        let Some(root) = self.current_root else {
            return 0;
        };
        let mut count = 0;
        let mut next = self.fibers.get(root).and_then(|fiber| fiber.child);
        while let Some(id) = next {
            count += 1;
            next = self.fibers.next_in_order(id, root);
        }
        count
    }
}

impl<H: Host> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("container", &self.container)
            .field("fibers", &self.fibers.len())
            .field("rendering", &self.wip_root.is_some())
            .field("passes", &self.passes)
            .finish()
    }
}
