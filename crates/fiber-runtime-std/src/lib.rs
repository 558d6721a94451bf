//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `fiber-core`. Applications construct a
//! [`StdRuntime`], create their roots through it and call
//! [`StdRuntime::run_until_idle`] (or [`StdRuntime::run_idle_slice`] from
//! their own event loop) while [`StdIdleScheduler::is_pending`] reports a
//! request.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fiber_core::{
    Clock, Host, IdleScheduler, RenderError, Root, RootOptions, SliceDeadline, WorkStatus,
};

/// Idle scheduler that records whether a root asked for idle time.
///
/// Requests coalesce: however many arrive before the next poll, they grant a
/// single slice.
#[derive(Debug, Default)]
pub struct StdIdleScheduler {
    pending: AtomicBool,
}

impl StdIdleScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request is waiting, without consuming it.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consumes the pending request, if any.
    pub fn take_idle_request(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl IdleScheduler for StdIdleScheduler {
    fn request_idle_callback(&self) {
        self.pending.store(true, Ordering::Release);
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Deadline of a wall-clock slice.
pub type InstantDeadline = SliceDeadline<StdClock>;

/// Convenience container bundling the idle scheduler, the clock and the
/// slice budget.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdIdleScheduler>,
    clock: StdClock,
    slice: Duration,
}

impl StdRuntime {
    pub const DEFAULT_SLICE: Duration = Duration::from_millis(8);

    pub fn new() -> Self {
        Self::with_slice(Self::DEFAULT_SLICE)
    }

    /// Creates a runtime whose idle slices last `slice`.
    pub fn with_slice(slice: Duration) -> Self {
        Self {
            scheduler: Arc::new(StdIdleScheduler::default()),
            clock: StdClock,
            slice,
        }
    }

    /// Creates a root whose idle-callback requests land on this runtime.
    pub fn create_root<H: Host>(
        &self,
        host: H,
        container: H::Node,
        options: RootOptions,
    ) -> Root<H> {
        Root::with_scheduler(host, container, self.scheduler.clone(), options)
    }

    /// Returns the scheduler implementation.
    pub fn scheduler(&self) -> Arc<StdIdleScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> StdClock {
        self.clock
    }

    pub fn slice(&self) -> Duration {
        self.slice
    }

    /// Returns whether an idle callback was requested since the last poll.
    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    /// Starts a fresh slice deadline.
    pub fn deadline(&self) -> InstantDeadline {
        SliceDeadline::start(self.clock, self.slice)
    }

    /// Runs one idle slice of `root`.
    pub fn run_idle_slice<H: Host>(&self, root: &mut Root<H>) -> Result<WorkStatus, RenderError> {
        root.work_loop(&self.deadline())
    }

    /// Keeps granting idle slices while `root` asks for them. Returns the
    /// number of slices run.
    pub fn run_until_idle<H: Host>(&self, root: &mut Root<H>) -> Result<usize, RenderError> {
        let mut slices = 0;
        while self.take_idle_request() {
            slices += 1;
            if self.run_idle_slice(root)? == WorkStatus::Idle {
                log::trace!("root settled after {slices} idle slices");
            }
        }
        Ok(slices)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("slice", &self.slice)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
