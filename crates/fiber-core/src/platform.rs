//! Platform abstraction traits for the render loop.
//!
//! The host decides when the engine gets to run: it owns the idle-time
//! callback and reports how much of the current slice is left. These traits
//! keep the core free of any particular event loop or clock.

use std::time::Duration;

/// Asks the host to run the work loop during its next idle period.
///
/// Implementations only record or forward the request; the host later calls
/// [`Root::work_loop`](crate::Root::work_loop) with a [`Deadline`]. Requests
/// may arrive repeatedly before the host gets around to it.
pub trait IdleScheduler: Send + Sync {
    fn request_idle_callback(&self);
}

/// Remaining budget of the current idle slice.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Provides timing information for slice deadlines.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    fn now(&self) -> Self::Instant;

    fn elapsed(&self, since: Self::Instant) -> Duration;
}

/// Fixed time budget measured from the moment the slice started.
pub struct SliceDeadline<C: Clock> {
    clock: C,
    started: C::Instant,
    budget: Duration,
}

impl<C: Clock> SliceDeadline<C> {
    pub fn start(clock: C, budget: Duration) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl<C: Clock> Deadline for SliceDeadline<C> {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.clock.elapsed(self.started))
    }
}

#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl IdleScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}

/// A slice that never runs out; used for synchronous flushing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}
