use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::IdleScheduler;

/// Render request flag shared between a root and the state setters it hands
/// out. Setters only raise the flag; the root consumes it from its work loop,
/// so a setter never needs to borrow the root.
pub(crate) struct RenderSignal {
    requested: Cell<bool>,
    scheduler: Arc<dyn IdleScheduler>,
}

impl RenderSignal {
    pub(crate) fn new(scheduler: Arc<dyn IdleScheduler>) -> Rc<Self> {
        Rc::new(Self {
            requested: Cell::new(false),
            scheduler,
        })
    }

    fn request(&self) {
        if !self.requested.replace(true) {
            self.scheduler.request_idle_callback();
        }
    }

    pub(crate) fn take_request(&self) -> bool {
        self.requested.replace(false)
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.get()
    }

    pub(crate) fn scheduler(&self) -> &Arc<dyn IdleScheduler> {
        &self.scheduler
    }
}

/// Weak handle that asks a root for a fresh render pass.
///
/// Outlives its root harmlessly: requests after the root is dropped are
/// ignored.
#[derive(Clone)]
pub struct RenderHandle(Weak<RenderSignal>);

impl RenderHandle {
    pub(crate) fn new(signal: &Rc<RenderSignal>) -> Self {
        Self(Rc::downgrade(signal))
    }

    pub fn request_render(&self) {
        if let Some(signal) = self.0.upgrade() {
            signal.request();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}
