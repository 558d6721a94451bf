//! Component-local state.
//!
//! Every component fiber owns an ordered list of hook cells. A cell is found
//! again on the next render purely by call position, which is why hook calls
//! must be unconditional and happen in the same order on every render.
//!
//! Cells are shared by identity between a fiber and the fiber that replaces
//! it, so a setter captured during any earlier render still reaches the live
//! cell. Pending updates are applied when the cell is read during render.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::error::HookError;
use crate::runtime::RenderHandle;

pub(crate) type HookSlot = Rc<dyn Any>;

enum StateUpdate<T> {
    Replace(T),
    Apply(Box<dyn FnOnce(&T) -> T>),
}

struct StateCell<T> {
    state: RefCell<T>,
    queue: RefCell<Vec<StateUpdate<T>>>,
}

impl<T> StateCell<T> {
    fn new(initial: T) -> Self {
        Self {
            state: RefCell::new(initial),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Applies queued updates in enqueue order.
    fn resolve(&self) {
        let pending = mem::take(&mut *self.queue.borrow_mut());
        if pending.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        for update in pending {
            let next = match update {
                StateUpdate::Replace(value) => value,
                StateUpdate::Apply(f) => f(&*state),
            };
            *state = next;
        }
    }

    fn enqueue(&self, update: StateUpdate<T>) {
        self.queue.borrow_mut().push(update);
    }
}

/// Setter returned by [`Hooks::use_state`].
///
/// Calling it queues the update on its cell and requests a new render pass
/// from the root; the new value is visible on the next render.
pub struct SetState<T> {
    cell: Rc<StateCell<T>>,
    handle: RenderHandle,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            handle: self.handle.clone(),
        }
    }
}

impl<T: 'static> SetState<T> {
    pub fn set(&self, value: T) {
        self.cell.enqueue(StateUpdate::Replace(value));
        self.handle.request_render();
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.cell.enqueue(StateUpdate::Apply(Box::new(f)));
        self.handle.request_render();
    }

    pub fn pending_updates(&self) -> usize {
        self.cell.queue.borrow().len()
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("state", &type_name::<T>())
            .field("pending", &self.cell.queue.borrow().len())
            .finish()
    }
}

/// Hook store of the component currently being rendered.
///
/// Only reachable through the argument a component receives, so hooks cannot
/// be called outside a component invocation. Misuse that can only be seen at
/// run time (a changed hook count or type) is recorded and turned into a
/// [`HookError`] once the component returns.
pub struct Hooks<'a> {
    component: &'static str,
    previous: Option<&'a [HookSlot]>,
    slots: Vec<HookSlot>,
    handle: RenderHandle,
    violation: Option<HookError>,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        component: &'static str,
        previous: Option<&'a [HookSlot]>,
        handle: RenderHandle,
    ) -> Self {
        Self {
            component,
            previous,
            slots: Vec::new(),
            handle,
            violation: None,
        }
    }

    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state) but only builds the initial value
    /// on the first render.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, SetState<T>) {
        let index = self.slots.len();
        let previous = self.previous.and_then(|slots| slots.get(index)).cloned();
        let cell = match previous.map(|slot| slot.downcast::<StateCell<T>>()) {
            Some(Ok(cell)) => cell,
            Some(Err(_)) => {
                self.report(HookError::TypeMismatch {
                    component: self.component,
                    index,
                    expected: type_name::<T>(),
                });
                Rc::new(StateCell::new(init()))
            }
            None => Rc::new(StateCell::new(init())),
        };
        cell.resolve();
        let value = cell.state.borrow().clone();
        self.slots.push(cell.clone());
        log::trace!("{}: state hook #{index} = {}", self.component, type_name::<T>());
        (
            value,
            SetState {
                cell,
                handle: self.handle.clone(),
            },
        )
    }

    /// Handle that requests a render pass without touching any state.
    pub fn render_handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    pub fn hook_index(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn finish(self) -> Result<Vec<HookSlot>, HookError> {
        if let Some(violation) = self.violation {
            return Err(violation);
        }
        if let Some(previous) = self.previous {
            if previous.len() != self.slots.len() {
                return Err(HookError::CountMismatch {
                    component: self.component,
                    previous: previous.len(),
                    current: self.slots.len(),
                });
            }
        }
        Ok(self.slots)
    }

    fn report(&mut self, violation: HookError) {
        if self.violation.is_none() {
            self.violation = Some(violation);
        }
    }
}

impl fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("component", &self.component)
            .field("index", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::platform::DefaultScheduler;
    use crate::runtime::RenderSignal;

    fn signal() -> Rc<RenderSignal> {
        RenderSignal::new(Arc::new(DefaultScheduler))
    }

    #[test]
    fn first_render_uses_initial_values() {
        let signal = signal();
        let mut hooks = Hooks::new("test", None, RenderHandle::new(&signal));
        let (count, _) = hooks.use_state(3);
        let (name, _) = hooks.use_state_with(|| String::from("fiber"));
        assert_eq!(count, 3);
        assert_eq!(name, "fiber");
        assert_eq!(hooks.finish().unwrap().len(), 2);
    }

    #[test]
    fn queued_updates_apply_in_order_on_next_read() {
        let signal = signal();
        let mut hooks = Hooks::new("test", None, RenderHandle::new(&signal));
        let (_, set_count) = hooks.use_state(1);
        let slots = hooks.finish().unwrap();

        set_count.set(10);
        set_count.update(|count| count * 2);
        set_count.update(|count| count + 1);
        assert_eq!(set_count.pending_updates(), 3);
        assert!(signal.take_request());

        let mut hooks = Hooks::new("test", Some(slots.as_slice()), RenderHandle::new(&signal));
        let (count, _) = hooks.use_state(1);
        assert_eq!(count, 21);
        assert_eq!(set_count.pending_updates(), 0);
    }

    #[test]
    fn type_change_at_a_position_is_reported() {
        let signal = signal();
        let mut hooks = Hooks::new("test", None, RenderHandle::new(&signal));
        hooks.use_state(1_i32);
        let slots = hooks.finish().unwrap();

        let mut hooks = Hooks::new("test", Some(slots.as_slice()), RenderHandle::new(&signal));
        let (value, _) = hooks.use_state(String::from("fallback"));
        assert_eq!(value, "fallback");
        assert!(matches!(
            hooks.finish(),
            Err(HookError::TypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn changed_hook_count_is_reported() {
        let signal = signal();
        let mut hooks = Hooks::new("test", None, RenderHandle::new(&signal));
        hooks.use_state(1);
        hooks.use_state(2);
        let slots = hooks.finish().unwrap();

        let mut hooks = Hooks::new("test", Some(slots.as_slice()), RenderHandle::new(&signal));
        hooks.use_state(1);
        assert!(matches!(
            hooks.finish(),
            Err(HookError::CountMismatch {
                component: "test",
                previous: 2,
                current: 1,
            })
        ));
    }

    #[test]
    fn setters_outliving_the_root_are_ignored() {
        let signal = signal();
        let mut hooks = Hooks::new("test", None, RenderHandle::new(&signal));
        let (_, set_count) = hooks.use_state(0);
        drop(hooks);
        drop(signal);
        set_count.set(5);
        assert!(!set_count.handle.is_attached());
    }
}
