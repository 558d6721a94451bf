use std::cell::Cell;
use std::time::Duration;

use fiber_core::Deadline;

/// Deadline that grants a fixed number of units of work instead of time.
///
/// The work loop checks the deadline once after every unit, so a slice
/// driven by `CountdownDeadline::new(n)` performs exactly `n` units (at least
/// one) before yielding.
#[derive(Debug)]
pub struct CountdownDeadline {
    remaining: Cell<usize>,
    checks: Cell<usize>,
}

impl CountdownDeadline {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
            checks: Cell::new(0),
        }
    }

    /// How often the work loop asked for the remaining time.
    pub fn checks(&self) -> usize {
        self.checks.get()
    }

    pub fn is_spent(&self) -> bool {
        self.remaining.get() == 0
    }
}

impl Deadline for CountdownDeadline {
    fn time_remaining(&self) -> Duration {
        self.checks.set(self.checks.get() + 1);
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}
