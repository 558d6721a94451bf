//! Testing utilities and harness for Fiber-RS

pub mod deadline;
pub mod harness;
pub mod host;
pub mod scheduler;

// Re-export testing utilities
pub use deadline::CountdownDeadline;
pub use harness::{run_test_root, RootHarness};
pub use host::FailingHost;
pub use scheduler::CountingScheduler;

pub mod prelude {
    pub use crate::{run_test_root, CountdownDeadline, CountingScheduler, FailingHost, RootHarness};
}
