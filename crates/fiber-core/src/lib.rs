#![doc = r"Incremental fiber reconciliation for Fiber-RS: element descriptors, a resumable render loop, a two-phase commit and component state hooks."]

pub mod collections;
pub mod commit;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod platform;
pub mod root;
pub mod runtime;

mod reconciler;
mod work_loop;

pub use commit::CommitStats;
pub use element::{
    create_element, Callback, Component, Element, ElementBuilder, ElementKind, PropValue, Props,
    RenderFn, EVENT_PREFIX, NODE_VALUE,
};
pub use error::{HookError, RenderError};
pub use fiber::{EffectTag, FiberId};
pub use hooks::{Hooks, SetState};
pub use host::{Host, HostError, MemoryHost, MemoryNode, Mutation, NodeId, NodeKind, TEXT_TAG};
pub use platform::{Clock, Deadline, DefaultScheduler, IdleScheduler, SliceDeadline, Unbounded};
pub use root::{create_root, Root, RootOptions, WorkStatus};
pub use runtime::RenderHandle;

#[cfg(test)]
#[path = "tests/root_tests.rs"]
mod root_tests;
