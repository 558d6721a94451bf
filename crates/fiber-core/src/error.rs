use thiserror::Error;

use crate::host::HostError;

/// Misuse of the hook store detected while a component rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("component `{component}` called {current} hooks but called {previous} in its last render")]
    CountMismatch {
        component: &'static str,
        previous: usize,
        current: usize,
    },
    #[error("component `{component}` read hook #{index} as `{expected}` but the slot holds another type")]
    TypeMismatch {
        component: &'static str,
        index: usize,
        expected: &'static str,
    },
}

/// Why a render pass was abandoned. The host tree is left at its last commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("malformed element at child position {position}: {reason}")]
    MalformedElement {
        position: usize,
        reason: &'static str,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("render pass restarted {restarts} times without committing")]
    RenderLoop { restarts: usize },
    #[error("fiber is no longer part of the tree")]
    DetachedFiber,
}
