use fiber_core::{Callback, Host, HostError, MemoryHost, NodeId, NodeKind, PropValue, TEXT_TAG};

/// [`MemoryHost`] wrapper that injects failures into chosen host operations.
///
/// Operations are named after the [`Host`] methods (`"create_node"`,
/// `"insert_child"`, ...). Creation can also be refused for a single tag.
#[derive(Debug, Default)]
pub struct FailingHost {
    memory: MemoryHost,
    operations: Vec<(&'static str, usize)>,
    tags: Vec<String>,
    failures: usize,
}

impl FailingHost {
    pub fn new(memory: MemoryHost) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    /// Fails every call of the named host operation.
    pub fn fail_operation(mut self, operation: &'static str) -> Self {
        self.inject_failure(operation);
        self
    }

    /// Starts failing the named host operation from the next call on.
    pub fn inject_failure(&mut self, operation: &'static str) {
        self.inject_failure_after(operation, 0);
    }

    /// Lets `successes` more calls of the named operation through, then fails
    /// every call after them.
    pub fn inject_failure_after(&mut self, operation: &'static str, successes: usize) {
        self.operations.push((operation, successes));
    }

    /// Fails creation of nodes with `tag` (`#text` for text nodes).
    pub fn fail_create(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Stops injecting failures.
    pub fn heal(&mut self) {
        self.operations.clear();
        self.tags.clear();
    }

    /// Number of failures injected so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn memory(&self) -> &MemoryHost {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryHost {
        &mut self.memory
    }

    fn check(&mut self, operation: &'static str) -> Result<(), HostError> {
        let Some((_, successes)) = self
            .operations
            .iter_mut()
            .find(|(name, _)| *name == operation)
        else {
            return Ok(());
        };
        if *successes > 0 {
            *successes -= 1;
            return Ok(());
        }
        Err(self.inject(operation))
    }

    fn inject(&mut self, operation: &'static str) -> HostError {
        self.failures += 1;
        log::debug!("injecting failure into `{operation}`");
        HostError::new(operation, "injected failure")
    }
}

impl Host for FailingHost {
    type Node = NodeId;

    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<NodeId, HostError> {
        self.check("create_node")?;
        let tag = match kind {
            NodeKind::Element(tag) => tag,
            NodeKind::Text => TEXT_TAG,
        };
        if self.tags.iter().any(|refused| refused == tag) {
            return Err(self.inject("create_node"));
        }
        self.memory.create_node(kind)
    }

    fn set_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.check("set_property")?;
        self.memory.set_property(node, name, value)
    }

    fn clear_property(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        self.check("clear_property")?;
        self.memory.clear_property(node, name)
    }

    fn bind_event(
        &mut self,
        node: &NodeId,
        event: &str,
        callback: &Callback,
    ) -> Result<(), HostError> {
        self.check("bind_event")?;
        self.memory.bind_event(node, event, callback)
    }

    fn unbind_event(
        &mut self,
        node: &NodeId,
        event: &str,
        callback: &Callback,
    ) -> Result<(), HostError> {
        self.check("unbind_event")?;
        self.memory.unbind_event(node, event, callback)
    }

    fn insert_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.check("insert_child")?;
        self.memory.insert_child(parent, child)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.check("remove_child")?;
        self.memory.remove_child(parent, child)
    }
}
