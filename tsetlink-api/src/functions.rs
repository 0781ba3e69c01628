use anyhow::Result;
use tsetlink_core::client::FunctionsHandle;
use tsetlink_core::function::{FunctionDescriptor, FunctionKind};
use tsetlink_core::types::RemoteRef;

use crate::environment::Session;

/// Predefined transformation functions offered by the engine.
pub struct FunctionRegistry {
    session: Session,
    handle: FunctionsHandle,
}

impl FunctionRegistry {
    pub(crate) fn new(session: Session, handle: FunctionsHandle) -> Self {
        Self { session, handle }
    }

    pub fn handle(&self) -> RemoteRef {
        self.handle.registry
    }

    pub fn names(&self) -> &[String] {
        &self.handle.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handle.names.iter().any(|n| n == name)
    }

    /// Build a key comparator on the engine side and return its reference.
    pub fn comparator(&self, comparator: &FunctionDescriptor) -> Result<RemoteRef> {
        comparator.ensure_kind(FunctionKind::Comparator)?;
        let function = comparator.to_bytes()?;
        self.session
            .borrow_mut()
            .build_comparator(self.handle.registry, function)
    }
}
