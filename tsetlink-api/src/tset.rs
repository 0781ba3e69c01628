use std::rc::Rc;

use anyhow::{Result, anyhow};
use tsetlink_core::function::{FunctionDescriptor, FunctionKind};
use tsetlink_core::protocol::TransformOp;
use tsetlink_core::types::RemoteRef;

use crate::environment::Session;
use crate::partition::DataPartition;

/// Validate `function` against `kind`, then forward `op` on `target`.
fn apply(
    session: &Session,
    target: RemoteRef,
    op: TransformOp,
    function: Option<(&FunctionDescriptor, FunctionKind)>,
) -> Result<Option<RemoteRef>> {
    let function = match function {
        Some((descriptor, kind)) => {
            descriptor.ensure_kind(kind)?;
            Some(descriptor.to_bytes()?)
        }
        None => None,
    };
    session.borrow_mut().transform(target, op, function)
}

fn derived(
    session: &Session,
    target: RemoteRef,
    op: TransformOp,
    function: Option<(&FunctionDescriptor, FunctionKind)>,
) -> Result<RemoteRef> {
    apply(session, target, op, function)?
        .ok_or_else(|| anyhow!("{:?} on {} returned no dataset", op, target))
}

fn partitions(session: &Session, target: RemoteRef) -> Result<Vec<DataPartition>> {
    let refs = session.borrow_mut().get_partitions(target)?;
    Ok(refs
        .into_iter()
        .map(|r| DataPartition::new(Rc::clone(session), r))
        .collect())
}

/// Proxy for an unkeyed dataset owned by the engine.
pub struct TSet {
    session: Session,
    remote: RemoteRef,
}

impl TSet {
    pub(crate) fn new(session: Session, remote: RemoteRef) -> Self {
        Self { session, remote }
    }

    fn derive(&self, remote: RemoteRef) -> TSet {
        TSet::new(Rc::clone(&self.session), remote)
    }

    pub fn remote_ref(&self) -> RemoteRef {
        self.remote
    }

    pub fn map(&self, function: &FunctionDescriptor) -> Result<TSet> {
        let remote = derived(
            &self.session,
            self.remote,
            TransformOp::Map,
            Some((function, FunctionKind::Map)),
        )?;
        Ok(self.derive(remote))
    }

    pub fn flat_map(&self, function: &FunctionDescriptor) -> Result<TSet> {
        let remote = derived(
            &self.session,
            self.remote,
            TransformOp::FlatMap,
            Some((function, FunctionKind::FlatMap)),
        )?;
        Ok(self.derive(remote))
    }

    /// Run a partition-wide compute function.
    pub fn compute(&self, function: &FunctionDescriptor) -> Result<TSet> {
        let remote = derived(
            &self.session,
            self.remote,
            TransformOp::Compute,
            Some((function, FunctionKind::Compute)),
        )?;
        Ok(self.derive(remote))
    }

    pub fn reduce(&self, function: &FunctionDescriptor) -> Result<TSet> {
        let remote = derived(
            &self.session,
            self.remote,
            TransformOp::Reduce,
            Some((function, FunctionKind::Reduce)),
        )?;
        Ok(self.derive(remote))
    }

    /// Turn each element into a key/value pair.
    pub fn map_to_tuple(&self, function: &FunctionDescriptor) -> Result<KeyedTSet> {
        let remote = derived(
            &self.session,
            self.remote,
            TransformOp::MapToTuple,
            Some((function, FunctionKind::MapToTuple)),
        )?;
        Ok(KeyedTSet::new(Rc::clone(&self.session), remote))
    }

    pub fn for_each(&self, sink: &FunctionDescriptor) -> Result<()> {
        apply(
            &self.session,
            self.remote,
            TransformOp::ForEach,
            Some((sink, FunctionKind::Sink)),
        )?;
        Ok(())
    }

    pub fn cache(&self) -> Result<TSet> {
        let remote = self.session.borrow_mut().cache(self.remote)?;
        Ok(self.derive(remote))
    }

    pub fn partitions(&self) -> Result<Vec<DataPartition>> {
        partitions(&self.session, self.remote)
    }
}

/// Proxy for a keyed dataset owned by the engine.
pub struct KeyedTSet {
    session: Session,
    remote: RemoteRef,
}

impl KeyedTSet {
    pub(crate) fn new(session: Session, remote: RemoteRef) -> Self {
        Self { session, remote }
    }

    fn derive(&self, remote: RemoteRef) -> KeyedTSet {
        KeyedTSet::new(Rc::clone(&self.session), remote)
    }

    pub fn remote_ref(&self) -> RemoteRef {
        self.remote
    }

    pub fn keyed_reduce(&self, function: &FunctionDescriptor) -> Result<KeyedTSet> {
        let remote = derived(
            &self.session,
            self.remote,
            TransformOp::KeyedReduce,
            Some((function, FunctionKind::Reduce)),
        )?;
        Ok(self.derive(remote))
    }

    pub fn keyed_gather(&self) -> Result<KeyedTSet> {
        let remote = derived(&self.session, self.remote, TransformOp::KeyedGather, None)?;
        Ok(self.derive(remote))
    }

    pub fn cache(&self) -> Result<KeyedTSet> {
        let remote = self.session.borrow_mut().cache(self.remote)?;
        Ok(self.derive(remote))
    }

    pub fn partitions(&self) -> Result<Vec<DataPartition>> {
        partitions(&self.session, self.remote)
    }
}
