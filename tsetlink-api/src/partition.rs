use std::rc::Rc;

use anyhow::Result;
use tsetlink_core::types::{FromValue, RemoteRef, Value};

use crate::environment::Session;

/// Proxy over one partition of an engine-side dataset.
pub struct DataPartition {
    session: Session,
    remote: RemoteRef,
}

impl DataPartition {
    pub(crate) fn new(session: Session, remote: RemoteRef) -> Self {
        Self { session, remote }
    }

    pub fn remote_ref(&self) -> RemoteRef {
        self.remote
    }

    pub fn id(&self) -> Result<i32> {
        self.session.borrow_mut().get_partition_id(self.remote)
    }

    /// Open a forward-only pass over the partition's elements.
    pub fn consumer(&self) -> Result<PartitionConsumer> {
        let consumer = self.session.borrow_mut().get_consumer(self.remote)?;
        Ok(PartitionConsumer {
            session: Rc::clone(&self.session),
            consumer,
            done: false,
        })
    }

    /// First element converted to `T`, `None` when the engine has none.
    ///
    /// A `null` element counts as absent.
    pub fn first<T: FromValue>(&self) -> Result<Option<T>> {
        match self.session.borrow_mut().first(self.remote)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value).map(Some),
        }
    }

    /// Like [`first`](Self::first) but falls back to `default` when absent.
    ///
    /// A failing remote call is returned as an error, never replaced by
    /// `default`.
    pub fn first_or_default<T: FromValue>(&self, default: T) -> Result<T> {
        Ok(self.first()?.unwrap_or(default))
    }
}

/// Lazy iterator over a remote consumer.
///
/// Each `next` is one remote call. The iterator cannot be restarted and
/// stays finished after the engine reports the end or after an error.
pub struct PartitionConsumer {
    session: Session,
    consumer: RemoteRef,
    done: bool,
}

impl Iterator for PartitionConsumer {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.borrow_mut().consumer_next(self.consumer) {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for PartitionConsumer {}
