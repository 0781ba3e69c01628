//! Typed engine client.
//!
//! One method per remote operation. Each method issues exactly one request
//! and decodes the one response shape that operation is allowed to return;
//! errors from the gateway are returned as they are.

use anyhow::Result;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::protocol::{Request, Response, TransformOp};
use crate::types::{ComputeResource, RemoteRef, Value};

/// Handle plus names returned by the predefined-function lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionsHandle {
    pub registry: RemoteRef,
    pub names: Vec<String>,
}

pub struct EngineClient {
    gateway: Box<dyn Gateway>,
}

fn unexpected(request: &'static str, response: Response) -> anyhow::Error {
    GatewayError::UnexpectedResponse {
        request,
        response: format!("{:?}", response),
    }
    .into()
}

impl EngineClient {
    pub fn new(gateway: impl Gateway + 'static) -> Self {
        Self {
            gateway: Box::new(gateway),
        }
    }

    fn call(&mut self, request: Request) -> Result<(&'static str, Response)> {
        let name = request.name();
        tracing::debug!(call = name, "gateway call");
        let response = self.gateway.call(request)?;
        Ok((name, response))
    }

    fn call_ack(&mut self, request: Request) -> Result<()> {
        match self.call(request)? {
            (_, Response::Ack) => Ok(()),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    fn call_ref(&mut self, request: Request) -> Result<RemoteRef> {
        match self.call(request)? {
            (_, Response::Ref(remote)) => Ok(remote),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    fn call_element(&mut self, request: Request) -> Result<Option<Value>> {
        match self.call(request)? {
            (_, Response::Element(element)) => Ok(element),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn add_config(&mut self, key: &str, value: Value) -> Result<()> {
        self.call_ack(Request::AddConfig {
            key: key.to_string(),
            value,
        })
    }

    pub fn get_config(&mut self) -> Result<Vec<(String, Value)>> {
        match self.call(Request::GetConfig)? {
            (_, Response::Config(entries)) => Ok(entries),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn set_job_name(&mut self, name: &str) -> Result<()> {
        self.call_ack(Request::SetJobName {
            name: name.to_string(),
        })
    }

    pub fn create_compute_resource(&mut self, resource: &ComputeResource) -> Result<()> {
        self.call_ack(Request::CreateComputeResource {
            cpu: resource.cpu,
            ram_mb: resource.ram_mb,
            instances: resource.instances,
        })
    }

    pub fn commit(&mut self) -> Result<()> {
        self.call_ack(Request::Commit)
    }

    pub fn get_worker_id(&mut self) -> Result<i32> {
        match self.call(Request::GetWorkerId)? {
            (_, Response::WorkerId(id)) => Ok(id),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn functions(&mut self) -> Result<FunctionsHandle> {
        match self.call(Request::Functions)? {
            (_, Response::Functions { registry, names }) => Ok(FunctionsHandle { registry, names }),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn build_comparator(&mut self, registry: RemoteRef, function: Vec<u8>) -> Result<RemoteRef> {
        self.call_ref(Request::BuildComparator { registry, function })
    }

    pub fn create_source(&mut self, function: Vec<u8>, parallelism: u32) -> Result<RemoteRef> {
        self.call_ref(Request::CreateSource {
            function,
            parallelism,
        })
    }

    pub fn create_keyed_source(&mut self, function: Vec<u8>, parallelism: u32) -> Result<RemoteRef> {
        self.call_ref(Request::CreateKeyedSource {
            function,
            parallelism,
        })
    }

    pub fn parallelize(&mut self, collection: Value, parallelism: u32) -> Result<RemoteRef> {
        self.call_ref(Request::Parallelize {
            collection,
            parallelism,
        })
    }

    pub fn parallelize_with_comparator(
        &mut self,
        collection: Value,
        comparator: RemoteRef,
        parallelism: u32,
    ) -> Result<RemoteRef> {
        self.call_ref(Request::ParallelizeWithComparator {
            collection,
            comparator,
            parallelism,
        })
    }

    /// Apply `op` to the dataset `target`. `ForEach` is terminal and returns
    /// `None`; every other operation yields the new dataset's reference.
    pub fn transform(
        &mut self,
        target: RemoteRef,
        op: TransformOp,
        function: Option<Vec<u8>>,
    ) -> Result<Option<RemoteRef>> {
        match self.call(Request::Transform {
            target,
            op,
            function,
        })? {
            (_, Response::Ref(remote)) if op != TransformOp::ForEach => Ok(Some(remote)),
            (_, Response::Ack) if op == TransformOp::ForEach => Ok(None),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn cache(&mut self, target: RemoteRef) -> Result<RemoteRef> {
        self.call_ref(Request::Cache { target })
    }

    pub fn get_partitions(&mut self, target: RemoteRef) -> Result<Vec<RemoteRef>> {
        match self.call(Request::GetPartitions { target })? {
            (_, Response::Refs(refs)) => Ok(refs),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn get_partition_id(&mut self, partition: RemoteRef) -> Result<i32> {
        match self.call(Request::GetPartitionId { partition })? {
            (_, Response::PartitionId(id)) => Ok(id),
            (name, other) => Err(unexpected(name, other)),
        }
    }

    pub fn get_consumer(&mut self, partition: RemoteRef) -> Result<RemoteRef> {
        self.call_ref(Request::GetConsumer { partition })
    }

    /// Next element of a remote consumer, `None` once it is exhausted.
    pub fn consumer_next(&mut self, consumer: RemoteRef) -> Result<Option<Value>> {
        self.call_element(Request::ConsumerNext { consumer })
    }

    pub fn first(&mut self, partition: RemoteRef) -> Result<Option<Value>> {
        self.call_element(Request::First { partition })
    }

    pub fn get_mpi_intercom(&mut self) -> Result<RemoteRef> {
        self.call_ref(Request::GetMpiIntercom)
    }

    pub fn close(&mut self) -> Result<()> {
        tracing::debug!("closing gateway");
        self.gateway.close()
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
