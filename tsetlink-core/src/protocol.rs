//! Typed requests and responses carried over the gateway.
//!
//! Every remote operation of the engine has exactly one [`Request`] variant.
//! Payloads are bincode encoded inside [`Frame`]s; faults raised by the
//! engine travel as [`FrameType::Error`] frames with a [`RemoteFault`] body.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::network::frame::{Frame, FrameType};
use crate::types::{RemoteRef, Value};

/// Dataset operation forwarded through [`Request::Transform`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransformOp {
    Map,
    FlatMap,
    MapToTuple,
    Compute,
    Reduce,
    ForEach,
    KeyedReduce,
    KeyedGather,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Request {
    AddConfig {
        key: String,
        value: Value,
    },
    GetConfig,
    SetJobName {
        name: String,
    },
    CreateComputeResource {
        cpu: f64,
        ram_mb: u32,
        instances: u32,
    },
    Commit,
    GetWorkerId,
    Functions,
    BuildComparator {
        registry: RemoteRef,
        function: Vec<u8>,
    },
    CreateSource {
        function: Vec<u8>,
        parallelism: u32,
    },
    CreateKeyedSource {
        function: Vec<u8>,
        parallelism: u32,
    },
    Parallelize {
        collection: Value,
        parallelism: u32,
    },
    ParallelizeWithComparator {
        collection: Value,
        comparator: RemoteRef,
        parallelism: u32,
    },
    Transform {
        target: RemoteRef,
        op: TransformOp,
        function: Option<Vec<u8>>,
    },
    Cache {
        target: RemoteRef,
    },
    GetPartitions {
        target: RemoteRef,
    },
    GetPartitionId {
        partition: RemoteRef,
    },
    GetConsumer {
        partition: RemoteRef,
    },
    ConsumerNext {
        consumer: RemoteRef,
    },
    First {
        partition: RemoteRef,
    },
    GetMpiIntercom,
}

impl Request {
    /// Remote operation name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Request::AddConfig { .. } => "addConfig",
            Request::GetConfig => "getConfig",
            Request::SetJobName { .. } => "setJobName",
            Request::CreateComputeResource { .. } => "createComputeResource",
            Request::Commit => "commit",
            Request::GetWorkerId => "getWorkerId",
            Request::Functions => "functions",
            Request::BuildComparator { .. } => "buildComparator",
            Request::CreateSource { .. } => "createSource",
            Request::CreateKeyedSource { .. } => "createKeyedSource",
            Request::Parallelize { .. } => "parallelize",
            Request::ParallelizeWithComparator { .. } => "parallelizeWithComparator",
            Request::Transform { .. } => "transform",
            Request::Cache { .. } => "cache",
            Request::GetPartitions { .. } => "getPartitions",
            Request::GetPartitionId { .. } => "getPartitionId",
            Request::GetConsumer { .. } => "getConsumer",
            Request::ConsumerNext { .. } => "consumerNext",
            Request::First { .. } => "first",
            Request::GetMpiIntercom => "getMPIIntercom",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Response {
    Ack,
    Config(Vec<(String, Value)>),
    WorkerId(i32),
    Functions {
        registry: RemoteRef,
        names: Vec<String>,
    },
    Ref(RemoteRef),
    Refs(Vec<RemoteRef>),
    PartitionId(i32),
    /// An element, or `None` when there is nothing to return.
    Element(Option<Value>),
}

/// Body of an error frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFault {
    pub message: String,
}

pub fn encode_request(call_id: u32, request: &Request) -> Result<Frame> {
    let payload = bincode::serialize(request)?;
    Ok(Frame::new(FrameType::Request, call_id, payload))
}

pub fn decode_request(frame: &Frame) -> Result<(u32, Request)> {
    if frame.frame_type != FrameType::Request {
        return Err(GatewayError::protocol(format!(
            "expected request frame, got {:?}",
            frame.frame_type
        ))
        .into());
    }
    Ok((frame.call_id, bincode::deserialize(&frame.payload)?))
}

pub fn encode_response(call_id: u32, response: &Response) -> Result<Frame> {
    let payload = bincode::serialize(response)?;
    Ok(Frame::new(FrameType::Response, call_id, payload))
}

pub fn encode_fault(call_id: u32, message: impl Into<String>) -> Result<Frame> {
    let fault = RemoteFault {
        message: message.into(),
    };
    Ok(Frame::new(
        FrameType::Error,
        call_id,
        bincode::serialize(&fault)?,
    ))
}

/// Decode the reply to the call `expected_call_id`.
///
/// Error frames become [`GatewayError::Remote`] carrying the engine's
/// message unmodified.
pub fn decode_reply(expected_call_id: u32, frame: Frame) -> Result<Response> {
    if frame.call_id != expected_call_id {
        return Err(GatewayError::protocol(format!(
            "reply for call {} while waiting for call {}",
            frame.call_id, expected_call_id
        ))
        .into());
    }
    match frame.frame_type {
        FrameType::Response => Ok(bincode::deserialize(&frame.payload)?),
        FrameType::Error => {
            let fault: RemoteFault = bincode::deserialize(&frame.payload)?;
            Err(GatewayError::Remote(fault.message).into())
        }
        other => Err(GatewayError::protocol(format!("unexpected {:?} frame in reply", other)).into()),
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
