//! Function descriptors submitted in place of serialized callables.
//!
//! A descriptor names an entry in the engine's function registry and carries
//! the parameters that entry is instantiated with.

use std::fmt;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::types::Value;

/// Version of the byte envelope produced by [`FunctionDescriptor::to_bytes`].
pub const DESCRIPTOR_FORMAT_VERSION: u16 = 1;

/// Role a function plays inside a dataset pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Source,
    Map,
    FlatMap,
    MapToTuple,
    Compute,
    Reduce,
    Sink,
    Comparator,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionKind::Source => "source",
            FunctionKind::Map => "map",
            FunctionKind::FlatMap => "flat_map",
            FunctionKind::MapToTuple => "map_to_tuple",
            FunctionKind::Compute => "compute",
            FunctionKind::Reduce => "reduce",
            FunctionKind::Sink => "sink",
            FunctionKind::Comparator => "comparator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDescriptor {
    pub kind: FunctionKind,
    pub name: String,
    pub version: u32,
    pub params: Vec<(String, Value)>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u16,
    descriptor: FunctionDescriptor,
}

impl FunctionDescriptor {
    pub fn new(kind: FunctionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            version: 1,
            params: Vec::new(),
        }
    }

    pub fn source(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::Source, name)
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::Map, name)
    }

    pub fn flat_map(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::FlatMap, name)
    }

    pub fn map_to_tuple(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::MapToTuple, name)
    }

    pub fn compute(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::Compute, name)
    }

    pub fn reduce(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::Reduce, name)
    }

    pub fn sink(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::Sink, name)
    }

    pub fn comparator(name: impl Into<String>) -> Self {
        Self::new(FunctionKind::Comparator, name)
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Check the descriptor can be used where a function of `expected` kind
    /// is required. Fails with [`GatewayError::InvalidArgument`].
    pub fn ensure_kind(&self, expected: FunctionKind) -> Result<()> {
        if self.kind != expected {
            return Err(GatewayError::invalid_argument(format!(
                "function '{}' is a {} function, expected a {} function",
                self.name, self.kind, expected
            ))
            .into());
        }
        if self.name.trim().is_empty() {
            return Err(GatewayError::invalid_argument(format!(
                "{} function has an empty name",
                expected
            ))
            .into());
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let envelope = Envelope {
            format_version: DESCRIPTOR_FORMAT_VERSION,
            descriptor: self.clone(),
        };
        Ok(bincode::serialize(&envelope)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let envelope: Envelope = bincode::deserialize(data)?;
        if envelope.format_version != DESCRIPTOR_FORMAT_VERSION {
            return Err(anyhow!(
                "unsupported function descriptor format version {}",
                envelope.format_version
            ));
        }
        Ok(envelope.descriptor)
    }
}

#[cfg(test)]
#[path = "tests/function_tests.rs"]
mod tests;
