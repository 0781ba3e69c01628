//! # tsetlink core
//!
//! Client-side plumbing for driving a remote dataflow engine through a
//! cross-process gateway.
//!
//! - [`types`] — the portable [`Value`](types::Value) model and
//!   [`RemoteRef`](types::RemoteRef) handles.
//! - [`function`] — [`FunctionDescriptor`](function::FunctionDescriptor), the
//!   versioned stand-in for serialized user functions.
//! - [`protocol`] — typed [`Request`](protocol::Request) /
//!   [`Response`](protocol::Response) messages and their frame encoding.
//! - [`network`] — frame codec and the [`TcpGateway`](network::TcpGateway).
//! - [`gateway`] — the [`Gateway`](gateway::Gateway) seam and an in-memory
//!   [`ScriptedGateway`](gateway::ScriptedGateway).
//! - [`client`] — [`EngineClient`](client::EngineClient), one typed method per
//!   remote operation.

pub mod client;
pub mod error;
pub mod function;
pub mod gateway;
pub mod network;
pub mod protocol;
pub mod types;

pub use error::{GatewayError, gateway_error};
