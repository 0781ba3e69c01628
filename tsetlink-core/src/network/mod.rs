//! Frame codec and TCP transport for the gateway connection.

pub mod frame;
pub mod tcp_gateway;

pub use frame::*;
pub use tcp_gateway::*;
