use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};

use super::frame::{Frame, FrameType, read_frame, write_frame};
use crate::error::{GatewayError, gateway_error};
use crate::gateway::Gateway;
use crate::protocol::{Request, Response, decode_reply, encode_request};

/// Gateway over a single TCP connection.
///
/// The connection is driven by a private current-thread runtime and every
/// call blocks on one write/read exchange, so the gateway must not be used
/// from inside another tokio runtime.
///
/// A transport or framing failure drops the connection; later calls fail
/// with [`GatewayError::Closed`]. Engine faults keep it open.
pub struct TcpGateway {
    runtime: Runtime,
    stream: Option<TcpStream>,
    peer_addr: SocketAddr,
    next_call_id: u32,
}

impl TcpGateway {
    pub fn connect(peer_addr: SocketAddr) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        let stream = runtime
            .block_on(TcpStream::connect(peer_addr))
            .with_context(|| format!("failed to connect to gateway at {}", peer_addr))?;
        stream.set_nodelay(true)?;
        tracing::debug!(%peer_addr, "gateway connected");
        Ok(Self {
            runtime,
            stream: Some(stream),
            peer_addr,
            next_call_id: 1,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Gateway for TcpGateway {
    fn call(&mut self, request: Request) -> Result<Response> {
        let call_id = self.next_call_id;
        self.next_call_id = self.next_call_id.wrapping_add(1);

        let Self {
            runtime,
            stream,
            peer_addr,
            ..
        } = self;
        let conn = stream.as_mut().ok_or(GatewayError::Closed)?;

        let frame = encode_request(call_id, &request)?;
        let result = runtime
            .block_on(async {
                write_frame(conn, &frame).await?;
                read_frame(conn).await
            })
            .and_then(|reply| decode_reply(call_id, reply));

        // Only engine faults leave the exchange in step; anything else means
        // the next reply on this stream cannot be trusted.
        if let Err(err) = &result {
            if !matches!(gateway_error(err), Some(GatewayError::Remote(_))) {
                tracing::warn!(%peer_addr, call_id, "dropping gateway connection: {err:#}");
                *stream = None;
            }
        }
        result
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        let shutdown = Frame::new(FrameType::Shutdown, self.next_call_id, Vec::new());
        let result = self.runtime.block_on(async {
            write_frame(&mut stream, &shutdown).await?;
            stream.shutdown().await?;
            anyhow::Ok(())
        });
        if let Err(err) = &result {
            tracing::warn!(peer_addr = %self.peer_addr, "gateway close failed: {err}");
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/tcp_gateway_tests.rs"]
mod tests;
