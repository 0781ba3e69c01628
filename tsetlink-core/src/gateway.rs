//! The seam between typed engine calls and the transport carrying them.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::error::GatewayError;
use crate::protocol::{Request, Response};

/// A blocking request/response connection to the engine.
///
/// Each call waits for the engine's reply before returning. There is no
/// timeout: a call the engine never answers blocks the caller.
pub trait Gateway {
    fn call(&mut self, request: Request) -> Result<Response>;

    /// Close the connection. Further calls fail with [`GatewayError::Closed`].
    fn close(&mut self) -> Result<()>;
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn call(&mut self, request: Request) -> Result<Response> {
        (**self).call(request)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

type Responder = Box<dyn FnMut(&Request) -> Result<Response>>;

struct ScriptedInner {
    calls: Vec<Request>,
    responder: Responder,
    closed: bool,
}

/// In-memory gateway that records every request and answers through a
/// closure. Clones share the same log, so a copy kept by the caller can
/// inspect what a consumed gateway was asked.
#[derive(Clone)]
pub struct ScriptedGateway {
    inner: Rc<RefCell<ScriptedInner>>,
}

impl ScriptedGateway {
    pub fn new<F>(responder: F) -> Self
    where
        F: FnMut(&Request) -> Result<Response> + 'static,
    {
        Self {
            inner: Rc::new(RefCell::new(ScriptedInner {
                calls: Vec::new(),
                responder: Box::new(responder),
                closed: false,
            })),
        }
    }

    /// A gateway that acknowledges every request.
    pub fn acking() -> Self {
        Self::new(|_| Ok(Response::Ack))
    }

    pub fn calls(&self) -> Vec<Request> {
        self.inner.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }
}

impl Gateway for ScriptedGateway {
    fn call(&mut self, request: Request) -> Result<Response> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.closed {
            return Err(GatewayError::Closed.into());
        }
        inner.calls.push(request.clone());
        (inner.responder)(&request)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.borrow_mut().closed = true;
        Ok(())
    }
}
