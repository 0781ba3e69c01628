#![allow(dead_code)]

use anyhow::Result;
use tsetlink_api::config::EnvironmentOptions;
use tsetlink_api::environment::{Environment, Launch};
use tsetlink_core::gateway::ScriptedGateway;
use tsetlink_core::protocol::{Request, Response};
use tsetlink_core::types::RemoteRef;

pub const REGISTRY: RemoteRef = RemoteRef(1);

/// Open a session over a scripted gateway. The `functions` lookup made during
/// construction is answered here; every other request goes to `responder`.
pub fn session<F>(mut responder: F) -> (Environment, ScriptedGateway)
where
    F: FnMut(&Request) -> Result<Response> + 'static,
{
    let gateway = ScriptedGateway::new(move |request| match request {
        Request::Functions => Ok(Response::Functions {
            registry: REGISTRY,
            names: vec!["identity".to_string(), "int_comparator".to_string()],
        }),
        other => responder(other),
    });
    let env = match Environment::launch(gateway.clone(), false, EnvironmentOptions::default()) {
        Ok(Launch::Session(env)) => env,
        Ok(Launch::Submitted) => panic!("session leg must not submit"),
        Err(err) => panic!("launch failed: {err:#}"),
    };
    (env, gateway)
}

/// Requests made after the initial `functions` lookup.
pub fn calls_after_setup(gateway: &ScriptedGateway) -> Vec<Request> {
    let calls = gateway.calls();
    assert_eq!(calls.first(), Some(&Request::Functions));
    calls.into_iter().skip(1).collect()
}
