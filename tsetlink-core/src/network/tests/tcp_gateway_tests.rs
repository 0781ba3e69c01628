use std::thread::{self, JoinHandle};

use super::*;
use crate::error::gateway_error;
use crate::protocol::{decode_request, encode_fault, encode_response};
use crate::types::{RemoteRef, Value};

type Handler = fn(&Request) -> std::result::Result<Response, String>;

/// Serves one connection on a background thread until a shutdown frame
/// arrives, returning the requests it saw.
fn spawn_engine(handler: Handler) -> (SocketAddr, JoinHandle<Vec<Request>>) {
    let runtime = Builder::new_current_thread().enable_all().build().unwrap();
    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        runtime.block_on(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut seen = Vec::new();
            loop {
                let frame = match read_frame(&mut stream).await {
                    Ok(frame) => frame,
                    Err(_) => break,
                };
                if frame.frame_type == FrameType::Shutdown {
                    break;
                }
                let (call_id, request) = decode_request(&frame).unwrap();
                let reply = match handler(&request) {
                    Ok(response) => encode_response(call_id, &response).unwrap(),
                    Err(message) => encode_fault(call_id, message).unwrap(),
                };
                seen.push(request);
                write_frame(&mut stream, &reply).await.unwrap();
            }
            seen
        })
    });
    (addr, handle)
}

fn engine(request: &Request) -> std::result::Result<Response, String> {
    match request {
        Request::GetWorkerId => Ok(Response::WorkerId(3)),
        Request::Parallelize { .. } => Ok(Response::Ref(RemoteRef(100))),
        Request::Commit => Err("job already committed".to_string()),
        _ => Ok(Response::Ack),
    }
}

#[test]
fn test_tcp_gateway_roundtrip() {
    let (addr, server) = spawn_engine(engine);
    let mut gateway = TcpGateway::connect(addr).unwrap();
    assert_eq!(gateway.peer_addr(), addr);

    assert_eq!(
        gateway.call(Request::GetWorkerId).unwrap(),
        Response::WorkerId(3)
    );
    let request = Request::Parallelize {
        collection: Value::from(vec![1, 2, 3]),
        parallelism: 2,
    };
    assert_eq!(
        gateway.call(request.clone()).unwrap(),
        Response::Ref(RemoteRef(100))
    );

    gateway.close().unwrap();
    let seen = server.join().unwrap();
    assert_eq!(seen, vec![Request::GetWorkerId, request]);
}

#[test]
fn test_tcp_gateway_surfaces_remote_fault() {
    let (addr, server) = spawn_engine(engine);
    let mut gateway = TcpGateway::connect(addr).unwrap();

    let err = gateway.call(Request::Commit).unwrap_err();
    assert_eq!(
        gateway_error(&err),
        Some(&GatewayError::Remote("job already committed".to_string()))
    );

    // The connection stays usable after a remote fault.
    assert_eq!(
        gateway.call(Request::GetWorkerId).unwrap(),
        Response::WorkerId(3)
    );
    gateway.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_tcp_gateway_drops_connection_after_out_of_step_reply() {
    let runtime = Builder::new_current_thread().enable_all().build().unwrap();
    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        runtime.block_on(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let frame = read_frame(&mut stream).await.unwrap();
            let reply = encode_response(frame.call_id, &Response::WorkerId(3)).unwrap();
            // The first call is answered twice.
            write_frame(&mut stream, &reply).await.unwrap();
            write_frame(&mut stream, &reply).await.unwrap();
            while read_frame(&mut stream).await.is_ok() {}
        })
    });

    let mut gateway = TcpGateway::connect(addr).unwrap();
    assert_eq!(
        gateway.call(Request::GetWorkerId).unwrap(),
        Response::WorkerId(3)
    );

    let err = gateway.call(Request::GetWorkerId).unwrap_err();
    assert!(matches!(
        gateway_error(&err),
        Some(GatewayError::Protocol(message)) if message.contains("while waiting for call 2")
    ));
    assert!(!gateway.is_open());

    let err = gateway.call(Request::GetWorkerId).unwrap_err();
    assert_eq!(gateway_error(&err), Some(&GatewayError::Closed));
    server.join().unwrap();
}

#[test]
fn test_tcp_gateway_drops_connection_when_engine_hangs_up() {
    let runtime = Builder::new_current_thread().enable_all().build().unwrap();
    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        runtime.block_on(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_frame(&mut stream).await.unwrap();
        })
    });

    let mut gateway = TcpGateway::connect(addr).unwrap();
    assert!(gateway.call(Request::GetWorkerId).is_err());
    assert!(!gateway.is_open());
    server.join().unwrap();

    let err = gateway.call(Request::Commit).unwrap_err();
    assert_eq!(gateway_error(&err), Some(&GatewayError::Closed));
}

#[test]
fn test_tcp_gateway_rejects_calls_after_close() {
    let (addr, server) = spawn_engine(engine);
    let mut gateway = TcpGateway::connect(addr).unwrap();
    gateway.close().unwrap();
    assert!(!gateway.is_open());
    server.join().unwrap();

    let err = gateway.call(Request::GetWorkerId).unwrap_err();
    assert_eq!(gateway_error(&err), Some(&GatewayError::Closed));
    // Closing twice is a no-op.
    gateway.close().unwrap();
}

#[test]
fn test_tcp_gateway_connect_failure_names_address() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = TcpGateway::connect(addr).err().unwrap();
    assert!(err.to_string().contains(&addr.to_string()));
}
