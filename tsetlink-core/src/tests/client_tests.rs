use super::*;
use crate::error::gateway_error;
use crate::gateway::ScriptedGateway;

#[test]
fn test_each_call_is_one_request() {
    let gateway = ScriptedGateway::new(|request| match request {
        Request::GetWorkerId => Ok(Response::WorkerId(4)),
        Request::CreateSource { .. } => Ok(Response::Ref(RemoteRef(12))),
        _ => Ok(Response::Ack),
    });
    let mut client = EngineClient::new(gateway.clone());

    client.add_config("twister2.wait", Value::from(true)).unwrap();
    assert_eq!(client.get_worker_id().unwrap(), 4);
    assert_eq!(
        client.create_source(vec![1, 2], 3).unwrap(),
        RemoteRef(12)
    );

    assert_eq!(
        gateway.calls(),
        vec![
            Request::AddConfig {
                key: "twister2.wait".to_string(),
                value: Value::Bool(true),
            },
            Request::GetWorkerId,
            Request::CreateSource {
                function: vec![1, 2],
                parallelism: 3,
            },
        ]
    );
}

#[test]
fn test_unexpected_response_shape_is_reported() {
    let gateway = ScriptedGateway::acking();
    let mut client = EngineClient::new(gateway);

    let err = client.get_worker_id().unwrap_err();
    match gateway_error(&err) {
        Some(GatewayError::UnexpectedResponse { request, response }) => {
            assert_eq!(*request, "getWorkerId");
            assert_eq!(response, "Ack");
        }
        other => panic!("expected UnexpectedResponse, got {other:?}"),
    }
}

#[test]
fn test_remote_errors_propagate_unmodified() {
    let gateway = ScriptedGateway::new(|_| {
        Err(GatewayError::Remote("partition 3 is not cached".to_string()).into())
    });
    let mut client = EngineClient::new(gateway);

    let err = client.first(RemoteRef(1)).unwrap_err();
    assert_eq!(
        gateway_error(&err),
        Some(&GatewayError::Remote("partition 3 is not cached".to_string()))
    );
}

#[test]
fn test_transform_for_each_expects_ack() {
    let gateway = ScriptedGateway::new(|request| match request {
        Request::Transform {
            op: TransformOp::ForEach,
            ..
        } => Ok(Response::Ack),
        _ => Ok(Response::Ref(RemoteRef(8))),
    });
    let mut client = EngineClient::new(gateway);

    assert_eq!(
        client
            .transform(RemoteRef(1), TransformOp::ForEach, Some(vec![]))
            .unwrap(),
        None
    );
    assert_eq!(
        client
            .transform(RemoteRef(1), TransformOp::Map, Some(vec![]))
            .unwrap(),
        Some(RemoteRef(8))
    );
}

#[test]
fn test_transform_rejects_ref_for_terminal_op() {
    let gateway = ScriptedGateway::new(|_| Ok(Response::Ref(RemoteRef(8))));
    let mut client = EngineClient::new(gateway);

    let err = client
        .transform(RemoteRef(1), TransformOp::ForEach, None)
        .unwrap_err();
    assert!(matches!(
        gateway_error(&err),
        Some(GatewayError::UnexpectedResponse { .. })
    ));
}

#[test]
fn test_close_closes_gateway() {
    let gateway = ScriptedGateway::acking();
    let mut client = EngineClient::new(gateway.clone());
    client.close().unwrap();
    assert!(gateway.is_closed());

    let err = client.commit().unwrap_err();
    assert_eq!(gateway_error(&err), Some(&GatewayError::Closed));
}
