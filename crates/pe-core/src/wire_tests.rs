use super::*;
use crate::proxy::Verb;
use crate::StageId;

#[test]
fn encode_decode_round_trip() {
    let req = Request::GetStageCommand {
        stage: StageId::new(7),
    };
    let bytes = encode(&req).unwrap();
    let decoded: Request = decode(&bytes).unwrap();
    match decoded {
        Request::GetStageCommand { stage } => assert_eq!(stage, StageId::new(7)),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn encode_rejects_oversized_payload() {
    let huge = Response::Text("x".repeat(MAX_MESSAGE_SIZE + 1));
    let err = encode(&huge).unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn write_then_read_message_round_trips() {
    let (mut a, mut b) = tokio::io::duplex(4096);
    write_message(&mut a, b"hello").await.unwrap();

    let msg = read_message(&mut b).await.unwrap();
    assert_eq!(msg, b"hello");
}

#[tokio::test]
async fn read_message_reports_connection_closed_on_empty_stream() {
    let (a, mut b) = tokio::io::duplex(4096);
    drop(a);
    let err = read_message(&mut b).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn call_sends_request_and_reads_response() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let server_task = tokio::spawn(async move {
        let bytes = read_message(&mut server).await.unwrap();
        let req: Request = decode(&bytes).unwrap();
        assert!(matches!(req, Request::GetCommand { .. }));
        let resp = encode(&Response::Command(Verb::Wait)).unwrap();
        write_message(&mut server, &resp).await.unwrap();
    });

    let response = call(
        &mut client,
        &Request::GetCommand {
            client_uri: "tcp://host:1".to_string(),
            mem_free: 1.0,
            procs_free: 1,
        },
        std::time::Duration::from_secs(1),
    )
    .await
    .unwrap();

    assert!(matches!(response, Response::Command(Verb::Wait)));
    server_task.await.unwrap();
}
