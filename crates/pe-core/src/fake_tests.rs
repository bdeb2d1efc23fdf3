use super::*;
use crate::proxy::Verb;

#[tokio::test]
async fn scripted_verbs_are_returned_in_order_then_repeat_last() {
    let fake = FakeServerProxy::new(vec![
        Verb::RunStage(StageId::new(1)),
        Verb::ShutdownNormally,
    ]);

    assert_eq!(
        fake.get_command("c", 1.0, 1).await.unwrap(),
        Verb::RunStage(StageId::new(1))
    );
    assert_eq!(
        fake.get_command("c", 1.0, 1).await.unwrap(),
        Verb::ShutdownNormally
    );
    assert_eq!(
        fake.get_command("c", 1.0, 1).await.unwrap(),
        Verb::ShutdownNormally
    );
}

#[tokio::test]
async fn stage_metadata_is_served_from_with_stage() {
    let fake = FakeServerProxy::new(vec![]).with_stage(
        StageId::new(7),
        "/bin/false",
        "/tmp/stage-7.log",
        3.0,
        1,
    );

    assert_eq!(fake.get_stage_command(StageId::new(7)).await.unwrap(), "/bin/false");
    assert_eq!(fake.get_stage_mem(StageId::new(7)).await.unwrap(), 3.0);
    assert_eq!(fake.get_stage_procs(StageId::new(7)).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_stage_is_a_fatal_error() {
    let fake = FakeServerProxy::new(vec![]);
    let err = fake.get_stage_command(StageId::new(99)).await.unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn calls_are_recorded_in_order() {
    let fake = FakeServerProxy::new(vec![]);
    fake.register_client("c", 4.0).await.unwrap();
    fake.set_stage_started(StageId::new(1), "c").await.unwrap();
    fake.set_stage_finished(StageId::new(1), "c").await.unwrap();
    fake.unregister_client("c").await.unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[0], ServerCall::RegisterClient { .. }));
    assert!(matches!(calls[1], ServerCall::StageStarted(id) if id == StageId::new(1)));
    assert!(matches!(calls[2], ServerCall::StageFinished(id) if id == StageId::new(1)));
    assert!(matches!(calls[3], ServerCall::UnregisterClient { .. }));
}

#[tokio::test]
async fn heartbeat_failure_is_injectable() {
    let fake = FakeServerProxy::new(vec![]);
    fake.fail_heartbeat(TransportError::Transient("server unreachable".into()));
    let err = fake.update_client_timestamp("c").await.unwrap_err();
    assert!(!err.is_fatal());
}
