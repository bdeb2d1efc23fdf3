use super::*;
use pe_core::fake::FakeServerProxy;

#[tokio::test]
async fn happy_path_runs_two_stages_then_shuts_down() {
    let fake = FakeServerProxy::new(vec![
        Verb::RunStage(StageId::new(1)),
        Verb::RunStage(StageId::new(2)),
        Verb::ShutdownNormally,
    ])
    .with_stage(StageId::new(1), "/bin/true", "/dev/null", 3.0, 1)
    .with_stage(StageId::new(2), "/bin/true", "/dev/null", 3.0, 1);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake.clone());
    let pool = WorkerPool::new(2);

    let mut main_loop = MainLoop::new(
        proxy,
        "tcp://client:1".into(),
        pool,
        6.0,
        2,
        None,
        None,
        Duration::from_millis(20),
        Instant::now(),
    );

    let reason = tokio::time::timeout(std::time::Duration::from_secs(5), main_loop.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reason, StopReason::ShutdownNormally);

    let started = fake
        .calls()
        .iter()
        .filter(|c| matches!(c, pe_core::fake::ServerCall::StageStarted(_)))
        .count();
    let finished = fake
        .calls()
        .iter()
        .filter(|c| matches!(c, pe_core::fake::ServerCall::StageFinished(_)))
        .count();
    assert_eq!(started, 2);
    assert_eq!(finished, 2);
    assert_eq!(main_loop.ledger().mem_in_use(), 0.0);
    assert_eq!(main_loop.running_count(), 0);
}

#[tokio::test]
async fn failing_stage_is_reported_failed_and_resources_are_released() {
    let fake = FakeServerProxy::new(vec![Verb::RunStage(StageId::new(7)), Verb::ShutdownNormally])
        .with_stage(StageId::new(7), "/bin/false", "/dev/null", 1.0, 1);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake.clone());
    let pool = WorkerPool::new(2);

    let mut main_loop = MainLoop::new(
        proxy,
        "tcp://client:1".into(),
        pool,
        6.0,
        2,
        None,
        None,
        Duration::from_millis(20),
        Instant::now(),
    );

    let reason = tokio::time::timeout(std::time::Duration::from_secs(5), main_loop.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reason, StopReason::ShutdownNormally);
    assert!(fake
        .calls()
        .iter()
        .any(|c| matches!(c, pe_core::fake::ServerCall::StageFailed(id) if *id == StageId::new(7))));
    assert_eq!(main_loop.ledger().mem_in_use(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn idle_timeout_stops_gracefully_with_no_children() {
    let fake = FakeServerProxy::new(vec![Verb::Wait]);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake);
    let pool = WorkerPool::new(2);

    let mut main_loop = MainLoop::new(
        proxy,
        "tcp://client:1".into(),
        pool,
        6.0,
        2,
        Some(Duration::from_millis(25)),
        None,
        Duration::from_millis(10),
        Instant::now(),
    );

    let handle = tokio::spawn(async move { main_loop.run().await });

    for _ in 0..10 {
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
    }

    let reason = tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reason, StopReason::IdleTimeout);
}

#[tokio::test(start_paused = true)]
async fn drain_deadline_stops_accepting_new_work() {
    let fake = FakeServerProxy::new(vec![Verb::Wait]);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake);
    let pool = WorkerPool::new(2);

    let mut main_loop = MainLoop::new(
        proxy,
        "tcp://client:1".into(),
        pool,
        6.0,
        2,
        None,
        Some(Duration::from_millis(25)),
        Duration::from_millis(10),
        Instant::now(),
    );

    let handle = tokio::spawn(async move { main_loop.run().await });

    for _ in 0..10 {
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
    }

    let reason = tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reason, StopReason::Drained);
}
