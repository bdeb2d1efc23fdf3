use super::*;
use clap::Parser;
use pe_core::fake::{FakeServerProxy, ServerCall};
use pe_core::Verb;

fn config(args: &[&str]) -> Config {
    let mut full = vec!["pipeline-executor"];
    full.extend_from_slice(args);
    Config::from_cli(&crate::cli::Cli::parse_from(full)).unwrap()
}

#[tokio::test]
async fn bring_up_registers_with_reported_mem_total() {
    let cfg = config(&["--local", "--num-executors", "1", "--mem", "4"]);
    let fake = FakeServerProxy::new(vec![]);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake.clone());

    let (client_uri, registered) = bring_up(&cfg, proxy).await.unwrap();

    assert!(!client_uri.is_empty());
    assert!(registered.load(Ordering::SeqCst));
    assert!(fake
        .calls()
        .iter()
        .any(|c| matches!(c, ServerCall::RegisterClient { mem, .. } if *mem == 4.0)));
}

#[tokio::test]
async fn graceful_teardown_unsets_registered_before_unregistering() {
    let fake = FakeServerProxy::new(vec![]);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake.clone());
    let registered: heartbeat::Registered = Arc::new(AtomicBool::new(true));

    graceful_teardown(&proxy, "tcp://c:1", &registered).await;

    assert!(!registered.load(Ordering::SeqCst));
    assert!(fake
        .calls()
        .iter()
        .any(|c| matches!(c, ServerCall::UnregisterClient { .. })));
}

#[tokio::test]
async fn abrupt_teardown_signals_pool_and_unregisters() {
    let fake = FakeServerProxy::new(vec![]);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake.clone());
    let registered: heartbeat::Registered = Arc::new(AtomicBool::new(true));
    let pool = WorkerPool::new(2);

    let mut child = tokio::process::Command::new("sleep")
        .arg("5")
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();
    pool.register_pid(pid);

    abrupt_teardown(&proxy, "tcp://c:1", &registered, &pool).await;

    let status = child.wait().await.unwrap();
    assert!(!status.success());
    assert!(!registered.load(Ordering::SeqCst));
    assert!(fake
        .calls()
        .iter()
        .any(|c| matches!(c, ServerCall::UnregisterClient { .. })));
}

#[tokio::test]
async fn run_one_stops_gracefully_on_idle_timeout() {
    let cfg = config(&[
        "--local",
        "--num-executors",
        "1",
        "--mem",
        "6",
        "--proc",
        "2",
        "--time-to-seppuku",
        "0.001",
    ]);
    let fake = FakeServerProxy::new(vec![Verb::Wait]);
    let proxy: Arc<dyn ServerProxy> = Arc::new(fake.clone());

    let disposition = tokio::time::timeout(std::time::Duration::from_secs(15), run_one(cfg, proxy))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(disposition, ExitDisposition::Clean);
    assert!(fake
        .calls()
        .iter()
        .any(|c| matches!(c, ServerCall::UnregisterClient { .. })));
}
