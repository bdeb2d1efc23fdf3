use super::*;

#[tokio::test]
async fn pid_registration_is_tracked() {
    let pool = WorkerPool::new(2);
    pool.register_pid(111);
    pool.register_pid(222);
    assert_eq!(pool.live_pid_count(), 2);

    pool.unregister_pid(111);
    assert_eq!(pool.live_pid_count(), 1);
}

#[tokio::test]
async fn acquire_blocks_until_permits_are_released() {
    let pool = WorkerPool::new(1);
    let permit = pool.acquire(1).await;

    let pool2 = pool.clone();
    let mut acquired_second = tokio::spawn(async move {
        let _p = pool2.acquire(1).await;
    });

    tokio::select! {
        _ = &mut acquired_second => panic!("second acquire should not complete while first holds the only permit"),
        _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => {}
    }

    drop(permit);
    acquired_second.await.unwrap();
}

#[tokio::test]
async fn terminate_all_signals_every_tracked_pid() {
    let mut child = tokio::process::Command::new("sleep")
        .arg("5")
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();

    let pool = WorkerPool::new(4);
    pool.register_pid(pid);
    let signalled = pool.terminate_all();
    assert_eq!(signalled, vec![pid]);

    let status = tokio::time::timeout(std::time::Duration::from_secs(2), child.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(!status.success());
}
