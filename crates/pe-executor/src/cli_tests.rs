use super::*;

#[test]
fn parses_minimal_local_invocation() {
    let cli = Cli::parse_from(["pipeline-executor", "--local", "--uri-file", "/tmp/x_uri"]);
    assert!(cli.local);
    assert_eq!(cli.uri_file, Some(PathBuf::from("/tmp/x_uri")));
    assert_eq!(cli.num_executors, -1);
    assert_eq!(cli.heartbeat_escalate_after, 0);
}

#[test]
fn parses_legacy_batch_flags_without_rejecting_them() {
    let cli = Cli::parse_from([
        "pipeline-executor",
        "--local",
        "--max-failed-executors",
        "3",
        "--no-monitor-heartbeats",
        "--queue-type",
        "sge",
        "--ppn",
        "8",
    ]);
    assert_eq!(cli.max_failed_executors, Some(3));
    assert!(cli.no_monitor_heartbeats);
    assert_eq!(cli.ppn, Some(8));
}
