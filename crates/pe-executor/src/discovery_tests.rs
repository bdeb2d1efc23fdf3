use super::*;
use std::io::Write;

struct FakeResolver(Option<String>);

#[async_trait::async_trait]
impl NameServiceResolver for FakeResolver {
    async fn resolve(&self, _key: &str) -> Result<String, ExecutorError> {
        self.0
            .clone()
            .ok_or_else(|| ExecutorError::Discovery("not found".into()))
    }
}

#[tokio::test]
async fn uri_file_discovery_reads_first_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo_uri");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "tcp://10.0.0.1:9000").unwrap();
    writeln!(f, "ignored second line").unwrap();

    let discovery = Discovery::UriFile(path);
    let resolver = FakeResolver(None);
    let uri = discovery.resolve(&resolver).await.unwrap();
    assert_eq!(uri, "tcp://10.0.0.1:9000");
}

#[tokio::test]
async fn uri_file_discovery_errors_on_missing_file() {
    let discovery = Discovery::UriFile("/nonexistent/path_uri".into());
    let resolver = FakeResolver(None);
    let err = discovery.resolve(&resolver).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Discovery(_)));
}

#[tokio::test]
async fn name_service_discovery_delegates_to_resolver() {
    let discovery = Discovery::NameService("pipeline".to_string());
    let resolver = FakeResolver(Some("tcp://10.0.0.2:9000".to_string()));
    let uri = discovery.resolve(&resolver).await.unwrap();
    assert_eq!(uri, "tcp://10.0.0.2:9000");
}

#[tokio::test]
async fn name_service_discovery_propagates_resolver_failure() {
    let discovery = Discovery::NameService("pipeline".to_string());
    let resolver = FakeResolver(None);
    let err = discovery.resolve(&resolver).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Discovery(_)));
}
