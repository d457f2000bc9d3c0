//! Contract tests for EngineClient against a simulated compute backend.
//!
//! These tests use wiremock to stand in for the inference engine. They pin
//! the request shape (`POST /infer`, multipart `file` + `cache_id`) and the
//! handling of every response shape the engine is allowed to send.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/infer`  | `process_*` |
//! | GET    | `/health` | `health_check_*` |

use std::io::Write;

use stemcache_core::{normalize, FingerprintComputer, NamedPart};
use stemcache_engine_client::{EngineClient, EngineConfig, EngineError};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build an EngineClient pointed at a wiremock server.
fn test_client(mock_server: &MockServer) -> EngineClient {
    EngineClient::new(EngineConfig::local(&mock_server.uri()).unwrap()).unwrap()
}

/// Write an ASCII artifact to a temp file so multipart bodies stay matchable.
fn artifact(content: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

// ── POST /infer ──────────────────────────────────────────────────────

#[tokio::test]
async fn process_sends_file_and_cache_id_and_returns_named_stems() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"RIFF-fake-wave-data");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/infer"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"cache_id\""))
        .and(body_string_contains(fp.as_str()))
        .and(body_string_contains("filename=\"song.wav\""))
        .and(body_string_contains("RIFF-fake-wave-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cache_id": fp.as_str(),
            "status": "success",
            "files": ["https://cdn.example/v.wav", "https://cdn.example/d.wav"],
            "stems": [
                {"name": "Vocals", "location": "https://cdn.example/v.wav"},
                {"name": "Drums", "location": "https://cdn.example/d.wav"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let out = client.process(file.path(), "song.wav", &fp).await.unwrap();

    assert_eq!(out.cache_id.as_deref(), Some(fp.as_str()));
    assert_eq!(out.status.as_deref(), Some("success"));
    assert_eq!(
        normalize(out.raw),
        vec![
            NamedPart::new("Vocals", "https://cdn.example/v.wav"),
            NamedPart::new("Drums", "https://cdn.example/d.wav"),
        ]
    );
}

#[tokio::test]
async fn process_files_only_response_normalizes_positionally() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"abc");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/infer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": ["a", "b", "c"]
        })))
        .mount(&mock_server)
        .await;

    let out = test_client(&mock_server)
        .process(file.path(), "x.mp3", &fp)
        .await
        .unwrap();

    assert_eq!(out.cache_id, None);
    assert_eq!(out.status, None);
    let names: Vec<_> = normalize(out.raw).into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Stem 1", "Stem 2", "Stem 3"]);
}

#[tokio::test]
async fn process_empty_response_is_zero_parts() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"silence");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/infer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let out = test_client(&mock_server)
        .process(file.path(), "x.wav", &fp)
        .await
        .unwrap();
    assert!(normalize(out.raw).is_empty());
}

#[tokio::test]
async fn process_engine_error_keeps_raw_payload() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"abc");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/infer"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"detail":"CUDA out of memory"}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .process(file.path(), "x.wav", &fp)
        .await
        .unwrap_err();

    match &err {
        EngineError::Rejected { status, body, .. } => {
            assert_eq!(*status, 500);
            assert!(body.contains("CUDA out of memory"));
        }
        other => panic!("expected Rejected, got: {other:?}"),
    }
    assert_eq!(err.raw_payload(), Some(r#"{"detail":"CUDA out of memory"}"#));
}

#[tokio::test]
async fn process_malformed_success_body_is_deserialization_error() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"abc");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/infer"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .process(file.path(), "x.wav", &fp)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Deserialization { .. }), "got: {err:?}");
    assert_eq!(err.raw_payload(), None);
}

#[tokio::test]
async fn process_missing_artifact_is_io_error() {
    let mock_server = MockServer::start().await;
    let fp = FingerprintComputer::compute_bytes(b"gone");

    let err = test_client(&mock_server)
        .process(std::path::Path::new("/no/such/upload"), "x.wav", &fp)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }), "got: {err:?}");
}

#[tokio::test]
async fn process_unreachable_engine_is_unavailable() {
    let file = artifact(b"abc");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();
    let client = EngineClient::new(EngineConfig::local("http://127.0.0.1:1").unwrap()).unwrap();

    let err = client.process(file.path(), "x.wav", &fp).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable { .. }), "got: {err:?}");
}

#[tokio::test]
async fn process_sends_bearer_token_when_configured() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"abc");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/infer"))
        .and(header("authorization", "Bearer engine-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = EngineConfig::local(&mock_server.uri()).unwrap();
    config.api_token = Some("engine-secret".into());
    let client = EngineClient::new(config).unwrap();

    client.process(file.path(), "x.wav", &fp).await.unwrap();
}

#[tokio::test]
async fn process_respects_base_path() {
    let mock_server = MockServer::start().await;
    let file = artifact(b"abc");
    let fp = FingerprintComputer::compute_file(file.path()).unwrap();

    Mock::given(method("POST"))
        .and(path("/engine/v2/infer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": ["a"]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = EngineConfig::local(&format!("{}/engine/v2", mock_server.uri())).unwrap();
    let client = EngineClient::new(config).unwrap();

    let out = client.process(file.path(), "x.wav", &fp).await.unwrap();
    assert_eq!(out.raw.positional, vec!["a".to_string()]);
}

// ── GET /health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_reachable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    assert!(test_client(&mock_server).health_check().await.is_ok());
}

#[tokio::test]
async fn health_check_unhealthy_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server).health_check().await.unwrap_err();
    assert!(matches!(err, EngineError::Rejected { status: 503, .. }));
}
