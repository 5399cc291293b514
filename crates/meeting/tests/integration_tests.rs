//! Integration tests for the meeting crate
//!
//! These tests drive the sync engine through REST domain clients backed by
//! scripted transports, verifying the complete flow from HTTP exchange to
//! run outcome and statistics.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use meeting::{
    ApiError, Credential, DomainClient, Method, MockTransport, RequestExecutor, RestDomainClient,
    RetryPolicy, SyncDomain, SyncEngine, SyncError, SyncStatus, TransportError,
};

const BASE_URL: &str = "http://platform.test";

/// Helper to build one REST client over its own scripted transport
fn rest_client(domain: SyncDomain) -> (Arc<RestDomainClient>, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    let client = Arc::new(RestDomainClient::with_transport(
        domain,
        BASE_URL,
        RetryPolicy::default(),
        mock.clone(),
        100,
    ));
    (client, mock)
}

/// Helper to build record fixtures
fn records(prefix: &str, n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"id": format!("{prefix}{i}")}))
        .collect()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Engine over all five domains, returning the transports for scripting
fn full_engine() -> (SyncEngine, Vec<Arc<MockTransport>>) {
    let mut clients: Vec<Arc<dyn DomainClient>> = Vec::new();
    let mut mocks = Vec::new();
    for domain in SyncDomain::ALL {
        let (client, mock) = rest_client(domain);
        clients.push(client);
        mocks.push(mock);
    }
    (SyncEngine::new(clients), mocks)
}

#[test]
fn test_full_sync_over_rest_clients() {
    let (engine, mocks) = full_engine();
    for (domain, mock) in SyncDomain::ALL.into_iter().zip(&mocks) {
        let key = domain.as_str();
        mock.push_response(200, json!({key: records(key, 4)}));
    }

    let outcome = engine.sync_all().expect("sync should complete");
    assert_eq!(outcome.status, SyncStatus::Completed);
    assert_eq!(outcome.items_synced, 20);
    assert!(outcome.errors.is_empty());

    // Every domain was pulled exactly once from its list endpoint
    for (domain, mock) in SyncDomain::ALL.into_iter().zip(&mocks) {
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.starts_with(&format!("{BASE_URL}/v1/{domain}")));
    }

    let stats = engine.statistics();
    assert_eq!(stats.total_syncs, 1);
    assert_eq!(stats.successful_syncs, 1);
    assert_eq!(stats.items_synced, 20);
    assert_eq!(stats.success_rate, 100.0);
    assert!(stats.last_sync_duration_secs >= 0.0);
}

#[test]
fn test_partial_failure_reports_bad_records() {
    let (client, mock) = rest_client(SyncDomain::Meetings);
    let mut batch = records("m", 10);
    batch[3] = json!({"topic": "standup"}); // no id
    mock.push_response(200, json!({"meetings": batch}));

    let engine = SyncEngine::new(vec![client as Arc<dyn DomainClient>]);
    let outcome = engine.sync_domain(SyncDomain::Meetings).unwrap();

    assert_eq!(outcome.status, SyncStatus::CompletedWithErrors);
    assert_eq!(outcome.items_synced, 9);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].domain, SyncDomain::Meetings);
    // The attempted batch still reaches 100%
    assert_eq!(engine.progress(), 100);
}

#[test]
fn test_unreachable_domain_fails_run() {
    let mock = Arc::new(MockTransport::new());
    let client = Arc::new(RestDomainClient::with_transport(
        SyncDomain::Users,
        BASE_URL,
        RetryPolicy {
            max_retries: 0,
            timeout_secs: 5,
        },
        mock.clone(),
        100,
    ));
    mock.push_error(TransportError::Connection("refused".into()));

    let engine = SyncEngine::new(vec![client as Arc<dyn DomainClient>]);
    let err = engine.sync_domain(SyncDomain::Users).unwrap_err();

    match &err {
        SyncError::TaskFailed { task, message } => {
            assert_eq!(*task, SyncDomain::Users);
            assert!(message.contains("network unavailable"));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(engine.status().status, SyncStatus::Failed);
    assert_eq!(engine.statistics().failed_syncs, 1);

    // Failed runs are restartable; the next run can succeed
    mock.push_response(200, json!({"users": records("u", 1)}));
    let outcome = engine.sync_domain(SyncDomain::Users).unwrap();
    assert_eq!(outcome.status, SyncStatus::Completed);
}

#[test]
fn test_retry_then_success_counts_retries() {
    let mock = Arc::new(MockTransport::new());
    let executor = RequestExecutor::with_transport(
        BASE_URL,
        RetryPolicy {
            max_retries: 2,
            timeout_secs: 30,
        },
        mock.clone(),
    );
    mock.push_error(TransportError::Status {
        status: 503,
        message: "overloaded".into(),
    });
    mock.push_response(200, json!({"ok": true}));

    let started = std::time::Instant::now();
    let response = executor.execute(Method::Get, "v1/users", None).unwrap();
    assert!(response.success);
    // One retry at min(30, 2^0) = 1 second of backoff
    assert!(started.elapsed().as_secs_f64() >= 1.0);

    let stats = executor.stats();
    assert_eq!(stats.retries, 1);
    assert_eq!(stats.total_requests, 2);
    assert_eq!(
        stats.successful_requests + stats.failed_requests,
        stats.total_requests
    );
}

#[test]
fn test_credential_flows_to_the_wire() {
    let mock = Arc::new(MockTransport::new());
    let mut executor =
        RequestExecutor::with_transport(BASE_URL, RetryPolicy::default(), mock.clone());
    executor.set_credential(Some(Credential {
        scheme: "Bearer".into(),
        token: "integration-token".into(),
    }));
    mock.push_response(200, json!({}));

    executor.execute(Method::Get, "v1/meetings", None).unwrap();
    let request = &mock.requests()[0];
    let auth = request
        .headers
        .iter()
        .find(|(name, _)| name == "Authorization")
        .map(|(_, value)| value.clone());
    assert_eq!(auth.as_deref(), Some("Bearer integration-token"));
}

#[test]
fn test_expired_credential_surfaces_authentication_error() {
    let (client, mock) = rest_client(SyncDomain::Rooms);
    mock.push_response(401, json!({"error": "token expired"}));

    let err = client.list_records().unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
    assert_eq!(err.status_code(), 401);
}

#[test]
fn test_configuration_is_atomic() {
    let (engine, _mocks) = full_engine();
    let before = engine.configuration();

    // Below the 60-second floor; the whole patch must be rejected
    let err = engine
        .configure(&object(json!({"sync_interval_secs": 30})))
        .unwrap_err();
    assert_eq!(err.operation(), "configure_sync");
    assert_eq!(engine.configuration(), before);

    // Unknown keys are rejected even when other keys are valid
    let err = engine
        .configure(&object(json!({"batch_size": 10, "frequency": 5})))
        .unwrap_err();
    assert!(err.to_string().contains("unknown key"));
    assert_eq!(engine.configuration(), before);

    engine
        .configure(&object(json!({"sync_interval_secs": 90, "auto_sync": true})))
        .unwrap();
    let config = engine.configuration();
    assert_eq!(config.sync_interval_secs, 90);
    assert!(config.auto_sync);
    assert!(engine.status().next_sync_at.is_some());
}

#[test]
fn test_control_calls_illegal_from_idle() {
    let (engine, _mocks) = full_engine();
    assert!(engine.pause().is_err());
    assert!(engine.cancel().is_err());
    assert_eq!(engine.status().status, SyncStatus::Idle);
    assert!(engine.can_start());
}

#[test]
fn test_statistics_accumulate_across_runs() {
    let (client, mock) = rest_client(SyncDomain::Users);
    let engine = SyncEngine::new(vec![client as Arc<dyn DomainClient>]);

    mock.push_response(200, json!({"users": records("u", 5)}));
    engine.sync_domain(SyncDomain::Users).unwrap();

    // Second run has one record with a platform-reported error summary
    let mut batch = records("u", 3);
    batch[2] = json!({"id": "u2", "errors": ["profile incomplete"]});
    mock.push_response(200, json!({"users": batch}));
    let outcome = engine.sync_domain(SyncDomain::Users).unwrap();
    assert_eq!(outcome.status, SyncStatus::CompletedWithErrors);

    let stats = engine.statistics();
    assert_eq!(stats.total_syncs, 2);
    assert_eq!(stats.successful_syncs, 1);
    assert_eq!(stats.items_synced, 7);
    assert_eq!(stats.errors_encountered, 1);
    assert_eq!(stats.success_rate, 50.0);
}
