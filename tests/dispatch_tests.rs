//! Write and delete dispatch against a mocked backend.

mod common;

use common::{mock_backend, test_registry, ASSESSMENT_ID, INTEGRATION_ID, POLICY_ID, REQUIREMENT_ID};
use model_gateway::service::{DeleteOutcome, DeleteRequest, ParentContext, WriteRequest};
use model_gateway::{AppError, Dispatcher, TransportError};
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("not an object"),
    }
}

#[tokio::test]
async fn create_returns_backend_record() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/policies/"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_json(json!({"name": "Access control"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": POLICY_ID, "name": "Access control"})))
        .expect(1)
        .mount(&server)
        .await;

    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .with_authorization(Some("Bearer t0k"))
        .dispatch_write(&WriteRequest::create("policies", obj(json!({"name": "Access control"}))))
        .await
        .unwrap();

    assert!(outcome.ok);
    let data = outcome.data.unwrap();
    assert!(uuid::Uuid::parse_str(data["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn rejected_create_carries_backend_errors() {
    let (server, transport) = mock_backend().await;
    let errors = json!({"name": ["This field may not be blank."]});
    Mock::given(method("POST"))
        .and(path("/api/policies/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(errors.clone()))
        .mount(&server)
        .await;

    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_write(&WriteRequest::create("policies", obj(json!({"name": ""}))))
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.status, Some(400));
    assert_eq!(outcome.error, Some(errors));
}

#[tokio::test]
async fn edit_omits_untouched_masked_fields() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/api/settings/integrations/{}/", INTEGRATION_ID)))
        .and(body_json(json!({"name": "Jira (prod)", "token": "new"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": INTEGRATION_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let current = obj(json!({
        "name": "Jira",
        "credentials": {"username": "", "password": ""},
        "token": ""
    }));
    let edited = obj(json!({
        "name": "Jira (prod)",
        "credentials": {"username": "", "password": ""},
        "token": "new"
    }));
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_write(&WriteRequest::edit("integrations", INTEGRATION_ID, edited).with_current(current))
        .await
        .unwrap();

    assert!(outcome.ok);
}

#[tokio::test]
async fn edit_fetches_current_record_when_absent() {
    let (server, transport) = mock_backend().await;
    let record_path = format!("/api/settings/integrations/{}/", INTEGRATION_ID);
    Mock::given(method("GET"))
        .and(path(record_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": INTEGRATION_ID, "name": "Jira", "secret": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(record_path))
        .and(body_json(json!({"name": "Jira 2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": INTEGRATION_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_write(&WriteRequest::edit(
            "integrations",
            INTEGRATION_ID,
            obj(json!({"name": "Jira 2", "secret": {"value": ""}})),
        ))
        .await
        .unwrap();

    assert!(outcome.ok);
}

#[tokio::test]
async fn nested_create_posts_under_parent() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/compliance-assessments/{}/requirements/", ASSESSMENT_ID)))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": REQUIREMENT_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let parent = ParentContext {
        resource: "compliance-assessments".into(),
        id: ASSESSMENT_ID.into(),
        field: "requirements".into(),
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_write(
            &WriteRequest::create("requirement-assessments", obj(json!({"status": "to_do"}))).with_parent(parent),
        )
        .await
        .unwrap();

    assert!(outcome.ok);
}

#[tokio::test]
async fn unconfirmed_delete_only_reads_cascade_info() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/policies/{}/cascade-info/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"related_objects": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let request = DeleteRequest {
        resource: "policies".into(),
        id: POLICY_ID.into(),
        parent: None,
        confirmed: false,
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_delete(&request)
        .await
        .unwrap();

    match outcome {
        DeleteOutcome::NeedsConfirmation(info) => assert!(info.is_empty()),
        other => panic!("expected confirmation, got {:?}", other),
    }
}

#[tokio::test]
async fn unconfirmed_delete_lists_dependents() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/policies/{}/cascade-info/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "related_objects": [
                {"model": "applied-controls", "id": "c1", "name": "MFA"},
                {"model": "applied-controls", "id": "c2", "name": "SSO"}
            ]
        })))
        .mount(&server)
        .await;

    let request = DeleteRequest {
        resource: "policies".into(),
        id: POLICY_ID.into(),
        parent: None,
        confirmed: false,
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_delete(&request)
        .await
        .unwrap();

    match outcome {
        DeleteOutcome::NeedsConfirmation(info) => assert_eq!(info.dependents.len(), 2),
        other => panic!("expected confirmation, got {:?}", other),
    }
}

#[tokio::test]
async fn confirmed_delete_succeeds() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/policies/{}/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = DeleteRequest {
        resource: "policies".into(),
        id: POLICY_ID.into(),
        parent: None,
        confirmed: true,
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_delete(&request)
        .await
        .unwrap();

    match outcome {
        DeleteOutcome::Completed(outcome) => {
            assert!(outcome.ok);
            assert_eq!(outcome.data, Some(Value::Null));
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_delete_attaches_cascade_info() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/policies/{}/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"detail": "protected"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/policies/{}/cascade-info/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "c1"}])))
        .mount(&server)
        .await;

    let request = DeleteRequest {
        resource: "policies".into(),
        id: POLICY_ID.into(),
        parent: None,
        confirmed: true,
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_delete(&request)
        .await
        .unwrap();

    match outcome {
        DeleteOutcome::Completed(outcome) => {
            assert!(!outcome.ok);
            assert_eq!(outcome.status, Some(409));
            assert_eq!(outcome.cascade.map(|c| c.dependents.len()), Some(1));
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_resource_is_rejected_before_sending() {
    let (server, transport) = mock_backend().await;

    let registry = test_registry();
    let result = Dispatcher::new(&registry, &transport)
        .dispatch_write(&WriteRequest::create("widgets", Map::new()))
        .await;

    assert!(result.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_stops_when_current_record_is_not_an_object() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/policies/{}/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry = test_registry();
    let err = Dispatcher::new(&registry, &transport)
        .dispatch_write(&WriteRequest::edit("policies", POLICY_ID, obj(json!({"secret": ""}))))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Transport(TransportError::Decode(_))), "got {:?}", err);
}

#[tokio::test]
async fn edit_relays_failed_current_record_fetch() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/policies/{}/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "forbidden"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_write(&WriteRequest::edit("policies", POLICY_ID, obj(json!({"name": "n"}))))
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.status, Some(403));
    assert_eq!(outcome.error, Some(json!({"detail": "forbidden"})));
}

#[tokio::test]
async fn nested_edit_reads_current_record_under_parent() {
    let (server, transport) = mock_backend().await;
    let record_path = format!(
        "/api/compliance-assessments/{}/requirements/{}/",
        ASSESSMENT_ID, REQUIREMENT_ID
    );
    Mock::given(method("GET"))
        .and(path(record_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": REQUIREMENT_ID, "evidence_token": ""})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(record_path))
        .and(body_json(json!({"status": "done"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": REQUIREMENT_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let parent = ParentContext {
        resource: "compliance-assessments".into(),
        id: ASSESSMENT_ID.into(),
        field: "requirements".into(),
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_write(
            &WriteRequest::edit(
                "requirement-assessments",
                REQUIREMENT_ID,
                obj(json!({"status": "done", "evidence_token": ""})),
            )
            .with_parent(parent),
        )
        .await
        .unwrap();

    assert!(outcome.ok);
}

#[tokio::test]
async fn failed_delete_survives_failed_cascade_lookup() {
    let (server, transport) = mock_backend().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/policies/{}/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/policies/{}/cascade-info/", POLICY_ID)))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let request = DeleteRequest {
        resource: "policies".into(),
        id: POLICY_ID.into(),
        parent: None,
        confirmed: true,
    };
    let registry = test_registry();
    let outcome = Dispatcher::new(&registry, &transport)
        .dispatch_delete(&request)
        .await
        .unwrap();

    match outcome {
        DeleteOutcome::Completed(outcome) => {
            assert!(!outcome.ok);
            assert_eq!(outcome.status, Some(500));
            assert_eq!(outcome.error, Some(json!({"detail": "db down"})));
            assert!(outcome.cascade.is_none());
        }
        other => panic!("expected completion, got {:?}", other),
    }
}
