#![allow(clippy::unwrap_used)]
// Bulk load, direct lookups and collection streams.

mod common;

use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{CLIENT_A, backend_error, config, connected, mount_tables, seeded_tables};
use vendra_core::{
    Client, ClientDraft, ConnectionState, Controller, CoreError, EntityKind, Lead, LoadOutcome,
    LoadState, Session, Transaction, User,
};

// ── Bulk load ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_loads_every_collection() {
    let (_server, ctrl) = connected().await;

    let snap = ctrl.snapshot();
    assert_eq!(snap.clients.len(), 3);
    assert_eq!(snap.projects.len(), 1);
    assert_eq!(snap.packages.len(), 1);
    assert_eq!(snap.transactions.len(), 1);
    assert_eq!(snap.len_of(EntityKind::Users), 1);
    assert!(snap.leads.is_empty());
    assert!(snap.profile.is_none());

    assert_eq!(*ctrl.load_state().borrow(), LoadState::Ready);
    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Connected);
    assert!(ctrl.store().last_full_refresh().is_some());

    let t1 = &snap.transactions.items()[0];
    assert_eq!(t1.transaction_type, "Income");
    assert_eq!(t1.project_id.as_str(), "p1");
}

#[tokio::test]
async fn test_unseeded_backend_is_reported_not_applied() {
    let server = MockServer::start().await;
    let users = seeded_tables()
        .into_iter()
        .filter(|(k, _)| *k == EntityKind::Users)
        .collect::<Vec<_>>();
    mount_tables(&server, &users).await;

    let ctrl = Controller::new(config(&server));
    let outcome = ctrl.connect().await.unwrap();

    assert_eq!(outcome, LoadOutcome::EmptyBackend);
    assert_eq!(*ctrl.load_state().borrow(), LoadState::EmptyBackend);
    assert_eq!(ctrl.collection::<User>().len(), 0);
    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_partial_failure_leaves_cache_unchanged() {
    let (server, ctrl) = connected().await;
    let before = ctrl.snapshot();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/leads"))
        .respond_with(backend_error(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_tables(&server, &[]).await;

    let err = ctrl.full_refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Backend { status: Some(500), .. }));

    let after = ctrl.snapshot();
    assert_eq!(after.clients.items(), before.clients.items());
    assert_eq!(after.transactions.items(), before.transactions.items());
    assert!(matches!(*ctrl.load_state().borrow(), LoadState::Failed(_)));
}

#[tokio::test]
async fn test_failed_initial_load_fails_connect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "PGRST301", "message": "JWT expired", "details": null, "hint": null
        })))
        .mount(&server)
        .await;

    let ctrl = Controller::new(config(&server));
    let err = ctrl.connect().await.unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Failed);
    let err = ctrl.create::<Client>(ClientDraft::default()).await.unwrap_err();
    assert!(matches!(err, CoreError::Disconnected));
}

#[tokio::test]
async fn test_refresh_replaces_rows_removed_remotely() {
    let (server, ctrl) = connected().await;

    server.reset().await;
    let mut tables = seeded_tables();
    tables.retain(|(k, _)| *k != EntityKind::Clients);
    tables.push((
        EntityKind::Clients,
        json!([{ "id": CLIENT_A, "name": "Budi", "status": "Active" }]),
    ));
    mount_tables(&server, &tables).await;

    assert_eq!(ctrl.full_refresh().await.unwrap(), LoadOutcome::Applied);
    assert_eq!(ctrl.collection::<Client>().len(), 1);
}

#[tokio::test]
async fn test_session_loads_profile_and_current_user() {
    let server = MockServer::start().await;
    mount_tables(&server, &seeded_tables()).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("user_id", "eq.auth-1"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "prof-1",
            "user_id": "auth-1",
            "full_name": "Owner",
            "company_name": "Vendra Studio",
            "income_categories": ["DP Proyek", "Pelunasan"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server).with_session(Session {
        user_id: "auth-1".into(),
        email: "owner@studio.id".into(),
        access_token: Some("user-jwt".to_owned().into()),
    });
    let ctrl = Controller::new(config);
    ctrl.connect().await.unwrap();

    let profile = ctrl.profile().unwrap();
    assert_eq!(profile.company_name, "Vendra Studio");
    assert_eq!(profile.income_categories.len(), 2);

    let user = ctrl.current_user().unwrap();
    assert_eq!(user.full_name, "Owner");
}

// ── Portal lookups ──────────────────────────────────────────────────

#[tokio::test]
async fn test_portal_lookup_found_and_missing() {
    let (server, ctrl) = connected().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("portal_access_id", "eq.portal-ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CLIENT_A, "name": "Budi", "portal_access_id": "portal-ok"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/team_members"))
        .and(query_param("portal_access_id", "eq.nobody"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
            "details": "The result contains 0 rows",
            "hint": null
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    let client = ctrl.client_by_portal_id("portal-ok").await.unwrap().unwrap();
    assert_eq!(client.name, "Budi");

    assert!(ctrl.team_member_by_portal_id("nobody").await.unwrap().is_none());
}

// ── Streams ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_sees_optimistic_insert() {
    let (server, ctrl) = connected().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/leads"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "lead-9", "name": "Rina" }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let mut stream = Box::pin(ctrl.subscribe::<Lead>().into_stream());
    assert!(stream.next().await.unwrap().is_empty());

    let create = ctrl.create::<Lead>(vendra_core::LeadDraft {
        name: "Rina".into(),
        ..vendra_core::LeadDraft::default()
    });

    let optimistic = stream.next().await.unwrap();
    assert_eq!(optimistic.len(), 1);
    assert!(optimistic[0].id.is_temporary());

    create.await.unwrap();
    let confirmed = stream.next().await.unwrap();
    assert_eq!(confirmed[0].id.to_string(), "lead-9");
}

#[tokio::test]
async fn test_stream_ignores_other_kinds() {
    let (server, ctrl) = connected().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1", "amount": 1, "type": "Income"
        })))
        .mount(&server)
        .await;

    let mut clients = ctrl.subscribe::<Client>();
    ctrl.update::<Transaction>(
        "t1".into(),
        vendra_core::TransactionPatch {
            amount: Some(1.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let waited = tokio::time::timeout(Duration::from_millis(50), clients.changed()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn test_oneshot_runs_closure_and_disconnects() {
    let server = MockServer::start().await;
    mount_tables(&server, &seeded_tables()).await;

    let count = Controller::oneshot(config(&server), |ctrl| async move {
        Ok::<_, CoreError>(ctrl.collection::<Client>().len())
    })
    .await
    .unwrap();
    assert_eq!(count, 3);
}
