#![allow(clippy::unwrap_used)]
// Optimistic create / update / delete against a wiremock backend.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    CLIENT_A, CLIENT_B, CLIENT_C, backend_error, config, connected, mount_tables, seeded_tables,
};
use vendra_core::{
    Client, ClientDraft, ClientPatch, Controller, CoreError, EntityId, MutationOp, Project,
    ProjectDraft, Transaction, TransactionPatch,
};

const NEW_CLIENT: &str = "44444444-4444-4444-8444-444444444444";

fn ids<T: vendra_core::Entity>(items: &[std::sync::Arc<T>]) -> Vec<String> {
    items.iter().map(|r| r.id().to_string()).collect()
}

// ── Create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_is_visible_before_backend_answers_then_reconciles() {
    let (server, ctrl) = connected().await;
    let before = ctrl.collection::<Client>().len();

    Mock::given(method("POST"))
        .and(path("/rest/v1/clients"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": NEW_CLIENT, "name": "Budi", "status": "Active" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pending = ctrl.create::<Client>(ClientDraft {
        name: "Budi".into(),
        status: "Active".into(),
        ..ClientDraft::default()
    });

    // Visible before the future is polled.
    let clients = ctrl.collection::<Client>();
    assert_eq!(clients.len(), before + 1);
    let head = &clients.items()[0];
    assert!(head.id.is_temporary());
    assert_eq!(head.name, "Budi");
    assert_eq!(ctrl.pending_mutations()[0].op, MutationOp::Create);

    let created = pending.await.unwrap();
    assert_eq!(created.id.to_string(), NEW_CLIENT);

    let clients = ctrl.collection::<Client>();
    assert_eq!(clients.len(), before + 1);
    assert!(clients.iter().all(|c| !c.id.is_temporary()));
    assert_eq!(
        clients.iter().filter(|c| c.id.to_string() == NEW_CLIENT).count(),
        1
    );
    assert_eq!(clients.items()[0].name, "Budi");
    assert_eq!(ctrl.pending_count(), 0);
}

#[tokio::test]
async fn test_create_sends_draft_without_temporary_id() {
    let (server, ctrl) = connected().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/leads"))
        .respond_with(move |req: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            assert!(body.get("id").is_none());
            ResponseTemplate::new(201).set_body_json(json!({ "id": "lead-1", "name": body["name"] }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let lead = ctrl
        .create::<vendra_core::Lead>(vendra_core::LeadDraft {
            name: "Rina".into(),
            ..vendra_core::LeadDraft::default()
        })
        .await
        .unwrap();
    assert_eq!(lead.name, "Rina");
}

#[tokio::test]
async fn test_failed_create_restores_prior_contents() {
    let (server, ctrl) = connected().await;
    let before = ctrl.collection::<Project>().items().clone();

    Mock::given(method("POST"))
        .and(path("/rest/v1/projects"))
        .respond_with(backend_error(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = ctrl
        .create::<Project>(ProjectDraft {
            project_name: "Prewedding".into(),
            ..ProjectDraft::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Backend { status: Some(503), .. }));
    let after = ctrl.collection::<Project>();
    assert_eq!(*after.items(), before);
    assert!(after.iter().all(|p| !p.id.is_temporary()));
}

#[tokio::test]
async fn test_create_confirming_an_already_loaded_id_keeps_ids_unique() {
    let (server, ctrl) = connected().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/clients"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": CLIENT_A, "name": "Budi" })),
        )
        .mount(&server)
        .await;

    ctrl.create::<Client>(ClientDraft {
        name: "Budi".into(),
        ..ClientDraft::default()
    })
    .await
    .unwrap();

    let clients = ctrl.collection::<Client>();
    let unique: HashSet<String> = ids(clients.items()).into_iter().collect();
    assert_eq!(unique.len(), clients.len());
    assert_eq!(clients.len(), 3);
}

#[tokio::test]
async fn test_dropping_the_future_releases_the_pending_entry() {
    let (server, ctrl) = connected().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/clients"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": NEW_CLIENT, "name": "x" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let pending = ctrl.create::<Client>(ClientDraft::default());
    assert_eq!(ctrl.pending_count(), 1);
    drop(pending);
    assert_eq!(ctrl.pending_count(), 0);
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_takes_server_values() {
    let (server, ctrl) = connected().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("id", "eq.t1"))
        .and(body_json(json!({ "amount": 150_000.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1",
            "date": "2026-03-01",
            "description": "DP",
            "amount": 150_000,
            "type": "Income",
            "category": "Pelunasan",
            "project_id": "p1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = EntityId::from("t1");
    let pending = ctrl.update::<Transaction>(
        id.clone(),
        TransactionPatch {
            amount: Some(150_000.0),
            ..TransactionPatch::default()
        },
    );

    let optimistic = ctrl.get::<Transaction>(&id).unwrap();
    assert!((optimistic.amount - 150_000.0).abs() < f64::EPSILON);
    assert_eq!(optimistic.category, "DP Proyek");

    pending.await.unwrap();

    let confirmed = ctrl.get::<Transaction>(&id).unwrap();
    assert!((confirmed.amount - 150_000.0).abs() < f64::EPSILON);
    assert_eq!(confirmed.category, "Pelunasan");
}

#[tokio::test]
async fn test_failed_update_converges_to_reloaded_state() {
    let (server, ctrl) = connected().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/transactions"))
        .respond_with(backend_error(500))
        .expect(1)
        .mount(&server)
        .await;

    let id = EntityId::from("t1");
    let err = ctrl
        .update::<Transaction>(
            id.clone(),
            TransactionPatch {
                amount: Some(999.0),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Backend { .. }));

    tokio::time::timeout(Duration::from_secs(5), ctrl.resync_settled())
        .await
        .unwrap();

    let reloaded = ctrl.get::<Transaction>(&id).unwrap();
    assert!((reloaded.amount - 100_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_update_failing_after_disconnect_still_reloads() {
    let (server, ctrl) = connected().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/transactions"))
        .respond_with(backend_error(500).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let id = EntityId::from("t1");
    let pending = ctrl.update::<Transaction>(
        id.clone(),
        TransactionPatch {
            amount: Some(999.0),
            ..TransactionPatch::default()
        },
    );
    let in_flight = tokio::spawn(pending);
    tokio::time::sleep(Duration::from_millis(20)).await;
    ctrl.disconnect().await;

    assert!(in_flight.await.unwrap().is_err());
    tokio::time::timeout(Duration::from_secs(2), ctrl.resync_settled())
        .await
        .unwrap();

    let reloaded = ctrl.get::<Transaction>(&id).unwrap();
    assert!((reloaded.amount - 100_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_update_outliving_a_oneshot_still_reloads() {
    let server = MockServer::start().await;
    mount_tables(&server, &seeded_tables()).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/transactions"))
        .respond_with(backend_error(500))
        .expect(1)
        .mount(&server)
        .await;

    let id = EntityId::from("t1");
    let (ctrl, pending) = Controller::oneshot(config(&server), |c| {
        let pending = c.update::<Transaction>(
            EntityId::from("t1"),
            TransactionPatch {
                amount: Some(999.0),
                ..TransactionPatch::default()
            },
        );
        async move { Ok((c, pending)) }
    })
    .await
    .unwrap();

    assert!(pending.await.is_err());
    tokio::time::timeout(Duration::from_secs(2), ctrl.resync_settled())
        .await
        .unwrap();

    let reloaded = ctrl.get::<Transaction>(&id).unwrap();
    assert!((reloaded.amount - 100_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_update_of_absent_id_fails_fast() {
    let (server, ctrl) = connected().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = ctrl
        .update::<Client>(EntityId::from("nope"), ClientPatch::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_of_temporary_id_fails_fast() {
    let (server, ctrl) = connected().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": NEW_CLIENT }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let _create = ctrl.create::<Client>(ClientDraft::default());
    let temp_id = ctrl.collection::<Client>().items()[0].id.clone();
    assert!(temp_id.is_temporary());

    let err = ctrl
        .update::<Client>(temp_id.clone(), ClientPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PendingCreation { .. }));

    let err = ctrl.delete::<Client>(temp_id).await.unwrap_err();
    assert!(matches!(err, CoreError::PendingCreation { .. }));
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_delete_restores_record_at_original_index() {
    let (server, ctrl) = connected().await;
    let before = ctrl.collection::<Client>().items().clone();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{CLIENT_B}")))
        .respond_with(backend_error(500))
        .expect(1)
        .mount(&server)
        .await;

    let id = EntityId::from(CLIENT_B);
    let pending = ctrl.delete::<Client>(id.clone());
    assert!(ctrl.get::<Client>(&id).is_none());

    pending.await.unwrap_err();

    let after = ctrl.collection::<Client>();
    assert_eq!(*after.items(), before);
    assert_eq!(ids(after.items()), vec![CLIENT_A, CLIENT_B, CLIENT_C]);
}

#[tokio::test]
async fn test_failed_delete_keeps_concurrent_changes() {
    let (server, ctrl) = connected().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .respond_with(backend_error(500).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{CLIENT_A}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CLIENT_A, "name": "Budi Santoso", "email": "budi@example.com", "status": "Active"
        })))
        .mount(&server)
        .await;

    let delete = ctrl.delete::<Client>(EntityId::from(CLIENT_B));
    let update = ctrl.update::<Client>(
        EntityId::from(CLIENT_A),
        ClientPatch {
            name: Some("Budi Santoso".into()),
            ..ClientPatch::default()
        },
    );

    let (deleted, updated) = tokio::join!(delete, update);
    deleted.unwrap_err();
    updated.unwrap();

    let after = ctrl.collection::<Client>();
    assert_eq!(ids(after.items()), vec![CLIENT_A, CLIENT_B, CLIENT_C]);
    assert_eq!(after.items()[0].name, "Budi Santoso");
}

#[tokio::test]
async fn test_delete_success_and_absent_id() {
    let (server, ctrl) = connected().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{CLIENT_C}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": CLIENT_C }])))
        .expect(1)
        .mount(&server)
        .await;

    ctrl.delete::<Client>(EntityId::from(CLIENT_C)).await.unwrap();
    assert_eq!(ids(ctrl.collection::<Client>().items()), vec![CLIENT_A, CLIENT_B]);

    let err = ctrl
        .delete::<Client>(EntityId::from(CLIENT_C))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_backend_spelling_of_uuid_keys_is_sent_back_unchanged() {
    const UPPER: &str = "A1B2C3D4-0000-4000-8000-00000000ABCD";
    const COMPACT: &str = "0123456789abcdef0123456789abcdef";

    let server = wiremock::MockServer::start().await;
    let mut tables = common::seeded_tables();
    tables.push((
        vendra_core::EntityKind::Leads,
        json!([
            { "id": UPPER, "name": "Rina", "status": "Discussion" },
            { "id": COMPACT, "name": "Dewi", "status": "Discussion" }
        ]),
    ));
    common::mount_tables(&server, &tables).await;
    let ctrl = vendra_core::Controller::new(common::config(&server));
    ctrl.connect().await.unwrap();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/leads"))
        .and(query_param("id", format!("eq.{UPPER}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": UPPER, "name": "Rina W", "status": "Discussion"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/leads"))
        .and(query_param("id", format!("eq.{COMPACT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": COMPACT }])))
        .expect(1)
        .mount(&server)
        .await;

    let patch = vendra_core::LeadPatch {
        name: Some("Rina W".into()),
        ..Default::default()
    };
    let updated = ctrl
        .update::<vendra_core::Lead>(EntityId::from(UPPER), patch)
        .await
        .unwrap();
    assert_eq!(updated.id.to_string(), UPPER);

    ctrl.delete::<vendra_core::Lead>(EntityId::from(COMPACT))
        .await
        .unwrap();
    assert_eq!(ids(ctrl.collection::<vendra_core::Lead>().items()), vec![UPPER]);
}

#[tokio::test]
async fn test_mutations_before_connect_are_rejected() {
    let server = wiremock::MockServer::start().await;
    let ctrl = vendra_core::Controller::new(common::config(&server));

    let err = ctrl.create::<Client>(ClientDraft::default()).await.unwrap_err();
    assert!(matches!(err, CoreError::Disconnected));
    assert!(ctrl.collection::<Client>().is_empty());
}
