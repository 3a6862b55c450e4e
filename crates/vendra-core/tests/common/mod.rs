#![allow(clippy::unwrap_used, dead_code)]
// Shared fixtures: a wiremock backend serving every table.

use secrecy::SecretString;
use serde_json::{Value, json};
use strum::IntoEnumIterator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vendra_core::{Controller, EntityKind, SyncConfig};

pub const CLIENT_A: &str = "11111111-1111-4111-8111-111111111111";
pub const CLIENT_B: &str = "22222222-2222-4222-8222-222222222222";
pub const CLIENT_C: &str = "33333333-3333-4333-8333-333333333333";

pub fn config(server: &MockServer) -> SyncConfig {
    let mut config = SyncConfig::new(
        server.uri().parse().unwrap(),
        SecretString::from("anon-key".to_owned()),
    );
    config.realtime_enabled = false;
    config
}

pub fn seeded_tables() -> Vec<(EntityKind, Value)> {
    vec![
        (
            EntityKind::Clients,
            json!([
                { "id": CLIENT_A, "name": "Budi", "email": "budi@example.com", "status": "Active" },
                { "id": CLIENT_B, "name": "Sari", "email": "sari@example.com", "status": "Active" },
                { "id": CLIENT_C, "name": "Andi", "email": null, "status": "Lead" }
            ]),
        ),
        (
            EntityKind::Projects,
            json!([
                { "id": "p1", "project_name": "Wedding Budi", "client_id": CLIENT_A, "total_cost": 15_000_000 }
            ]),
        ),
        (
            EntityKind::Packages,
            json!([{ "id": "pkg1", "name": "Gold", "price": 12_000_000 }]),
        ),
        (
            EntityKind::Transactions,
            json!([
                { "id": "t1", "date": "2026-03-01", "description": "DP", "amount": 100_000, "type": "Income", "category": "DP Proyek", "project_id": "p1" }
            ]),
        ),
        (
            EntityKind::Users,
            json!([
                { "id": "u-row-1", "email": "Owner@Studio.id", "full_name": "Owner", "role": "Admin", "permissions": [] }
            ]),
        ),
    ]
}

/// Serve every table: `overrides` where given, `[]` otherwise.
pub async fn mount_tables(server: &MockServer, overrides: &[(EntityKind, Value)]) {
    for kind in EntityKind::iter() {
        let rows = overrides
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or_else(|| json!([]), |(_, rows)| rows.clone());
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", kind.table())))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(server)
            .await;
    }
}

/// A connected controller over the seeded backend.
pub async fn connected() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    mount_tables(&server, &seeded_tables()).await;
    let controller = Controller::new(config(&server));
    controller.connect().await.unwrap();
    (server, controller)
}

pub fn backend_error(status: u16) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "code": "XX000",
        "message": "backend unavailable",
        "details": null,
        "hint": null
    }))
}
