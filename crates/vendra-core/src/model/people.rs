// ── People: app users, customers, crew, prospects ──

entity! {
    /// An application user (staff login), distinct from the auth principal.
    pub struct User in users as Users {
        pub email: String,
        pub full_name: String,
        /// `"Admin"` or `"Member"`.
        pub role: String,
        pub permissions: Vec<String>,
    }
    draft UserDraft;
    patch UserPatch;
}

entity! {
    /// A customer of the studio.
    pub struct Client in clients as Clients {
        pub name: String,
        pub email: String,
        pub phone: String,
        pub instagram: String,
        /// Date the client relationship started.
        pub since: String,
        pub status: String,
        pub client_type: String,
        pub last_contact: String,
        /// Opaque token for the client's self-service portal link.
        pub portal_access_id: String,
    }
    draft ClientDraft;
    patch ClientPatch;
}

entity! {
    /// A freelancer or staff member assigned to projects.
    pub struct TeamMember in team_members as TeamMembers {
        pub name: String,
        pub role: String,
        pub email: String,
        pub phone: String,
        pub standard_fee: f64,
        /// Bank account number for payouts.
        pub no_rek: String,
        pub reward_balance: f64,
        pub rating: f64,
        pub performance_notes: Vec<serde_json::Value>,
        pub portal_access_id: String,
    }
    draft TeamMemberDraft;
    patch TeamMemberPatch;
}

entity! {
    /// A prospect that has not booked yet.
    pub struct Lead in leads as Leads {
        pub name: String,
        pub contact_channel: String,
        pub location: String,
        pub status: String,
        pub date: String,
        pub notes: String,
    }
    draft LeadDraft;
    patch LeadPatch;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{Entity, EntityId, EntityKind};

    #[test]
    fn client_row_with_nulls_defaults_fields() {
        let row = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Budi",
            "email": "budi@example.com",
            "phone": "0812",
            "instagram": null,
            "since": "2025-01-01",
            "status": "Active",
            "client_type": "Direct",
            "last_contact": "2025-02-01",
            "portal_access_id": "portal-1",
            "created_at": "2025-01-01T00:00:00Z"
        });

        let client: Client = serde_json::from_value(row).unwrap();
        assert_eq!(client.instagram, "");
        assert_eq!(client.name, "Budi");
        assert!(client.id.as_uuid().is_some());
        assert_eq!(Client::KIND, EntityKind::Clients);
    }

    #[test]
    fn row_without_id_is_rejected() {
        let result = serde_json::from_value::<Lead>(json!({ "name": "No id" }));
        assert!(result.is_err());
    }

    #[test]
    fn draft_becomes_record_under_given_id() {
        let draft = ClientDraft {
            name: "Budi".into(),
            ..ClientDraft::default()
        };
        let id = EntityId::temporary();
        let client = Client::from_draft(id.clone(), &draft);
        assert_eq!(client.id, id);
        assert_eq!(client.name, "Budi");
        assert_eq!(client.email, "");
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut member = TeamMember::from_draft(
            EntityId::from("t1"),
            &TeamMemberDraft {
                name: "Rina".into(),
                standard_fee: 500_000.0,
                ..TeamMemberDraft::default()
            },
        );

        member.apply_patch(&TeamMemberPatch {
            standard_fee: Some(750_000.0),
            ..TeamMemberPatch::default()
        });

        assert_eq!(member.name, "Rina");
        assert!((member.standard_fee - 750_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = ClientPatch {
            status: Some("Inactive".into()),
            ..ClientPatch::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "status": "Inactive" }));
        assert!(ClientPatch::default().is_empty());
    }
}
