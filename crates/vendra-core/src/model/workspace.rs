// ── Studio operations: equipment, inbox, procedures, business profile ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::wire::nullable;

entity! {
    /// Owned equipment.
    pub struct Asset in assets as Assets {
        pub name: String,
        pub category: String,
        pub purchase_date: String,
        pub purchase_price: f64,
        pub serial_number: String,
        pub status: String,
        pub notes: String,
    }
    draft AssetDraft;
    patch AssetPatch;
}

entity! {
    /// In-app notification.
    pub struct Notification in notifications as Notifications {
        pub title: String,
        pub message: String,
        pub timestamp: String,
        pub is_read: bool,
        pub icon: String,
        pub link_view: Option<String>,
        pub link_action: Value,
    }
    draft NotificationDraft;
    patch NotificationPatch;
}

entity! {
    /// Standard operating procedure document.
    pub struct Sop in sops as Sops {
        pub title: String,
        pub category: String,
        pub content: String,
        pub last_updated: String,
    }
    draft SopDraft;
    patch SopPatch;
}

// ── Profile ─────────────────────────────────────────────────────────

/// Business settings for the signed-in user, one row per user.
///
/// Not a cached collection: loaded alongside the snapshot and replaced
/// wholesale on every full refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Assigned by the backend; omitted from insert bodies while empty.
    #[serde(deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub user_id: String,
    #[serde(deserialize_with = "nullable")]
    pub full_name: String,
    #[serde(deserialize_with = "nullable")]
    pub email: String,
    #[serde(deserialize_with = "nullable")]
    pub phone: String,
    #[serde(deserialize_with = "nullable")]
    pub company_name: String,
    #[serde(deserialize_with = "nullable")]
    pub website: String,
    #[serde(deserialize_with = "nullable")]
    pub address: String,
    #[serde(deserialize_with = "nullable")]
    pub bank_account: String,
    #[serde(deserialize_with = "nullable")]
    pub authorized_signer: String,
    #[serde(deserialize_with = "nullable")]
    pub id_number: String,
    #[serde(deserialize_with = "nullable")]
    pub bio: String,
    #[serde(deserialize_with = "nullable")]
    pub income_categories: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub expense_categories: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub project_types: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub event_types: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub asset_categories: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub sop_categories: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub project_status_config: Vec<Value>,
    pub notification_settings: Value,
    pub security_settings: Value,
    #[serde(deserialize_with = "nullable")]
    pub briefing_template: String,
    #[serde(deserialize_with = "nullable")]
    pub terms_and_conditions: String,
    #[serde(deserialize_with = "nullable")]
    pub contract_template: String,
}

// Every writable profile column; `id` and `user_id` are fixed per row.
macro_rules! profile_patch {
    ($( $field:ident : $ty:ty ),+ $(,)?) => {
        /// Partial update for [`Profile`]; `None` fields are left alone.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct ProfilePatch {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl ProfilePatch {
            /// `true` when no field is set.
            pub fn is_empty(&self) -> bool {
                $( self.$field.is_none() )&&+
            }

            pub fn apply_to(&self, profile: &mut Profile) {
                $(
                    if let Some(value) = &self.$field {
                        profile.$field.clone_from(value);
                    }
                )+
            }
        }
    };
}

profile_patch! {
    full_name: String,
    email: String,
    phone: String,
    company_name: String,
    website: String,
    address: String,
    bank_account: String,
    authorized_signer: String,
    id_number: String,
    bio: String,
    income_categories: Vec<String>,
    expense_categories: Vec<String>,
    project_types: Vec<String>,
    event_types: Vec<String>,
    asset_categories: Vec<String>,
    sop_categories: Vec<String>,
    project_status_config: Vec<Value>,
    notification_settings: Value,
    security_settings: Value,
    briefing_template: String,
    terms_and_conditions: String,
    contract_template: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn profile_tolerates_sparse_rows() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "prof-1",
            "user_id": "u1",
            "company_name": "Vena Pictures",
            "income_categories": ["DP Proyek", "Pelunasan"],
            "expense_categories": null,
            "notification_settings": { "newProject": true }
        }))
        .unwrap();

        assert_eq!(profile.company_name, "Vena Pictures");
        assert_eq!(profile.income_categories.len(), 2);
        assert!(profile.expense_categories.is_empty());
        assert_eq!(profile.notification_settings["newProject"], json!(true));
        assert_eq!(profile.security_settings, Value::Null);
    }

    #[test]
    fn profile_patch_sends_only_set_fields_and_merges() {
        let patch = ProfilePatch {
            company_name: Some("Vendra Pictures".into()),
            sop_categories: Some(vec!["Produksi".into()]),
            ..ProfilePatch::default()
        };
        assert!(!patch.is_empty());
        assert!(ProfilePatch::default().is_empty());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "company_name": "Vendra Pictures", "sop_categories": ["Produksi"] })
        );

        let mut profile = Profile {
            id: "prof-1".into(),
            user_id: "u1".into(),
            company_name: "Vena".into(),
            bio: "Wedding".into(),
            ..Profile::default()
        };
        patch.apply_to(&mut profile);
        assert_eq!(profile.company_name, "Vendra Pictures");
        assert_eq!(profile.sop_categories, vec!["Produksi".to_owned()]);
        assert_eq!(profile.bio, "Wedding");
        assert_eq!(profile.user_id, "u1");
    }

    #[test]
    fn notification_link_view_is_optional() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "title": "Pembayaran masuk",
            "is_read": false,
            "link_view": null
        }))
        .unwrap();
        assert_eq!(n.link_view, None);
        assert!(!n.is_read);
        assert_eq!(n.link_action, Value::Null);
    }
}
