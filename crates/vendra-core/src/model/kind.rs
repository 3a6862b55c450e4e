// ── Entity kinds ──
//
// One variant per cached collection. The snake_case name doubles as the
// backend table name.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Every collection the cache holds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Users,
    Clients,
    Projects,
    Packages,
    AddOns,
    TeamMembers,
    Transactions,
    Leads,
    Cards,
    FinancialPockets,
    TeamProjectPayments,
    TeamPaymentRecords,
    RewardLedgerEntries,
    Assets,
    ClientFeedback,
    Contracts,
    Notifications,
    SocialMediaPosts,
    PromoCodes,
    Sops,
}

impl EntityKind {
    /// Kinds whose remote changes trigger a reload unless configured otherwise.
    pub const DEFAULT_WATCHED: [Self; 5] = [
        Self::Clients,
        Self::Projects,
        Self::Transactions,
        Self::Leads,
        Self::Notifications,
    ];

    /// Kinds that, when all empty, mean the backend has never been seeded.
    pub const PRIMARY: [Self; 3] = [Self::Clients, Self::Projects, Self::Packages];

    /// Backend table name.
    pub fn table(self) -> &'static str {
        self.into()
    }

    /// Default sort in the backend's `column.direction` form.
    pub fn order(self) -> &'static str {
        match self {
            Self::Transactions | Self::ClientFeedback => "date.desc",
            Self::Assets => "name.asc",
            Self::Notifications => "timestamp.desc",
            Self::SocialMediaPosts => "scheduled_date.desc",
            Self::Sops => "title.asc",
            _ => "created_at.desc",
        }
    }

    /// Resolve a table name reported by the change feed.
    pub fn from_table(table: &str) -> Option<Self> {
        table.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn twenty_kinds() {
        assert_eq!(EntityKind::iter().count(), 20);
    }

    #[test]
    fn table_names_are_snake_case() {
        assert_eq!(EntityKind::AddOns.table(), "add_ons");
        assert_eq!(EntityKind::ClientFeedback.table(), "client_feedback");
        assert_eq!(EntityKind::RewardLedgerEntries.table(), "reward_ledger_entries");
        assert_eq!(EntityKind::Sops.table(), "sops");
    }

    #[test]
    fn non_default_orders() {
        assert_eq!(EntityKind::Transactions.order(), "date.desc");
        assert_eq!(EntityKind::Assets.order(), "name.asc");
        assert_eq!(EntityKind::Notifications.order(), "timestamp.desc");
        assert_eq!(EntityKind::SocialMediaPosts.order(), "scheduled_date.desc");
        assert_eq!(EntityKind::Sops.order(), "title.asc");
        assert_eq!(EntityKind::Clients.order(), "created_at.desc");
    }

    #[test]
    fn from_table_round_trips() {
        for kind in EntityKind::iter() {
            assert_eq!(EntityKind::from_table(kind.table()), Some(kind));
        }
        assert_eq!(EntityKind::from_table("profiles"), None);
    }
}
