// ── Cache snapshot ──

use std::sync::Arc;

use super::EntityCollection;
use crate::model::{
    AddOn, Asset, Card, Client, ClientFeedback, Contract, Entity, EntityKind, FinancialPocket,
    Lead, Notification, Package, Profile, Project, PromoCode, RewardLedgerEntry, SocialMediaPost,
    Sop, TeamMember, TeamPaymentRecord, TeamProjectPayment, Transaction, User,
};

/// Every cached collection at one point in time, plus the profile.
///
/// Cloning copies twenty `Arc` pointers; the records themselves are shared.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub users: EntityCollection<User>,
    pub clients: EntityCollection<Client>,
    pub projects: EntityCollection<Project>,
    pub packages: EntityCollection<Package>,
    pub add_ons: EntityCollection<AddOn>,
    pub team_members: EntityCollection<TeamMember>,
    pub transactions: EntityCollection<Transaction>,
    pub leads: EntityCollection<Lead>,
    pub cards: EntityCollection<Card>,
    pub financial_pockets: EntityCollection<FinancialPocket>,
    pub team_project_payments: EntityCollection<TeamProjectPayment>,
    pub team_payment_records: EntityCollection<TeamPaymentRecord>,
    pub reward_ledger_entries: EntityCollection<RewardLedgerEntry>,
    pub assets: EntityCollection<Asset>,
    pub client_feedback: EntityCollection<ClientFeedback>,
    pub contracts: EntityCollection<Contract>,
    pub notifications: EntityCollection<Notification>,
    pub social_media_posts: EntityCollection<SocialMediaPost>,
    pub promo_codes: EntityCollection<PromoCode>,
    pub sops: EntityCollection<Sop>,
    pub profile: Option<Arc<Profile>>,
}

impl CacheSnapshot {
    pub fn collection<T: Entity>(&self) -> &EntityCollection<T> {
        T::collection(self)
    }

    /// Record count for a kind chosen at runtime.
    pub fn len_of(&self, kind: EntityKind) -> usize {
        crate::with_entity_type!(kind, T => T::collection(self).len())
    }

    pub fn version_of(&self, kind: EntityKind) -> u64 {
        crate::with_entity_type!(kind, T => T::collection(self).version())
    }

    /// `true` when clients, projects and packages are all empty: the
    /// backend has never been seeded.
    pub fn is_unseeded(&self) -> bool {
        self.clients.is_empty() && self.projects.is_empty() && self.packages.is_empty()
    }

    /// Move every collection of `loaded` into `self`.
    pub(crate) fn adopt(&mut self, loaded: Self) {
        self.users.adopt(loaded.users);
        self.clients.adopt(loaded.clients);
        self.projects.adopt(loaded.projects);
        self.packages.adopt(loaded.packages);
        self.add_ons.adopt(loaded.add_ons);
        self.team_members.adopt(loaded.team_members);
        self.transactions.adopt(loaded.transactions);
        self.leads.adopt(loaded.leads);
        self.cards.adopt(loaded.cards);
        self.financial_pockets.adopt(loaded.financial_pockets);
        self.team_project_payments.adopt(loaded.team_project_payments);
        self.team_payment_records.adopt(loaded.team_payment_records);
        self.reward_ledger_entries.adopt(loaded.reward_ledger_entries);
        self.assets.adopt(loaded.assets);
        self.client_feedback.adopt(loaded.client_feedback);
        self.contracts.adopt(loaded.contracts);
        self.notifications.adopt(loaded.notifications);
        self.social_media_posts.adopt(loaded.social_media_posts);
        self.promo_codes.adopt(loaded.promo_codes);
        self.sops.adopt(loaded.sops);
        self.profile = loaded.profile;
    }
}
