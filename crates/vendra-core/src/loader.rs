// ── Bulk loader ──
//
// Fetches all twenty collections plus the profile concurrently and swaps
// them into the store in one step. Any failed fetch aborts the load with
// the cache untouched.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{
    AddOn, Asset, Card, Client, ClientFeedback, Contract, FinancialPocket, Lead, Notification,
    Package, Project, PromoCode, RewardLedgerEntry, SocialMediaPost, Sop, TeamMember,
    TeamPaymentRecord, TeamProjectPayment, Transaction, User,
};
use crate::remote::RemoteStore;
use crate::store::{CacheSnapshot, DataStore, EntityCollection};

/// Where the cache stands relative to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing loaded yet.
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last load found no clients, projects or packages; the cache
    /// was left as it was so the consumer can offer a data import.
    EmptyBackend,
    /// The last load failed; the cache still holds the previous data.
    Failed(String),
}

/// What a successful load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Every collection was replaced.
    Applied,
    /// The backend is unseeded; nothing was applied.
    EmptyBackend,
}

/// Serializes bulk loads for one store so an older fetch never lands
/// after a newer one.
pub(crate) struct Loader {
    store: Arc<DataStore>,
    user_id: Option<String>,
    serial: Mutex<()>,
}

impl Loader {
    pub(crate) fn new(store: Arc<DataStore>, user_id: Option<String>) -> Self {
        Self {
            store,
            user_id,
            serial: Mutex::new(()),
        }
    }

    /// Principal whose profile is loaded alongside the collections.
    pub(crate) fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Reload everything through `remote`, one load at a time.
    pub(crate) async fn reload(&self, remote: &RemoteStore) -> Result<LoadOutcome, CoreError> {
        let _serial = self.serial.lock().await;
        full_refresh(remote, &self.store, self.user_id()).await
    }
}

/// Load everything and apply it atomically.
async fn full_refresh(
    remote: &RemoteStore,
    store: &DataStore,
    user_id: Option<&str>,
) -> Result<LoadOutcome, CoreError> {
    store.set_load_state(LoadState::Loading);

    match fetch_snapshot(remote, user_id).await {
        Ok(snapshot) if snapshot.is_unseeded() => {
            info!("backend has no clients, projects or packages");
            store.set_load_state(LoadState::EmptyBackend);
            Ok(LoadOutcome::EmptyBackend)
        }
        Ok(snapshot) => {
            let (clients, projects, transactions) = (
                snapshot.clients.len(),
                snapshot.projects.len(),
                snapshot.transactions.len(),
            );
            store.apply_snapshot(snapshot);
            store.set_load_state(LoadState::Ready);
            debug!(clients, projects, transactions, "data refresh complete");
            Ok(LoadOutcome::Applied)
        }
        Err(e) => {
            warn!(error = %e, "full refresh failed; cache left unchanged");
            store.set_load_state(LoadState::Failed(e.to_string()));
            Err(e)
        }
    }
}

async fn fetch_snapshot(
    remote: &RemoteStore,
    user_id: Option<&str>,
) -> Result<CacheSnapshot, CoreError> {
    let profile = async {
        match user_id {
            Some(id) => remote.profile(id).await,
            None => Ok(None),
        }
    };

    let (
        (users, clients, projects, packages, add_ons),
        (team_members, transactions, leads, cards, financial_pockets),
        (team_project_payments, team_payment_records, reward_ledger_entries, assets, client_feedback),
        (contracts, notifications, social_media_posts, promo_codes, sops),
        profile,
    ) = tokio::try_join!(
        async {
            tokio::try_join!(
                remote.fetch_all::<User>(),
                remote.fetch_all::<Client>(),
                remote.fetch_all::<Project>(),
                remote.fetch_all::<Package>(),
                remote.fetch_all::<AddOn>(),
            )
        },
        async {
            tokio::try_join!(
                remote.fetch_all::<TeamMember>(),
                remote.fetch_all::<Transaction>(),
                remote.fetch_all::<Lead>(),
                remote.fetch_all::<Card>(),
                remote.fetch_all::<FinancialPocket>(),
            )
        },
        async {
            tokio::try_join!(
                remote.fetch_all::<TeamProjectPayment>(),
                remote.fetch_all::<TeamPaymentRecord>(),
                remote.fetch_all::<RewardLedgerEntry>(),
                remote.fetch_all::<Asset>(),
                remote.fetch_all::<ClientFeedback>(),
            )
        },
        async {
            tokio::try_join!(
                remote.fetch_all::<Contract>(),
                remote.fetch_all::<Notification>(),
                remote.fetch_all::<SocialMediaPost>(),
                remote.fetch_all::<PromoCode>(),
                remote.fetch_all::<Sop>(),
            )
        },
        profile,
    )?;

    Ok(CacheSnapshot {
        users: EntityCollection::from_records(users),
        clients: EntityCollection::from_records(clients),
        projects: EntityCollection::from_records(projects),
        packages: EntityCollection::from_records(packages),
        add_ons: EntityCollection::from_records(add_ons),
        team_members: EntityCollection::from_records(team_members),
        transactions: EntityCollection::from_records(transactions),
        leads: EntityCollection::from_records(leads),
        cards: EntityCollection::from_records(cards),
        financial_pockets: EntityCollection::from_records(financial_pockets),
        team_project_payments: EntityCollection::from_records(team_project_payments),
        team_payment_records: EntityCollection::from_records(team_payment_records),
        reward_ledger_entries: EntityCollection::from_records(reward_ledger_entries),
        assets: EntityCollection::from_records(assets),
        client_feedback: EntityCollection::from_records(client_feedback),
        contracts: EntityCollection::from_records(contracts),
        notifications: EntityCollection::from_records(notifications),
        social_media_posts: EntityCollection::from_records(social_media_posts),
        promo_codes: EntityCollection::from_records(promo_codes),
        sops: EntityCollection::from_records(sops),
        profile: profile.map(Arc::new),
    })
}
