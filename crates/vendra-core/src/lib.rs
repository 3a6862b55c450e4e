// vendra-core: optimistic entity cache and sync engine between vendra-api and consumers (CLI).

pub mod config;
pub mod controller;
pub mod error;
pub mod listener;
pub mod loader;
pub mod model;
pub mod mutation;
pub mod remote;
mod resync;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Session, SyncConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use listener::ChangeListener;
pub use loader::{LoadOutcome, LoadState};
pub use mutation::{MutationOp, PendingMutation};
pub use store::{CacheSnapshot, DataStore, EntityCollection};
pub use stream::EntityStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Identity
    Entity, EntityId, EntityKind, NullableText,
    // People
    Client, ClientDraft, ClientPatch, Lead, LeadDraft, LeadPatch, TeamMember, TeamMemberDraft,
    TeamMemberPatch, User, UserDraft, UserPatch,
    // Projects
    AddOn, AddOnDraft, AddOnPatch, ClientFeedback, ClientFeedbackDraft, ClientFeedbackPatch,
    Contract, ContractDraft, ContractPatch, Package, PackageDraft, PackagePatch, Project,
    ProjectDraft, ProjectPatch, SocialMediaPost, SocialMediaPostDraft, SocialMediaPostPatch,
    // Finance
    Card, CardDraft, CardPatch, FinancialPocket, FinancialPocketDraft, FinancialPocketPatch,
    PromoCode, PromoCodeDraft, PromoCodePatch, RewardLedgerEntry, RewardLedgerEntryDraft,
    RewardLedgerEntryPatch, TeamPaymentRecord, TeamPaymentRecordDraft, TeamPaymentRecordPatch,
    TeamProjectPayment, TeamProjectPaymentDraft, TeamProjectPaymentPatch, Transaction,
    TransactionDraft, TransactionPatch,
    // Workspace
    Asset, AssetDraft, AssetPatch, Notification, NotificationDraft, NotificationPatch, Profile,
    ProfilePatch, Sop, SopDraft, SopPatch,
};
