// ── Domain model ──
//
// Typed records for every cached collection, plus the `Entity` trait the
// store, the optimistic engine and the loader are generic over.

#[macro_use]
mod macros;

mod entity_id;
mod finance;
mod kind;
mod people;
mod project;
mod wire;
mod workspace;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::{CacheSnapshot, EntityCollection};

pub use entity_id::{EntityId, TEMP_PREFIX};
pub use finance::{
    Card, CardDraft, CardPatch, FinancialPocket, FinancialPocketDraft, FinancialPocketPatch,
    PromoCode, PromoCodeDraft, PromoCodePatch, RewardLedgerEntry, RewardLedgerEntryDraft,
    RewardLedgerEntryPatch, TeamPaymentRecord, TeamPaymentRecordDraft, TeamPaymentRecordPatch,
    TeamProjectPayment, TeamProjectPaymentDraft, TeamProjectPaymentPatch, Transaction,
    TransactionDraft, TransactionPatch,
};
pub use kind::EntityKind;
pub use people::{
    Client, ClientDraft, ClientPatch, Lead, LeadDraft, LeadPatch, TeamMember, TeamMemberDraft,
    TeamMemberPatch, User, UserDraft, UserPatch,
};
pub use project::{
    AddOn, AddOnDraft, AddOnPatch, ClientFeedback, ClientFeedbackDraft, ClientFeedbackPatch,
    Contract, ContractDraft, ContractPatch, Package, PackageDraft, PackagePatch, Project,
    ProjectDraft, ProjectPatch, SocialMediaPost, SocialMediaPostDraft, SocialMediaPostPatch,
};
pub use wire::NullableText;
pub use workspace::{
    Asset, AssetDraft, AssetPatch, Notification, NotificationDraft, NotificationPatch, Profile,
    ProfilePatch, Sop, SopDraft, SopPatch,
};

/// A record type held in one of the cache's collections.
///
/// Implemented by `entity!` for every kind; the associated types are the
/// create payload and the partial-update payload sent to the backend.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Draft: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Patch: Clone + fmt::Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    const KIND: EntityKind;

    fn id(&self) -> &EntityId;

    /// Build the optimistic record for a draft under the given id.
    fn from_draft(id: EntityId, draft: &Self::Draft) -> Self;

    /// Shallow merge: every field set in the patch overwrites the record's.
    fn apply_patch(&mut self, patch: &Self::Patch);

    fn collection(cache: &CacheSnapshot) -> &EntityCollection<Self>;

    fn collection_mut(cache: &mut CacheSnapshot) -> &mut EntityCollection<Self>;
}
