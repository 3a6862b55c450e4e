// ── Record definition macro ──
//
// Each cached kind needs the same four things: the record itself (wire
// row with nullable columns defaulted), a create payload, a partial
// update payload, and the `Entity` impl wiring them to a cache slot.
// `entity!` generates all four from one field list.

/// Define a cached record type and its draft / patch payloads.
///
/// ```ignore
/// entity! {
///     /// A customer.
///     pub struct Client in clients as Clients {
///         pub name: String,
///     }
///     draft ClientDraft;
///     patch ClientPatch;
/// }
/// ```
///
/// Fields in the optional `server { .. }` block are read from the backend
/// but never written by drafts or patches.
macro_rules! entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident in $slot:ident as $kind:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty, )+
        }
        $( server { $( pub $sfield:ident : $sty:ty, )+ } )?
        draft $draft:ident;
        patch $patch:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            pub id: $crate::model::EntityId,
            $(
                $(#[$fmeta])*
                #[serde(default, deserialize_with = "crate::model::wire::nullable")]
                pub $field: $ty,
            )+
            $($(
                #[serde(default, deserialize_with = "crate::model::wire::nullable")]
                pub $sfield: $sty,
            )+)?
        }

        #[doc = concat!("Create payload for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $draft {
            $( $(#[$fmeta])* pub $field: $ty, )+
        }

        #[doc = concat!("Partial update for [`", stringify!($name), "`]; `None` fields are left alone.")]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $patch {
            $(
                $(#[$fmeta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl $patch {
            /// `true` when no field is set.
            pub fn is_empty(&self) -> bool {
                $( self.$field.is_none() )&&+
            }
        }

        impl $crate::model::Entity for $name {
            type Draft = $draft;
            type Patch = $patch;

            const KIND: $crate::model::EntityKind = $crate::model::EntityKind::$kind;

            fn id(&self) -> &$crate::model::EntityId {
                &self.id
            }

            fn from_draft(id: $crate::model::EntityId, draft: &$draft) -> Self {
                Self {
                    id,
                    $( $field: draft.$field.clone(), )+
                    $($( $sfield: <$sty>::default(), )+)?
                }
            }

            fn apply_patch(&mut self, patch: &$patch) {
                $(
                    if let Some(value) = &patch.$field {
                        self.$field.clone_from(value);
                    }
                )+
            }

            fn collection(cache: &$crate::store::CacheSnapshot) -> &$crate::store::EntityCollection<Self> {
                &cache.$slot
            }

            fn collection_mut(
                cache: &mut $crate::store::CacheSnapshot,
            ) -> &mut $crate::store::EntityCollection<Self> {
                &mut cache.$slot
            }
        }
    };
}

/// Run `$body` with `$t` bound to the record type of a runtime
/// [`EntityKind`](crate::model::EntityKind).
///
/// ```ignore
/// let n = with_entity_type!(kind, T => snapshot.collection::<T>().len());
/// ```
#[macro_export]
macro_rules! with_entity_type {
    ($kind:expr, $t:ident => $body:expr) => {{
        use $crate::model::EntityKind as __Kind;
        match $kind {
            __Kind::Users => { type $t = $crate::model::User; $body }
            __Kind::Clients => { type $t = $crate::model::Client; $body }
            __Kind::Projects => { type $t = $crate::model::Project; $body }
            __Kind::Packages => { type $t = $crate::model::Package; $body }
            __Kind::AddOns => { type $t = $crate::model::AddOn; $body }
            __Kind::TeamMembers => { type $t = $crate::model::TeamMember; $body }
            __Kind::Transactions => { type $t = $crate::model::Transaction; $body }
            __Kind::Leads => { type $t = $crate::model::Lead; $body }
            __Kind::Cards => { type $t = $crate::model::Card; $body }
            __Kind::FinancialPockets => { type $t = $crate::model::FinancialPocket; $body }
            __Kind::TeamProjectPayments => { type $t = $crate::model::TeamProjectPayment; $body }
            __Kind::TeamPaymentRecords => { type $t = $crate::model::TeamPaymentRecord; $body }
            __Kind::RewardLedgerEntries => { type $t = $crate::model::RewardLedgerEntry; $body }
            __Kind::Assets => { type $t = $crate::model::Asset; $body }
            __Kind::ClientFeedback => { type $t = $crate::model::ClientFeedback; $body }
            __Kind::Contracts => { type $t = $crate::model::Contract; $body }
            __Kind::Notifications => { type $t = $crate::model::Notification; $body }
            __Kind::SocialMediaPosts => { type $t = $crate::model::SocialMediaPost; $body }
            __Kind::PromoCodes => { type $t = $crate::model::PromoCode; $body }
            __Kind::Sops => { type $t = $crate::model::Sop; $body }
        }
    }};
}
