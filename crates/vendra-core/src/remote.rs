// ── Remote store adapter ──
//
// Typed CRUD over the table API: each call is one round trip that either
// yields fully populated records or a `CoreError` with the cause.

use tracing::debug;
use vendra_api::RestClient;

use crate::error::CoreError;
use crate::model::{Client, Entity, EntityId, Profile, ProfilePatch, TeamMember};

const PROFILES_TABLE: &str = "profiles";
const PROFILE_OWNER: &str = "user_id";
const PORTAL_COLUMN: &str = "portal_access_id";

/// Typed adapter over [`RestClient`]. No retries, no caching.
pub struct RemoteStore {
    rest: RestClient,
}

impl RemoteStore {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Every row of `T`'s table in its default order.
    pub async fn fetch_all<T: Entity>(&self) -> Result<Vec<T>, CoreError> {
        let rows: Vec<T> = self.rest.select_all(T::KIND.table(), T::KIND.order()).await?;
        if let Some(bad) = rows.iter().find(|r| r.id().is_empty()) {
            return Err(invalid::<T>(bad.id()));
        }
        debug!(kind = %T::KIND, count = rows.len(), "fetched");
        Ok(rows)
    }

    /// Insert a draft; returns the stored record with its backend id.
    pub async fn create<T: Entity>(&self, draft: &T::Draft) -> Result<T, CoreError> {
        let record: T = self.rest.insert(T::KIND.table(), draft).await?;
        validated(record)
    }

    /// Patch the record with `id`; returns the stored record.
    pub async fn update<T: Entity>(&self, id: &EntityId, patch: &T::Patch) -> Result<T, CoreError> {
        let key = id.to_string();
        let record: T = self
            .rest
            .update(T::KIND.table(), &key, patch)
            .await
            .map_err(|e| with_identity::<T>(e, id))?;
        validated(record)
    }

    pub async fn delete<T: Entity>(&self, id: &EntityId) -> Result<(), CoreError> {
        self.rest
            .delete(T::KIND.table(), &id.to_string())
            .await
            .map_err(|e| with_identity::<T>(e, id))
    }

    // ── Single-row lookups ───────────────────────────────────────────

    /// Client whose portal link carries `portal_id`.
    pub async fn client_by_portal_id(&self, portal_id: &str) -> Result<Option<Client>, CoreError> {
        self.single::<Client>(PORTAL_COLUMN, portal_id).await
    }

    /// Team member whose portal link carries `portal_id`.
    pub async fn team_member_by_portal_id(
        &self,
        portal_id: &str,
    ) -> Result<Option<TeamMember>, CoreError> {
        self.single::<TeamMember>(PORTAL_COLUMN, portal_id).await
    }

    /// Business profile owned by `user_id`.
    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>, CoreError> {
        Ok(self.rest.select_single(PROFILES_TABLE, PROFILE_OWNER, user_id).await?)
    }

    /// Insert a profile row; returns it with its backend id.
    pub async fn create_profile(&self, profile: &Profile) -> Result<Profile, CoreError> {
        Ok(self.rest.insert(PROFILES_TABLE, profile).await?)
    }

    /// Patch the profile owned by `user_id`.
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Profile, CoreError> {
        self.rest
            .update_where(PROFILES_TABLE, PROFILE_OWNER, user_id, patch)
            .await
            .map_err(|e| {
                if e.is_no_rows() {
                    CoreError::NotFound {
                        kind: PROFILES_TABLE.into(),
                        identifier: user_id.to_owned(),
                    }
                } else {
                    e.into()
                }
            })
    }

    async fn single<T: Entity>(&self, column: &str, value: &str) -> Result<Option<T>, CoreError> {
        self.rest
            .select_single::<T>(T::KIND.table(), column, value)
            .await?
            .map(validated)
            .transpose()
    }
}

fn validated<T: Entity>(record: T) -> Result<T, CoreError> {
    if record.id().is_empty() {
        return Err(invalid::<T>(record.id()));
    }
    Ok(record)
}

fn invalid<T: Entity>(id: &EntityId) -> CoreError {
    CoreError::InvalidRecord {
        message: format!("{} row with unusable id '{id}'", T::KIND),
    }
}

/// Attach the kind and id to a "no rows" answer.
fn with_identity<T: Entity>(err: vendra_api::Error, id: &EntityId) -> CoreError {
    if err.is_no_rows() {
        CoreError::not_found(T::KIND, id)
    } else {
        err.into()
    }
}
