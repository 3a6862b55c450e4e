//! Record commands: list, create, update, delete.
//!
//! Each runs a one-shot connection: load, apply the edit optimistically,
//! wait for the backend to confirm, print the reconciled record.

use serde_json::Value;
use tracing::debug;

use vendra_core::{Controller, CoreError, Entity, EntityId, SyncConfig, with_entity_type};

use crate::cli::{CreateArgs, DeleteArgs, GlobalOpts, ListArgs, UpdateArgs};
use crate::commands::util::read_data;
use crate::error::CliError;
use crate::output;

fn to_json<T: serde::Serialize>(record: &T) -> Result<Value, CoreError> {
    serde_json::to_value(record).map_err(|e| CoreError::Internal(e.to_string()))
}

fn print_record(record: &Value, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, record, output::record_detail)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── List ─────────────────────────────────────────────────────────────

pub async fn list(config: SyncConfig, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = args.kind;
    let limit = args.limit.unwrap_or(usize::MAX);

    let records = Controller::oneshot(config, |ctrl| async move {
        with_entity_type!(kind, T => {
            ctrl.collection::<T>()
                .iter()
                .take(limit)
                .map(|r| to_json(&**r))
                .collect::<Result<Vec<_>, _>>()
        })
    })
    .await?;

    let color = output::should_color(&global.color);
    let out = output::render_records(&global.output, kind, &records, color)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Create ───────────────────────────────────────────────────────────

pub async fn create(
    config: SyncConfig,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = args.kind;
    let data = read_data(&args.data)?;

    // Parse before connecting so bad input never opens a session.
    let record = with_entity_type!(kind, T => {
        let draft: <T as Entity>::Draft = serde_json::from_value(data)?;
        Controller::oneshot(config, |ctrl| async move {
            let created = ctrl.create::<T>(draft).await?;
            debug!(%kind, id = %created.id(), "created");
            to_json(&*created)
        })
        .await?
    });

    print_record(&record, global)
}

// ── Update ───────────────────────────────────────────────────────────

pub async fn update(
    config: SyncConfig,
    args: UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = args.kind;
    let id = EntityId::from(args.id);
    let data = read_data(&args.data)?;

    let record = with_entity_type!(kind, T => {
        let patch: <T as Entity>::Patch = serde_json::from_value(data)?;
        if patch.is_empty() {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: format!("no known {kind} fields to update"),
            });
        }
        Controller::oneshot(config, |ctrl| async move {
            let updated = ctrl.update::<T>(id, patch).await?;
            to_json(&*updated)
        })
        .await?
    });

    print_record(&record, global)
}

// ── Delete ───────────────────────────────────────────────────────────

pub async fn delete(
    config: SyncConfig,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = args.kind;
    let id = EntityId::from(args.id);
    let shown = id.to_string();

    with_entity_type!(kind, T => {
        Controller::oneshot(config, |ctrl| async move { ctrl.delete::<T>(id).await }).await?;
    });

    if !global.quiet {
        eprintln!("Deleted {kind} {shown}");
    }
    Ok(())
}
