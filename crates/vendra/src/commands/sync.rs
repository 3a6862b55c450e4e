//! `vendra sync`: run one bulk load and report what the cache holds.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use vendra_core::{CacheSnapshot, Controller, EntityKind, LoadState, SyncConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize, Tabled)]
pub struct CollectionRow {
    pub table: &'static str,
    pub records: usize,
}

pub fn collection_rows(snapshot: &CacheSnapshot) -> Vec<CollectionRow> {
    EntityKind::iter()
        .map(|kind| CollectionRow {
            table: kind.table(),
            records: snapshot.len_of(kind),
        })
        .collect()
}

pub async fn handle(config: SyncConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let (state, snapshot, user) = Controller::oneshot(config, |ctrl| async move {
        let state = ctrl.load_state().borrow().clone();
        Ok((state, ctrl.snapshot(), ctrl.current_user()))
    })
    .await?;

    if state == LoadState::EmptyBackend {
        return Err(CliError::EmptyBackend);
    }

    if !global.quiet {
        if let Some(user) = user {
            eprintln!("Signed in as {} ({})", user.full_name, user.role);
        }
        if let Some(profile) = snapshot.profile.as_deref() {
            if !profile.company_name.is_empty() {
                eprintln!("Studio: {}", profile.company_name);
            }
        }
    }

    let out = output::render_rows(&global.output, &collection_rows(&snapshot))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
