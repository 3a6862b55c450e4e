//! `vendra watch`: stay connected and print each collection change.

use std::sync::Arc;

use owo_colors::OwoColorize;
use strum::IntoEnumIterator;
use tracing::info;

use vendra_core::{CacheSnapshot, Controller, EntityKind, SyncConfig};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

/// One line per collection whose contents moved between snapshots.
fn describe_changes(prev: &CacheSnapshot, next: &CacheSnapshot, color: bool) -> Vec<String> {
    let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
    EntityKind::iter()
        .filter(|&kind| prev.version_of(kind) != next.version_of(kind))
        .map(|kind| {
            let (before, after) = (prev.len_of(kind), next.len_of(kind));
            let table = if color {
                kind.table().cyan().to_string()
            } else {
                kind.table().to_owned()
            };
            format!("{stamp}  {table:<24} {before} -> {after} records")
        })
        .collect()
}

pub async fn handle(
    mut config: SyncConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.realtime_enabled = true;
    if !args.tables.is_empty() {
        config.watched_kinds = args.tables;
    }
    let watched: Vec<&'static str> = config.watched_kinds.iter().map(|k| k.table()).collect();

    let controller = Controller::new(config);
    controller.connect().await?;
    info!(tables = ?watched, "watching for remote changes");
    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", watched.join(", "));
    }

    let color = output::should_color(&global.color);
    let mut snapshots = controller.subscribe_all();
    let mut prev: Arc<CacheSnapshot> = snapshots.borrow_and_update().clone();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = snapshots.borrow_and_update().clone();
                for line in describe_changes(&prev, &next, color) {
                    output::print_output(&line, global.quiet);
                }
                prev = next;
            }
        }
    }

    controller.disconnect().await;
    Ok(())
}
