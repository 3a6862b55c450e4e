//! Output formatting: table, JSON, YAML.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde. Records arrive as JSON objects so one
//! renderer serves every collection.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use vendra_core::EntityKind;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Dim temporary ids so unconfirmed rows stand out.
fn paint_id(id: &str, color: bool) -> String {
    if color && id.starts_with(vendra_core::model::TEMP_PREFIX) {
        id.dimmed().to_string()
    } else if color {
        id.cyan().to_string()
    } else {
        id.to_owned()
    }
}

// ── Columns ──────────────────────────────────────────────────────────

/// Columns shown in table view, after `id`.
fn summary_columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Users => &["email", "full_name", "role"],
        EntityKind::Clients => &["name", "email", "phone", "status"],
        EntityKind::Projects => &["project_name", "client_name", "date", "status", "total_cost"],
        EntityKind::Packages => &["name", "price", "processing_time"],
        EntityKind::AddOns => &["name", "price"],
        EntityKind::TeamMembers => &["name", "role", "phone", "standard_fee"],
        EntityKind::Transactions => &["date", "description", "type", "amount", "category"],
        EntityKind::Leads => &["name", "contact_channel", "status", "date"],
        EntityKind::Cards => &["card_holder_name", "bank_name", "last_four_digits", "balance"],
        EntityKind::FinancialPockets => &["name", "type", "amount"],
        EntityKind::TeamProjectPayments => &["team_member_name", "project_id", "fee", "status"],
        EntityKind::TeamPaymentRecords => &["record_number", "team_member_id", "date", "total_amount"],
        EntityKind::RewardLedgerEntries => &["team_member_id", "date", "description", "amount"],
        EntityKind::Assets => &["name", "category", "status"],
        EntityKind::ClientFeedback => &["client_name", "rating", "date"],
        EntityKind::Contracts => &["contract_number", "client_name1", "signing_date"],
        EntityKind::Notifications => &["title", "timestamp", "is_read"],
        EntityKind::SocialMediaPosts => &["platform", "post_type", "scheduled_date", "status"],
        EntityKind::PromoCodes => &["code", "discount_type", "discount_value", "is_active"],
        EntityKind::Sops => &["title", "category", "last_updated"],
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(_)) => "{..}".into(),
        Some(other) => other.to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render records of one kind in the chosen format.
pub fn render_records(
    format: &OutputFormat,
    kind: EntityKind,
    records: &[Value],
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let columns = summary_columns(kind);
            let mut builder = Builder::default();
            builder.push_record(std::iter::once("id").chain(columns.iter().copied()));
            for record in records {
                let id = cell(record.get("id"));
                builder.push_record(
                    std::iter::once(paint_id(&id, color))
                        .chain(columns.iter().map(|c| cell(record.get(*c)))),
                );
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Json => render_json(records, false),
        OutputFormat::JsonCompact => render_json(records, true),
        OutputFormat::Yaml => render_yaml(records),
    }
}

/// Render a list of `Tabled` rows, or the rows' serde form.
pub fn render_rows<R>(format: &OutputFormat, rows: &[R]) -> Result<String, CliError>
where
    R: Tabled + serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(Table::new(rows).with(Style::rounded()).to_string()),
        OutputFormat::Json => render_json(rows, false),
        OutputFormat::JsonCompact => render_json(rows, true),
        OutputFormat::Yaml => render_yaml(rows),
    }
}

/// Render a single item; table view uses `detail_fn`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Key/value detail view of one record.
pub fn record_detail(record: &Value) -> String {
    let Some(fields) = record.as_object() else {
        return cell(Some(record));
    };
    let mut builder = Builder::default();
    for (key, value) in fields {
        builder.push_record([key.clone(), cell(Some(value))]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
