//! Config subcommand handlers.

use dialoguer::Input;

use vendra_config::{self as config, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs};
use crate::commands::util::prompt_err;
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init_args) => init(&init_args, global),
        ConfigCommand::Show => show(global),
        ConfigCommand::SetKey { value } => set_key(value, global),
    }
}

// ── Init ─────────────────────────────────────────────────────────────

/// Add (or replace) a profile. Flags answer the questions; anything
/// missing is prompted for.
fn init(args: &InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();

    let profile_name = match args.name.clone().or_else(|| global.profile.clone()) {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Profile name")
            .default("default".into())
            .interact_text()
            .map_err(prompt_err)?,
    };

    let url = match global.url.clone() {
        Some(url) => url,
        None => Input::<String>::new()
            .with_prompt("Project URL")
            .interact_text()
            .map_err(prompt_err)?,
    };
    url.parse::<url::Url>().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {url}"),
    })?;

    let key = match global.key.clone() {
        Some(key) => key,
        None => rpassword::prompt_password("Public API key: ").map_err(prompt_err)?,
    };
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }

    let api_key = if args.plaintext_key {
        Some(key)
    } else {
        config::store_api_key(&profile_name, &key)?;
        if !global.quiet {
            eprintln!("   ✓ API key stored in system keyring");
        }
        None
    };

    let profile = Profile {
        url,
        api_key,
        timeout: global.timeout,
        insecure: global.insecure,
        ..Profile::default()
    };

    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    let written = config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("✓ Profile '{profile_name}' written to {}", written.display());
        eprintln!("  Test it: vendra --profile {profile_name} sync");
    }
    Ok(())
}

// ── Show ─────────────────────────────────────────────────────────────

fn masked(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
    }
    cfg
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path();
    let cfg = masked(config::load_config()?);
    let out = output::render_single(&global.output, &cfg, |c| {
        format!("# {}\n{c:#?}", path.display())
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Set key ──────────────────────────────────────────────────────────

fn set_key(value: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let (profile_name, _) = cfg.profile(global.profile.as_deref())?;

    let key = match value {
        Some(key) => key,
        None => rpassword::prompt_password("Public API key: ").map_err(prompt_err)?,
    };
    config::store_api_key(&profile_name, &key)?;

    if !global.quiet {
        eprintln!("✓ API key for '{profile_name}' stored in system keyring");
    }
    Ok(())
}
