//! CLI flag overrides layered on top of vendra-config profiles.
//!
//! Flags win over the profile, the profile wins over defaults. Without a
//! profile the CLI can still run from `--url` and `--key` alone.

use secrecy::SecretString;
use vendra_config::{self as config, Config, Profile};
use vendra_core::SyncConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply flag overrides to a profile.
fn with_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref key) = global.key {
        profile.api_key = Some(key.clone());
        profile.api_key_env = None;
    }
    if global.insecure {
        profile.insecure = true;
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile
}

/// Build the `SyncConfig` for a backend-bound command.
pub fn build_sync_config(global: &GlobalOpts) -> Result<SyncConfig, CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly named profile must exist.
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None if global.url.is_none() => {
            return Err(CliError::NoConfig {
                path: config::config_path().display().to_string(),
            });
        }
        None => Profile::default(),
    };

    let mut sync = config::profile_to_sync_config(&with_overrides(base, global), &profile_name)?;
    // The flag beats a keyring entry for the same profile.
    if let Some(ref key) = global.key {
        sync.api_key = SecretString::from(key.clone());
    }
    Ok(sync)
}
