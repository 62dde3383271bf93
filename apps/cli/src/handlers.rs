use anyhow::{Result, bail};
use osprofiles::ProfileRegistry;
use osprofiles::store::{Classified, SecurityLevel, generate_security_report};
use serde_json::Value;
use tracing::info;

use crate::model::ConnectionProfile;

const REDACTED: &str = "<redacted>";

pub fn add(
    registry: &mut ProfileRegistry,
    name: String,
    endpoint: String,
    api_key: String,
    set_default: bool,
) -> Result<()> {
    let profile = ConnectionProfile { name, endpoint, api_key, session_token: None };
    registry.add_profile(&profile, set_default)?;
    info!(profile = %profile.name, "Profile stored");
    println!("Added profile `{}`", profile.name);
    Ok(())
}

pub fn show(registry: &ProfileRegistry, name: Option<&str>, reveal: bool) -> Result<()> {
    let profile: ConnectionProfile = match name {
        Some(name) => registry.load_profile(name)?,
        None => registry.load_default()?,
    };

    let mut json = serde_json::to_value(&profile)?;
    if !reveal && let Value::Object(fields) = &mut json {
        for (key, value) in fields.iter_mut() {
            if ConnectionProfile::level_of(key) == Some(SecurityLevel::Secure) {
                *value = Value::String(REDACTED.to_owned());
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

pub fn list(registry: &ProfileRegistry) {
    let default = registry.default_profile();
    for name in registry.profile_names() {
        let marker = if Some(name.as_str()) == default { "*" } else { " " };
        println!("{marker} {name}");
    }
}

pub fn use_profile(registry: &mut ProfileRegistry, name: &str) -> Result<()> {
    registry.set_default(name)?;
    println!("Default profile is now `{name}`");
    Ok(())
}

pub fn remove(registry: &mut ProfileRegistry, name: &str) -> Result<()> {
    registry.delete_profile(name)?;
    println!("Removed profile `{name}`");
    Ok(())
}

pub fn purge(registry: &mut ProfileRegistry, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("refusing to delete every profile in `{}` without --yes", registry.namespace());
    }
    let count = registry.profile_names().len();
    registry.delete_all()?;
    println!("Removed {count} profile(s)");
    Ok(())
}

pub fn report() -> Result<()> {
    let report = generate_security_report::<ConnectionProfile>();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
