//! Widget settings commands (ls, get, set)

use super::print_toast;
use crate::config::{settings_file, Settings};
use anyhow::Result;
use stagepanel_common::setting_keys::{self, validate};
use stagepanel_common::{Notification, SettingsStore};

/// List all settings, including known keys that are unset
pub fn list() -> Result<()> {
    let settings = Settings::load()?;

    println!("{:<36} {:<10}", "KEY", "VALUE");
    println!("{}", "-".repeat(48));

    for key in setting_keys::ALL {
        let value = settings.get(key).unwrap_or_else(|| "(unset)".to_string());
        println!("{:<36} {:<10}", key, value);
    }

    for (key, value) in settings.all() {
        if !setting_keys::ALL.contains(&key.as_str()) {
            println!("{:<36} {:<10}", key, value);
        }
    }

    println!();
    println!("Settings file: {}", settings_file().display());
    Ok(())
}

pub fn get(key: &str) -> Result<()> {
    let settings = Settings::load()?;
    match settings.get(key) {
        Some(value) => println!("{}", value),
        None => anyhow::bail!("Setting not found: {}", key),
    }
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    if let Err(message) = validate(key, value) {
        print_toast(&Notification::error(message.clone(), None));
        anyhow::bail!(message);
    }

    let mut settings = Settings::load()?;
    settings.set(key, value);
    settings.save()?;

    print_toast(&Notification::success(format!("Saved {} = {}", key, value)));
    Ok(())
}
