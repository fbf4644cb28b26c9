//! `viralclip config` - show, initialise, and edit configuration.

use anyhow::{anyhow, Result};

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;

/// Runs the config subcommand.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow!("failed to serialize config: {e}"))?;
            println!("{toml_str}");
        }

        ConfigAction::Init => {
            let config_path = Settings::default_config_path();
            if config_path.exists() {
                Output::info(&format!("config file already exists at {}", config_path.display()));
            } else {
                settings.save()?;
                Output::success(&format!("wrote default config to {}", config_path.display()));
            }
        }

        ConfigAction::Set { key, value } => {
            let updated = set_key(&settings, key, value)?;
            updated.save()?;
            Output::success(&format!("set {key} = {value}"));
        }

        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }

    Ok(())
}

/// Applies a single `key = value` override on top of the current settings by
/// round-tripping through a TOML table, then re-parsing into [`Settings`] so
/// unknown keys and malformed values surface as errors rather than being ignored.
fn set_key(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let toml_str = toml::to_string_pretty(settings)
        .map_err(|e| anyhow!("failed to serialize config: {e}"))?;
    let mut parsed: toml::Value = toml::from_str(&toml_str)?;
    let map = parsed
        .as_table_mut()
        .ok_or_else(|| anyhow!("internal error: settings did not serialize to a table"))?;

    if !map.contains_key(key) {
        return Err(anyhow!("unknown configuration key: {key}"));
    }

    let parsed_value = value
        .parse::<i64>()
        .map(toml::Value::Integer)
        .or_else(|_| value.parse::<f64>().map(toml::Value::Float))
        .or_else(|_| value.parse::<bool>().map(toml::Value::Boolean))
        .unwrap_or_else(|_| toml::Value::String(value.to_string()));

    map.insert(key.to_string(), parsed_value);

    let updated_str =
        toml::to_string(&parsed).map_err(|e| anyhow!("failed to serialize updated config: {e}"))?;
    toml::from_str(&updated_str).map_err(|e| anyhow!("{value:?} is not a valid value for {key}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_key_updates_integer_field() {
        let settings = Settings::default();
        let updated = set_key(&settings, "max_clips", "2").unwrap();
        assert_eq!(updated.max_clips, 2);
    }

    #[test]
    fn test_set_key_rejects_unknown_key() {
        let settings = Settings::default();
        assert!(set_key(&settings, "not_a_real_key", "1").is_err());
    }
}
