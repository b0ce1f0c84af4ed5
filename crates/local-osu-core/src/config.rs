use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::utils::{delete_keys, real_type};

pub const DEFAULT_CONFIG_NAME: &str = "Config";
pub const MAX_SCORES_ON_LEADERBOARD: u32 = 100;

/// Keys hidden from `redacted()` output.
const SECRET_KEYS: &[&str] = &[
    "osu_api_key",
    "osu_daily_api_key",
    "osu_password",
    "imgur_client_id",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub osu_path: Option<String>,
    pub songs: Option<String>,
    pub replay: Option<String>,
    pub screenshots: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuIcon {
    pub image_link: Option<String>,
    pub click_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Location of the published `version.toml` manifest.
    pub manifest_url: String,
    /// Raw file content is fetched from `{content_base_url}/{path}`.
    pub content_base_url: String,
    /// Writing a file with this name triggers `install_command`.
    pub dependency_manifest: String,
    pub install_command: String,
    pub http_timeout_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            manifest_url:
                "https://raw.githubusercontent.com/coverosu/local-osu-server/main/version.toml"
                    .to_string(),
            content_base_url: "https://raw.githubusercontent.com/coverosu/local-osu-server/main"
                .to_string(),
            dependency_manifest: "requirements.txt".to_string(),
            install_command: "python -m pip install -r requirements.txt".to_string(),
            http_timeout_secs: 10,
        }
    }
}

impl UpdaterConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub pp_leaderboard: bool,
    pub ping_user_when_recent_score: bool,
    pub menu_icon: MenuIcon,
    pub command_prefix: String,
    pub show_pp_for_personal_best: bool,
    pub amount_of_scores_on_lb: u32,
    pub auto_update: bool,
    /// Exclude scores on osu!trainer (modified) maps from pp totals.
    pub disable_funorange_maps: bool,
    pub seasonal_bgs: Vec<String>,
    pub osu_api_key: Option<String>,
    pub imgur_client_id: Option<String>,
    pub osu_daily_api_key: Option<String>,
    pub osu_username: Option<String>,
    /// MD5 hex digest, never the plain password.
    pub osu_password: Option<String>,
    pub updater: UpdaterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            pp_leaderboard: false,
            ping_user_when_recent_score: false,
            menu_icon: MenuIcon::default(),
            command_prefix: "!".to_string(),
            show_pp_for_personal_best: false,
            amount_of_scores_on_lb: 50,
            auto_update: false,
            disable_funorange_maps: false,
            seasonal_bgs: Vec::new(),
            osu_api_key: None,
            imgur_client_id: None,
            osu_daily_api_key: None,
            osu_username: None,
            osu_password: None,
            updater: UpdaterConfig::default(),
        }
    }
}

/// Load `Config.toml` (if present) from the working directory, layered with
/// `LOCAL_OSU__*` environment overrides.
pub fn load_configuration() -> std::result::Result<AppConfig, ConfigError> {
    load_from(DEFAULT_CONFIG_NAME)
}

pub fn load_from(name: &str) -> std::result::Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(Environment::with_prefix("LOCAL_OSU").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

impl AppConfig {
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// JSON view with credentials stripped.
    pub fn redacted(&self) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        let map = value
            .as_object()
            .ok_or_else(|| Error::Other("configuration is not an object".to_string()))?;
        Ok(Value::Object(delete_keys(map, SECRET_KEYS)))
    }

    /// Set `key` (dotted for nested sections, e.g. `paths.songs`) from its raw
    /// string form. The resulting configuration must still deserialize.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut value = serde_json::to_value(&*self)?;

        let mut parts = key.split('.').peekable();
        let mut target = &mut value;
        while let Some(part) = parts.next() {
            let object = target
                .as_object_mut()
                .ok_or_else(|| Error::InvalidInput(format!("'{}' is not a section", key)))?;
            if !object.contains_key(part) {
                return Err(Error::InvalidInput(format!("unknown config key '{}'", key)));
            }
            target = object
                .get_mut(part)
                .ok_or_else(|| Error::InvalidInput(format!("unknown config key '{}'", key)))?;
            if parts.peek().is_none() {
                *target = coerce(target, raw);
            }
        }

        let updated: AppConfig = serde_json::from_value(value)
            .map_err(|e| Error::InvalidInput(format!("invalid value for '{}': {}", key, e)))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount_of_scores_on_lb == 0 || self.amount_of_scores_on_lb > MAX_SCORES_ON_LEADERBOARD
        {
            return Err(Error::InvalidInput(format!(
                "amount_of_scores_on_lb must be between 1 and {}",
                MAX_SCORES_ON_LEADERBOARD
            )));
        }
        Ok(())
    }
}

/// Type `raw` for the slot it is going into: `None` clears optional values and
/// string slots keep the text verbatim.
fn coerce(current: &Value, raw: &str) -> Value {
    if raw == "None" {
        return Value::Null;
    }
    match current {
        Value::String(_) => Value::String(raw.to_string()),
        Value::Array(_) if !raw.trim_start().starts_with('[') => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => match real_type(raw) {
            Value::Number(n) if current.is_null() => Value::String(n.to_string()),
            typed => typed,
        },
    }
}
