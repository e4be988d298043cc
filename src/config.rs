use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

const CONFIG_DIR: &str = "codecritic";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Analyzer configuration, resolved once at startup and passed by value.
///
/// No module-level singleton: every pipeline instance receives its own copy,
/// which keeps concurrent analyses independent and tests trivial to set up.
#[derive(Deserialize, Debug, Clone)]
pub struct AiConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            temperature: 0.2,
            max_tokens: 8000,
            max_attempts: 3,
            base_delay_ms: 1500,
            timeout_secs: 60,
        }
    }
}

/// Partial configuration as loaded from the TOML file.
#[derive(Deserialize, Debug, Default)]
pub struct PartialAiConfig {
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    ai: Option<PartialAiConfig>,
}

impl AiConfig {
    /// Loads configuration from `~/.config/codecritic/config.toml` (when
    /// present) with `CODECRITIC_*` environment variables taking priority.
    ///
    /// A missing API key is not an error here: it surfaces as an
    /// authentication failure on the first real call.
    pub fn load() -> Result<Self, ConfigError> {
        let file_config = match user_config_path() {
            Some(path) if path.exists() => Some(read_config_file(&path)?),
            _ => None,
        };
        let env_map: HashMap<String, String> = std::env::vars().collect();
        Ok(Self::from_env_or_file(file_config, &env_map))
    }

    /// Resolves the final configuration, giving priority to environment
    /// variables over file values over built-in defaults.
    pub fn from_env_or_file(
        file_config: Option<PartialAiConfig>,
        env_map: &HashMap<String, String>,
    ) -> Self {
        let file = file_config.unwrap_or_default();
        let defaults = AiConfig::default();

        AiConfig {
            api_url: env_map
                .get("CODECRITIC_API_URL")
                .cloned()
                .or(file.api_url)
                .unwrap_or(defaults.api_url),
            model: env_map
                .get("CODECRITIC_MODEL")
                .cloned()
                .or(file.model)
                .unwrap_or(defaults.model),
            api_key: env_map
                .get("CODECRITIC_API_KEY")
                .cloned()
                .or(file.api_key),
            temperature: env_map
                .get("CODECRITIC_TEMPERATURE")
                .and_then(|s| s.parse().ok())
                .or(file.temperature)
                .unwrap_or(defaults.temperature),
            max_tokens: env_map
                .get("CODECRITIC_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .or(file.max_tokens)
                .unwrap_or(defaults.max_tokens),
            max_attempts: env_map
                .get("CODECRITIC_MAX_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .or(file.max_attempts)
                .unwrap_or(defaults.max_attempts),
            base_delay_ms: env_map
                .get("CODECRITIC_BASE_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .or(file.base_delay_ms)
                .unwrap_or(defaults.base_delay_ms),
            timeout_secs: env_map
                .get("CODECRITIC_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .or(file.timeout_secs)
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE_NAME))
}

fn read_config_file(path: &Path) -> Result<PartialAiConfig, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(display.clone(), e))?;
    let file: ConfigFile =
        toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(display, e))?;
    Ok(file.ai.unwrap_or_default())
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "mistralai/mistral-7b-instruct".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_file_or_env() {
        let config = AiConfig::from_env_or_file(None, &HashMap::new());
        assert_eq!(config.api_url, default_api_url());
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 8000);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 1500);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn env_overrides_file() {
        let file_config = PartialAiConfig {
            api_url: Some("http://file.example/v1".to_string()),
            model: Some("file-model".to_string()),
            api_key: Some("file-key".to_string()),
            temperature: Some(0.7),
            ..Default::default()
        };

        let mut env_map = HashMap::new();
        env_map.insert(
            "CODECRITIC_API_URL".to_string(),
            "http://env.example/v1".to_string(),
        );
        env_map.insert("CODECRITIC_API_KEY".to_string(), "env-key".to_string());

        let config = AiConfig::from_env_or_file(Some(file_config), &env_map);
        assert_eq!(config.api_url, "http://env.example/v1"); // env override
        assert_eq!(config.model, "file-model"); // from file
        assert_eq!(config.temperature, 0.7); // from file
        assert_eq!(config.api_key, Some("env-key".to_string())); // env override
    }

    #[test]
    fn reads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ai]\nmodel = \"test-model\"\nmax_attempts = 5"
        )
        .unwrap();

        let partial = read_config_file(file.path()).unwrap();
        let config = AiConfig::from_env_or_file(Some(partial), &HashMap::new());
        assert_eq!(config.model, "test-model");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay_ms, 1500); // default
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();

        assert!(matches!(
            read_config_file(file.path()),
            Err(ConfigError::TomlParse(_, _))
        ));
    }
}
