//! Configuration loader for Keepsake.
//!
//! Reads `config.toml` from the data directory (`~/.keepsake/` in production)
//! and deserializes it into [`KeepsakeConfig`]. Falls back to defaults when
//! the file is missing or malformed. Without a `[provider]` table the engine
//! runs offline: every ask resolves through the deterministic fallback path.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use keepsake_types::config::{EngineConfig, ProviderConfig};

/// Top-level configuration, the shape of `config.toml`.
#[derive(Clone, Default, Deserialize)]
pub struct KeepsakeConfig {
    /// `[engine]` table: continuity-engine knobs.
    #[serde(default)]
    pub engine: EngineConfig,

    /// `[provider]` table; absent means no outbound provider calls.
    #[serde(default)]
    pub provider: Option<ProviderSection>,
}

/// The `[provider]` table of `config.toml`.
///
/// Does NOT derive Debug: the API key must never reach log output, even
/// in redacted form.
#[derive(Clone, Deserialize)]
pub struct ProviderSection {
    /// API key for the provider. The engine runs offline when absent.
    pub api_key: Option<SecretString>,

    /// Endpoint override for OpenAI-compatible vendors and local proxies.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request settings (model, token cap, temperature, timeout), read
    /// from the same table.
    #[serde(flatten)]
    pub settings: ProviderConfig,
}

/// Resolve the data directory from `KEEPSAKE_DATA_DIR`, falling back to
/// `~/.keepsake`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KEEPSAKE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".keepsake")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`KeepsakeConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> KeepsakeConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return KeepsakeConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return KeepsakeConfig::default();
        }
    };

    match toml::from_str::<KeepsakeConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            KeepsakeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert!(config.provider.is_none());
        assert!(!config.engine.question_templates.is_empty());
        assert_eq!(config.engine.min_detail_len, 20);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[engine]
min_detail_len = 32

[provider]
api_key = "sk-test-not-real"
base_url = "http://localhost:8099/v1"
model = "pico-2"
max_tokens = 512
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.engine.min_detail_len, 32);
        // Untouched engine fields keep their defaults
        assert_eq!(config.engine.max_avoided_questions, 40);

        let provider = config.provider.unwrap();
        assert_eq!(
            provider.api_key.unwrap().expose_secret(),
            "sk-test-not-real"
        );
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:8099/v1"));
        assert_eq!(provider.settings.model, "pico-2");
        assert_eq!(provider.settings.max_tokens, 512);
        // Flattened settings fall back to their own defaults
        assert_eq!(provider.settings.timeout_secs, 30);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert!(config.provider.is_none());
        assert_eq!(config.engine.min_detail_len, 20);
    }

    #[tokio::test]
    async fn load_config_provider_without_key_is_kept() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "[provider]\nmodel = \"pico-2\"\n")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        let provider = config.provider.unwrap();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.settings.model, "pico-2");
    }

    #[test]
    fn data_dir_ends_with_keepsake_by_default() {
        // Only meaningful when the env var is unset, which is the common
        // case in CI; tolerate either outcome.
        let dir = data_dir();
        if std::env::var("KEEPSAKE_DATA_DIR").is_err() {
            assert!(dir.ends_with(".keepsake"));
        }
    }
}
