//! Global configuration loader for Choreo.
//!
//! Reads `config.toml` from the data directory (`~/.choreo/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use choreo_types::config::GlobalConfig;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the token store database URL.
///
/// A `database_url` set in `config.toml` wins; otherwise the
/// `CHOREO_DATA_DIR`-based default applies.
pub fn resolve_database_url(config: &GlobalConfig) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(crate::sqlite::pool::default_database_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.event_channel_capacity, 1024);
        assert!(config.database_url.is_none());
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
event_channel_capacity = 64
database_url = "sqlite:///var/lib/choreo/choreo.db"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.event_channel_capacity, 64);
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite:///var/lib/choreo/choreo.db")
        );
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.event_channel_capacity, 1024);
    }

    #[test]
    fn resolve_database_url_prefers_config_value() {
        let config = GlobalConfig {
            database_url: Some("sqlite:///custom/choreo.db".to_string()),
            ..GlobalConfig::default()
        };
        assert_eq!(resolve_database_url(&config), "sqlite:///custom/choreo.db");
    }

    #[test]
    fn resolve_database_url_falls_back_to_default() {
        let config = GlobalConfig::default();
        assert!(resolve_database_url(&config).ends_with("/choreo.db"));
    }
}
