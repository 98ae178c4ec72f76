use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use elastic_builder::FieldMap;
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_BODY_LIMIT, DEFAULT_HOST, DEFAULT_PORT,
};

// =============================================================================
// File Config Structs (raw JSON layers)
// =============================================================================

/// Server configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Request limits section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LimitsFileConfig {
    pub max_body_bytes: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    /// Inline FieldMap
    pub fields: Option<FieldMap>,
    /// Path to a FieldMap JSON file
    pub fields_file: Option<String>,
    pub limits: Option<LimitsFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        // `fields` and `fields_file` are one setting: a layer naming either
        // replaces both
        if other.fields.is_some() || other.fields_file.is_some() {
            tracing::trace!(
                inline = other.fields.is_some(),
                file = ?other.fields_file,
                "Merging fields"
            );
            self.fields = other.fields;
            self.fields_file = other.fields_file;
        }

        // Limits
        if let Some(limits) = other.limits {
            let current = self.limits.get_or_insert_with(LimitsFileConfig::default);
            if limits.max_body_bytes.is_some() {
                tracing::trace!(
                    max_body_bytes = ?limits.max_body_bytes,
                    "Merging limits.max_body_bytes"
                );
                current.max_body_bytes = limits.max_body_bytes;
            }
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Request limits
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_body_bytes: usize,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fields: FieldMap,
    pub limits: LimitsConfig,
    pub debug: bool,
    /// Config files that contributed, lowest priority first
    pub sources: Vec<String>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.elastic-builder/elastic-builder.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layers(cli, get_profile_config_path())
    }

    fn load_layers(cli: &CliConfig, profile_path: Option<PathBuf>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer configs: defaults -> file config -> CLI/env overrides
        let file_server = file_config.server.unwrap_or_default();
        let file_limits = file_config.limits.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        // fields: CLI/env path, then config file path, then inline map
        let fields = match (&cli.fields, file_config.fields_file, file_config.fields) {
            (Some(path), _, _) => load_fields(&expand_path(&path.to_string_lossy()))?,
            (None, Some(path), _) => load_fields(&expand_path(&path))?,
            (None, None, Some(fields)) => fields,
            (None, None, None) => FieldMap::new(),
        };

        let max_body_bytes = file_limits.max_body_bytes.unwrap_or(DEFAULT_BODY_LIMIT);

        // debug: CLI/env flag takes precedence, then file config, default false
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        let config = Self {
            server: ServerConfig { host, port },
            fields,
            limits: LimitsConfig { max_body_bytes },
            debug,
            sources: found_configs,
        };

        config.validate()?;
        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            fields = config.fields.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        // Host must not be empty
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port must be non-zero (port 0 would cause bind failure)
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.limits.max_body_bytes == 0 {
            anyhow::bail!("Configuration error: limits.max_body_bytes must be greater than 0");
        }

        Ok(())
    }
}

/// Read a FieldMap JSON file
pub fn load_fields(path: &Path) -> Result<FieldMap> {
    tracing::debug!(path = %path.display(), "Loading field map");
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read field map: {}", path.display()))?;
    let fields = FieldMap::from_json_str(&content)
        .with_context(|| format!("Failed to parse field map: {}", path.display()))?;
    tracing::trace!(fields = ?fields.names().collect::<Vec<_>>(), "Parsed field map");
    Ok(fields)
}

/// Get profile config path (~/.elastic-builder/elastic-builder.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastic_builder::FieldKind;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cli_with_config(path: PathBuf) -> CliConfig {
        CliConfig {
            config: Some(path),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080 },
            "fields": { "name": { "type": "term" } },
            "limits": { "max_body_bytes": 2048 },
            "debug": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("0.0.0.0".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(8080));
        assert_eq!(
            config.fields.as_ref().unwrap().get("name").unwrap().kind,
            FieldKind::Term
        );
        assert_eq!(config.limits.as_ref().unwrap().max_body_bytes, Some(2048));
        assert_eq!(config.debug, Some(true));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.fields.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_rejects_unknown_field_kind() {
        let json = r#"{ "fields": { "name": { "type": "geo" } } }"#;
        assert!(serde_json::from_str::<FileConfig>(json).is_err());
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{
                "server": { "host": "base.host", "port": 1000 },
                "fields": { "name": { "type": "term" } },
                "limits": { "max_body_bytes": 10 }
            }"#,
        )
        .unwrap();
        let overlay: FileConfig = serde_json::from_str(
            r#"{ "server": { "port": 2000 }, "fields_file": "fields.json" }"#,
        )
        .unwrap();

        base.merge(overlay);

        let server = base.server.unwrap();
        assert_eq!(server.host, Some("base.host".to_string()));
        assert_eq!(server.port, Some(2000));
        assert!(base.fields.is_none());
        assert_eq!(base.fields_file, Some("fields.json".to_string()));
        assert_eq!(base.limits.unwrap().max_body_bytes, Some(10));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::load_layers(&CliConfig::default(), None).unwrap();

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.limits.max_body_bytes, DEFAULT_BODY_LIMIT);
        assert!(config.fields.is_empty());
        assert!(!config.debug);
    }

    #[test]
    fn test_app_config_layers() {
        let dir = TempDir::new().unwrap();
        let profile = write(
            &dir,
            "profile.json",
            r#"{ "server": { "host": "profile.host", "port": 1111 }, "debug": true }"#,
        );
        let local = write(
            &dir,
            "local.json",
            r#"{ "server": { "port": 2222 }, "fields": { "age": { "type": "number" } } }"#,
        );

        let cli = CliConfig {
            port: Some(3333),
            ..cli_with_config(local)
        };
        let config = AppConfig::load_layers(&cli, Some(profile)).unwrap();

        assert_eq!(config.server.host, "profile.host");
        assert_eq!(config.server.port, 3333);
        assert!(config.debug);
        assert_eq!(config.fields.get("age").unwrap().kind, FieldKind::Number);
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_app_config_fields_file() {
        let dir = TempDir::new().unwrap();
        let fields = write(
            &dir,
            "fields.json",
            r#"{ "tags": { "type": "multi", "choices": ["a", "b"] } }"#,
        );
        let config_path = write(
            &dir,
            "config.json",
            &format!(r#"{{ "fields_file": {:?} }}"#, fields.display().to_string()),
        );

        let config = AppConfig::load_layers(&cli_with_config(config_path), None).unwrap();
        assert_eq!(config.fields.get("tags").unwrap().choices, vec!["a", "b"]);
    }

    #[test]
    fn test_app_config_cli_fields_override() {
        let dir = TempDir::new().unwrap();
        let fields = write(&dir, "cli-fields.json", r#"{ "created": { "type": "date" } }"#);
        let config_path = write(
            &dir,
            "config.json",
            r#"{ "fields": { "name": { "type": "term" } } }"#,
        );

        let cli = CliConfig {
            fields: Some(fields),
            ..cli_with_config(config_path)
        };
        let config = AppConfig::load_layers(&cli, None).unwrap();
        assert!(config.fields.get("name").is_none());
        assert!(config.fields.get("created").is_some());
    }

    #[test]
    fn test_app_config_missing_config_file() {
        let cli = cli_with_config(PathBuf::from("/nonexistent/elastic-builder.json"));
        let err = AppConfig::load_layers(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_app_config_missing_fields_file() {
        let cli = CliConfig {
            fields: Some(PathBuf::from("/nonexistent/fields.json")),
            ..Default::default()
        };
        let err = AppConfig::load_layers(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Failed to read field map"));
    }

    #[test]
    fn test_app_config_validation_server_port_zero() {
        let cli = CliConfig {
            port: Some(0),
            ..Default::default()
        };
        let err = AppConfig::load_layers(&cli, None).unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_app_config_validation_empty_host() {
        let cli = CliConfig {
            host: Some(String::new()),
            ..Default::default()
        };
        let err = AppConfig::load_layers(&cli, None).unwrap_err();
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(is_all_interfaces("[::]"));
        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
    }
}
