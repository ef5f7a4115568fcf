mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./chardb.toml",
        "./config.toml",
        "~/.config/chardb/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_paths(config: &mut Config) {
    config.database.path = shellexpand::tilde(&config.database.path).into_owned();
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.database.path.trim().is_empty() {
        anyhow::bail!("Database path cannot be empty");
    }

    if config.database.diagnostics.max_connections == 0 {
        anyhow::bail!("Database max_connections cannot be 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, "chardb.db");
        assert!(!config.database.diagnostics.log_statements);
        assert_eq!(config.database.diagnostics.max_connections, 4);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chardb.toml");
        fs::write(
            &path,
            r#"
[database]
path = "/srv/game/characters.db"

[database.diagnostics]
log_statements = true
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.path, "/srv/game/characters.db");
        assert!(config.database.diagnostics.log_statements);
        assert_eq!(config.database.diagnostics.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chardb.toml");
        fs::write(&path, "").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.path, "chardb.db");
    }

    #[test]
    fn test_tilde_expanded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chardb.toml");
        fs::write(&path, "[database]\npath = \"~/chardb.db\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.database.path.starts_with('~'));
        assert!(config.database.path.ends_with("chardb.db"));
    }

    #[test]
    fn test_rejects_empty_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chardb.toml");
        fs::write(&path, "[database]\npath = \"\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_rejects_zero_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chardb.toml");
        fs::write(&path, "[database.diagnostics]\nmax_connections = 0\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chardb.toml");
        fs::write(&path, "[database\npath = 1").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let result = load_config_or_default(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }
}
