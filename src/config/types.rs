use chardb_db::pool::DiagnosticsConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file path or URI; `~` is expanded
    #[serde(default = "default_database_path")]
    pub path: String,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

fn default_database_path() -> String {
    "chardb.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}
