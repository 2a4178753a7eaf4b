//! Application configuration.
//!
//! Read from a TOML file; every key is optional and falls back to the
//! compiled default, including keys missing from a partial `[database]`
//! section. Decimal values are written as strings. Command-line flags are applied on top with
//! [`AppConfig::apply_overrides`].
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "pockets.db"
//!
//! [preferences]
//! path = "pockets-preferences.toml"
//!
//! [logging]
//! level = "info"
//! file = "pockets.log"
//!
//! [tax]
//! slab_file = "slabs.csv"
//! cess_rate = "0.04"
//! ```

use std::path::{Path, PathBuf};

use pockets_core::{Regime, TaxRegimeTable};
use pockets_core::db::DbConfig;
use pockets_data::SlabTableLoader;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::utils::parse_decimal;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pockets.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(deserialize_with = "database_section")]
    pub database: DbConfig,
    pub preferences: PreferencesConfig,
    pub logging: LoggingConfig,
    pub tax: TaxConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DbConfig {
                backend: "sqlite".to_string(),
                connection_string: "pockets.db".to_string(),
            },
            preferences: PreferencesConfig::default(),
            logging: LoggingConfig::default(),
            tax: TaxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pockets-preferences.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A bare level or any `EnvFilter` directive.
    pub level: String,
    /// Append log records to this file as well.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// CSV slab table replacing the built-in one.
    pub slab_file: Option<PathBuf>,
    #[serde(deserialize_with = "decimal_from_str")]
    pub cess_rate: Decimal,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            slab_file: None,
            cess_rate: TaxRegimeTable::builtin().cess_rate(),
        }
    }
}

/// Fills keys missing from `[database]` with the application defaults
/// rather than [`DbConfig::default`].
fn database_section<'de, D>(deserializer: D) -> Result<DbConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Section {
        backend: Option<String>,
        connection_string: Option<String>,
    }

    let section = Section::deserialize(deserializer)?;
    let defaults = AppConfig::default().database;
    Ok(DbConfig {
        backend: section.backend.unwrap_or(defaults.backend),
        connection_string: section
            .connection_string
            .unwrap_or(defaults.connection_string),
    })
}

fn decimal_from_str<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_decimal(&raw).map_err(serde::de::Error::custom)
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<String>,
    pub db: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, AppError> {
        toml::from_str(toml_str).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if present, or the defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| AppError::io(&path, e))?;
        let config = Self::from_toml(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        overrides: &CliOverrides,
    ) {
        if let Some(backend) = &overrides.backend {
            self.database.backend = backend.clone();
        }
        if let Some(db) = &overrides.db {
            self.database.connection_string = db.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// The configured slab table: loaded from `tax.slab_file` when set,
    /// otherwise the built-in table with `tax.cess_rate`.
    pub fn slab_table(&self) -> Result<TaxRegimeTable, AppError> {
        match &self.tax.slab_file {
            Some(path) => Ok(SlabTableLoader::load_from_file(path, self.tax.cess_rate)?),
            None => {
                let builtin = TaxRegimeTable::builtin();
                let table = TaxRegimeTable::new(
                    builtin.slabs(Regime::Old).to_vec(),
                    builtin.slabs(Regime::New).to_vec(),
                    self.tax.cess_rate,
                )
                .map_err(|e| AppError::Config(e.to_string()))?;
                Ok(table)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AppConfig::from_toml("").expect("empty config is valid");

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database.connection_string, "pockets.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tax.cess_rate, dec!(0.04));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            connection_string = ":memory:"

            [logging]
            file = "pockets.log"
            "#,
        )
        .expect("should parse");

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, Some(PathBuf::from("pockets.log")));
        assert_eq!(
            config.preferences.path,
            PathBuf::from("pockets-preferences.toml")
        );
    }

    #[test]
    fn backend_only_database_section_uses_file() {
        let config = AppConfig::from_toml("[database]\nbackend = \"sqlite\"\n")
            .expect("should parse");

        assert_eq!(config.database, AppConfig::default().database);
        assert_eq!(config.database.connection_string, "pockets.db");
    }

    #[test]
    fn cess_rate_is_read_exactly() {
        let config = AppConfig::from_toml("[tax]\ncess_rate = \"0.0400\"\n").expect("should parse");

        assert_eq!(config.tax.cess_rate.to_string(), "0.0400");
    }

    #[test]
    fn float_cess_rate_is_rejected() {
        let err = AppConfig::from_toml("[tax]\ncess_rate = 0.04\n").expect_err("should fail");

        assert!(matches!(err, AppError::Config(_)), "{err:?}");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("[database\nbackend = 1").expect_err("should fail");

        assert!(matches!(err, AppError::Config(_)), "{err:?}");
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let mut config = AppConfig::default();

        config.apply_overrides(&CliOverrides {
            db: Some(":memory:".to_string()),
            ..Default::default()
        });

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_explicit_missing_file_fails() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/pockets.toml")))
            .expect_err("missing explicit file should fail");

        assert!(matches!(err, AppError::Io { .. }), "{err:?}");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pockets.toml");
        std::fs::write(&path, "[tax]\ncess_rate = \"0.05\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).expect("should load");

        assert_eq!(config.tax.cess_rate, dec!(0.05));
    }

    #[test]
    fn slab_table_uses_configured_cess() {
        let config = AppConfig {
            tax: TaxConfig {
                slab_file: None,
                cess_rate: dec!(0),
            },
            ..Default::default()
        };

        let table = config.slab_table().expect("builtin slabs are valid");

        assert_eq!(table.cess_rate(), dec!(0));
        assert_eq!(
            table.slabs(Regime::New),
            TaxRegimeTable::builtin().slabs(Regime::New)
        );
    }

    #[test]
    fn slab_table_rejects_bad_cess() {
        let mut config = AppConfig::default();
        config.tax.cess_rate = dec!(1.5);

        assert!(matches!(config.slab_table(), Err(AppError::Config(_))));
    }
}
