//! Layered configuration for canopy.
//!
//! Values are resolved in order, later sources overriding earlier ones:
//!
//! 1. Built-in defaults (paths under the platform's data directory),
//! 2. An optional configuration file (`.toml`, `.yaml`/`.yml` or `.json`),
//! 3. Environment variables prefixed with `CANOPY_`; nested keys are
//!    separated by a double underscore (`CANOPY_CONTENT__ROOT`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of checksums bound per statement.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
const ENV_PREFIX: &str = "CANOPY_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory containing `storage/`. Must be absolute.
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite catalog database.
    pub database: PathBuf,
    pub content: ContentConfig,
    /// Number of checksums bound per statement when updating local files.
    pub batch_size: usize,
}

impl Config {
    /// Defaults rooted at the platform's data directory for canopy.
    pub fn defaults() -> Result<Self> {
        let dirs = ProjectDirs::from("org", "canopy", "canopy").ok_or_raise(|| ErrorKind::NoHome)?;
        let data = dirs.data_dir();
        Ok(Self {
            database: data.join("catalog.sqlite3"),
            content: ContentConfig { root: data.join("content") },
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Assemble every configuration source, without extracting it.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::defaults()?));
        if let Some(file) = file {
            if !file.is_file() {
                tracing::error!(path = %file.display(), "Configuration file does not exist");
                exn::bail!(ErrorKind::Load);
            }
            let extension = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
            figment = match extension {
                "toml" => figment.merge(Toml::file(file)),
                "yaml" | "yml" => figment.merge(Yaml::file(file)),
                "json" => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::Invalid("configuration file extension")),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(file)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(
            database = %config.database.display(),
            content_root = %config.content.root.display(),
            batch_size = config.batch_size,
            "Loaded configuration",
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid("batch_size must be greater than zero"));
        }
        if !self.content.root.is_absolute() {
            exn::bail!(ErrorKind::Invalid("content.root must be an absolute path"));
        }
        if self.database.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database path is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn load_in(jail: &Jail, file: Option<&str>) -> Result<Config> {
        let file = file.map(|name| jail.directory().join(name));
        Config::load(file.as_deref())
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            let config = load_in(jail, None).unwrap();
            assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
            assert!(config.content.root.is_absolute());
            assert!(config.database.ends_with("catalog.sqlite3"));
            Ok(())
        });
    }

    #[rstest]
    #[case("canopy.toml", "batch_size = 500\n[content]\nroot = \"/srv/content\"\n")]
    #[case("canopy.yaml", "batch_size: 500\ncontent:\n  root: /srv/content\n")]
    #[case("canopy.yml", "batch_size: 500\ncontent:\n  root: /srv/content\n")]
    #[case("canopy.json", r#"{"batch_size": 500, "content": {"root": "/srv/content"}}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let config = load_in(jail, Some(name)).unwrap();
            assert_eq!(config.batch_size, 500);
            assert_eq!(config.content.root, PathBuf::from("/srv/content"));
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("canopy.toml", "batch_size = 500\ndatabase = \"/tmp/file.sqlite3\"\n")?;
            jail.set_env("CANOPY_BATCH_SIZE", "25");
            jail.set_env("CANOPY_CONTENT__ROOT", "/mnt/usb/content");
            let config = load_in(jail, Some("canopy.toml")).unwrap();
            assert_eq!(config.batch_size, 25);
            assert_eq!(config.content.root, PathBuf::from("/mnt/usb/content"));
            assert_eq!(config.database, PathBuf::from("/tmp/file.sqlite3"));
            Ok(())
        });
    }

    #[test]
    fn test_zero_batch_size_is_invalid() {
        Jail::expect_with(|jail| {
            jail.set_env("CANOPY_BATCH_SIZE", "0");
            let err = load_in(jail, None).unwrap_err();
            assert_eq!(*err, ErrorKind::Invalid("batch_size must be greater than zero"));
            Ok(())
        });
    }

    #[test]
    fn test_relative_content_root_is_invalid() {
        Jail::expect_with(|jail| {
            jail.set_env("CANOPY_CONTENT__ROOT", "content");
            let err = load_in(jail, None).unwrap_err();
            assert_eq!(*err, ErrorKind::Invalid("content.root must be an absolute path"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_or_unknown_file() {
        Jail::expect_with(|jail| {
            assert_eq!(*load_in(jail, Some("missing.toml")).unwrap_err(), ErrorKind::Load);
            jail.create_file("canopy.ini", "batch_size = 1")?;
            assert_eq!(
                *load_in(jail, Some("canopy.ini")).unwrap_err(),
                ErrorKind::Invalid("configuration file extension")
            );
            Ok(())
        });
    }

    #[test]
    fn test_malformed_value() {
        Jail::expect_with(|jail| {
            jail.set_env("CANOPY_BATCH_SIZE", "many");
            assert_eq!(*load_in(jail, None).unwrap_err(), ErrorKind::Load);
            Ok(())
        });
    }
}
