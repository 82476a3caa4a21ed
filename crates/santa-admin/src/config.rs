//! Configuration for the operator CLI.
//!
//! All configuration is loaded from environment variables. Database
//! settings are only required when the `PostgreSQL` backend is selected.

use std::str::FromStr;

use santa_db::postgres::DEFAULT_MAX_CONNECTIONS;
use santa_db::{DEFAULT_CSV_DELIMITER, PostgresConfig, StorageKind};
use santa_game::GameLimits;
use santa_game::limits::{DEFAULT_DESCRIPTION_LIMIT, DEFAULT_TITLE_LIMIT};

/// Variables describing the database when `DATABASE_URL` is unset.
const POSTGRES_PARTS: [&str; 5] = [
    "POSTGRES_USER",
    "POSTGRES_PASSWORD",
    "POSTGRES_HOST",
    "POSTGRES_PORT",
    "POSTGRES_DB",
];

/// Errors raised while reading the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Complete CLI configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Selected repository backend.
    pub storage: StorageKind,
    /// `PostgreSQL` settings, if a database is configured.
    pub database: Option<PostgresConfig>,
    /// Field delimiter of the CSV export.
    pub csv_delimiter: u8,
    /// Title and description length limits.
    pub limits: GameLimits,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SANTA_STORAGE` -- `postgres` (default) or `memory`
    /// - `DATABASE_URL` -- connection string; otherwise taken from
    ///   `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_HOST`,
    ///   `POSTGRES_PORT` and `POSTGRES_DB`
    /// - `DB_MAX_CONNECTIONS` -- pool size (default 10)
    /// - `CSV_SPLITTER` -- single ASCII export delimiter (default `;`)
    /// - `LIMIT_TITLE_GAME` -- title length in characters (default 40)
    /// - `LIMIT_DESCRIPTION_GAME` -- description length in characters (default 100)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let storage = match var("SANTA_STORAGE") {
            Some(value) => value.parse().map_err(|e: santa_db::DbError| ConfigError::Invalid {
                name: "SANTA_STORAGE",
                reason: e.to_string(),
            })?,
            None => StorageKind::default(),
        };

        let database = match var("DATABASE_URL") {
            Some(url) => Some(PostgresConfig::from_url(&url).map_err(|e| {
                ConfigError::Invalid {
                    name: "DATABASE_URL",
                    reason: e.to_string(),
                }
            })?),
            None => match postgres_parts(&var) {
                Ok(config) => Some(config),
                Err(missing) if storage == StorageKind::Postgres => return Err(missing),
                Err(_) => None,
            },
        };
        let max_connections = parse_or(&var, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let database = database.map(|config| config.with_max_connections(max_connections));

        let csv_delimiter = match var("CSV_SPLITTER") {
            Some(value) => delimiter(&value)?,
            None => DEFAULT_CSV_DELIMITER,
        };

        let limits = GameLimits {
            title: parse_or(&var, "LIMIT_TITLE_GAME", DEFAULT_TITLE_LIMIT)?,
            description: parse_or(&var, "LIMIT_DESCRIPTION_GAME", DEFAULT_DESCRIPTION_LIMIT)?,
        };

        Ok(Self {
            storage,
            database,
            csv_delimiter,
            limits,
        })
    }
}

fn postgres_parts(var: &impl Fn(&str) -> Option<String>) -> Result<PostgresConfig, ConfigError> {
    let mut parts = Vec::with_capacity(POSTGRES_PARTS.len());
    for name in POSTGRES_PARTS {
        parts.push(var(name).ok_or(ConfigError::Missing(name))?);
    }
    let [user, password, host, _, db] = parts.as_slice() else {
        return Err(ConfigError::Missing("DATABASE_URL"));
    };
    let port = parse_or(var, "POSTGRES_PORT", 0_u16)?;
    Ok(PostgresConfig::from_parts(user, password, host, port, db))
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    var(name).map_or(Ok(default), |value| {
        value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })
}

fn delimiter(value: &str) -> Result<u8, ConfigError> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::Invalid {
            name: "CSV_SPLITTER",
            reason: format!("expected a single ASCII character, got {value:?}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AdminConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AdminConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_database_url() {
        let config = load(&[("DATABASE_URL", "postgresql://u:p@db:5432/santa")]).unwrap();
        assert_eq!(config.storage, StorageKind::Postgres);
        let database = config.database.unwrap();
        assert_eq!(database.options().get_host(), "db");
        assert_eq!(database.options().get_database(), Some("santa"));
        assert_eq!(database.max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.csv_delimiter, b';');
        assert_eq!(config.limits, GameLimits::default());
    }

    #[test]
    fn database_is_built_from_parts() {
        let config = load(&[
            ("POSTGRES_USER", "santa"),
            ("POSTGRES_PASSWORD", "p@ss/w:rd"),
            ("POSTGRES_HOST", "localhost"),
            ("POSTGRES_PORT", "5433"),
            ("POSTGRES_DB", "games"),
        ])
        .unwrap();
        let database = config.database.unwrap();
        assert_eq!(database.options().get_username(), "santa");
        assert_eq!(database.options().get_host(), "localhost");
        assert_eq!(database.options().get_port(), 5433);
        assert_eq!(database.options().get_database(), Some("games"));
    }

    #[test]
    fn bad_database_settings_are_rejected() {
        assert!(matches!(
            load(&[("DATABASE_URL", "not a url")]),
            Err(ConfigError::Invalid { name: "DATABASE_URL", .. })
        ));
        assert!(matches!(
            load(&[
                ("POSTGRES_USER", "santa"),
                ("POSTGRES_PASSWORD", "secret"),
                ("POSTGRES_HOST", "localhost"),
                ("POSTGRES_PORT", "fifty"),
                ("POSTGRES_DB", "games"),
            ]),
            Err(ConfigError::Invalid { name: "POSTGRES_PORT", .. })
        ));
    }

    #[test]
    fn postgres_without_url_names_first_missing_part() {
        let config = load(&[("POSTGRES_USER", "santa")]);
        assert_eq!(
            config.err(),
            Some(ConfigError::Missing("POSTGRES_PASSWORD"))
        );
    }

    #[test]
    fn memory_storage_needs_no_database() {
        let config = load(&[("SANTA_STORAGE", "memory")]).unwrap();
        assert_eq!(config.storage, StorageKind::Memory);
        assert!(config.database.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://u:p@db:5432/santa"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("CSV_SPLITTER", ","),
            ("LIMIT_TITLE_GAME", "10"),
            ("LIMIT_DESCRIPTION_GAME", " 20 "),
        ])
        .unwrap();
        assert_eq!(config.database.map(|db| db.max_connections()), Some(3));
        assert_eq!(config.csv_delimiter, b',');
        assert_eq!(
            config.limits,
            GameLimits {
                title: 10,
                description: 20
            }
        );
    }

    #[test]
    fn bad_values_are_rejected() {
        let memory = ("SANTA_STORAGE", "memory");
        assert!(matches!(
            load(&[memory, ("CSV_SPLITTER", ";;")]),
            Err(ConfigError::Invalid { name: "CSV_SPLITTER", .. })
        ));
        assert!(matches!(
            load(&[memory, ("CSV_SPLITTER", "§")]),
            Err(ConfigError::Invalid { name: "CSV_SPLITTER", .. })
        ));
        assert!(matches!(
            load(&[memory, ("LIMIT_TITLE_GAME", "forty")]),
            Err(ConfigError::Invalid { name: "LIMIT_TITLE_GAME", .. })
        ));
        assert!(matches!(
            load(&[("SANTA_STORAGE", "redis")]),
            Err(ConfigError::Invalid { name: "SANTA_STORAGE", .. })
        ));
    }

    #[test]
    fn tab_is_a_valid_delimiter() {
        let config = load(&[("SANTA_STORAGE", "memory"), ("CSV_SPLITTER", "\t")]).unwrap();
        assert_eq!(config.csv_delimiter, b'\t');
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = load(&[("SANTA_STORAGE", "memory"), ("CSV_SPLITTER", "")]);
        assert_eq!(config.ok().map(|c| c.csv_delimiter), Some(b';'));
    }
}
