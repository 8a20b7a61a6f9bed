//! Connection arguments and per-engine connection-string normalization.

use crate::error::ConnResult;
use serde::{Deserialize, Serialize};
use sqlweave_core::resolver::Dialect;
use std::collections::BTreeMap;
use std::fmt;

/// What a physical connection will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPurpose {
    #[default]
    Query,
    /// Dedicated long-lived connection for server notifications.
    Notify,
}

/// Keepalive settings applied to notify connections only.
const NOTIFY_OVERRIDES: &[(&str, &str)] = &[
    ("Keepalive", "0"),
    ("Tcp Keepalive", "true"),
    ("Tcp Keepalive Time", "1"),
    ("Tcp Keepalive Interval", "50"),
];

const POSTGRES_KEYS: &[&str] = &[
    "host",
    "port",
    "database",
    "username",
    "password",
    "pooling",
    "minimum pool size",
    "maximum pool size",
    "max auto prepare",
    "enlist",
    "keepalive",
    "tcp keepalive",
    "tcp keepalive time",
    "tcp keepalive interval",
    "timeout",
    "command timeout",
    "ssl mode",
    "trust server certificate",
    "application name",
    "search path",
];

const SQLITE_KEYS: &[&str] = &[
    "data source",
    "mode",
    "cache",
    "password",
    "pooling",
    "foreign keys",
    "default timeout",
    "recursive triggers",
];

const SQL_SERVER_KEYS: &[&str] = &[
    "server",
    "database",
    "user id",
    "password",
    "pooling",
    "min pool size",
    "max pool size",
    "enlist",
    "connect timeout",
    "command timeout",
    "encrypt",
    "trust server certificate",
    "application name",
    "multipleactiveresultsets",
];

/// Pool sizing keys in any engine's vocabulary; always stripped.
const POOL_SIZE_KEYS: &[&str] = &[
    "min pool size",
    "max pool size",
    "minimum pool size",
    "maximum pool size",
];

fn recognized_keys(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Postgres => POSTGRES_KEYS,
        Dialect::Sqlite => SQLITE_KEYS,
        Dialect::SqlServer => SQL_SERVER_KEYS,
    }
}

fn is_recognized(dialect: Dialect, key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    recognized_keys(dialect).contains(&key.as_str())
}

/// Where and how to connect. Immutable once handed to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionArguments {
    pub host: String,
    pub port: Option<u16>,
    /// Database name; the file path for SQLite.
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pooling: bool,
    pub min_pool_size: Option<u32>,
    pub max_pool_size: Option<u32>,
    /// Engine-specific keys, passed through when the engine recognizes them.
    pub extra: BTreeMap<String, String>,
}

impl Default for ConnectionArguments {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: String::new(),
            username: None,
            password: None,
            pooling: true,
            min_pool_size: None,
            max_pool_size: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ConnectionArguments {
    pub fn new(host: &str, database: &str) -> Self {
        Self {
            host: host.to_string(),
            database: database.to_string(),
            ..Default::default()
        }
    }

    /// Parse arguments from a TOML document.
    ///
    /// ```ignore
    /// host = "db.internal"
    /// port = 5432
    /// database = "app"
    /// username = "app"
    ///
    /// [extra]
    /// "Application Name" = "worker"
    /// ```
    pub fn from_toml_str(s: &str) -> ConnResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn pooling(mut self, enabled: bool) -> Self {
        self.pooling = enabled;
        self
    }

    pub fn pool_size(mut self, min: u32, max: u32) -> Self {
        self.min_pool_size = Some(min);
        self.max_pool_size = Some(max);
        self
    }

    /// Add an engine-specific key.
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.extra.insert(key.to_string(), value.to_string());
        self
    }

    /// Build the normalized connection string for `dialect`.
    ///
    /// Pooling, auto-prepare and enlistment are always switched off and pool
    /// sizes stripped: the caller owns exactly one physical connection per
    /// context. Extra keys the engine does not recognize are dropped.
    pub fn connection_string(&self, dialect: Dialect, purpose: ConnectionPurpose) -> ConnectionString {
        let mut cs = ConnectionString::default();

        match dialect {
            Dialect::Postgres => {
                cs.set("Host", &self.host);
                if let Some(port) = self.port {
                    cs.set("Port", &port.to_string());
                }
                cs.set("Database", &self.database);
                if let Some(user) = &self.username {
                    cs.set("Username", user);
                }
            }
            Dialect::Sqlite => cs.set("Data Source", &self.database),
            Dialect::SqlServer => {
                match self.port {
                    Some(port) => cs.set("Server", &format!("{},{}", self.host, port)),
                    None => cs.set("Server", &self.host),
                }
                cs.set("Database", &self.database);
                if let Some(user) = &self.username {
                    cs.set("User Id", user);
                }
            }
        }
        if let Some(password) = &self.password {
            cs.set("Password", password);
        }

        for (key, value) in &self.extra {
            let lower = key.to_ascii_lowercase();
            if POOL_SIZE_KEYS.contains(&lower.as_str()) {
                continue;
            }
            if !is_recognized(dialect, key) {
                tracing::warn!("Dropping connection option '{}' not recognized by {}", key, dialect);
                continue;
            }
            cs.set(key, value);
        }

        cs.set("Pooling", "false");
        if is_recognized(dialect, "Max Auto Prepare") {
            cs.set("Max Auto Prepare", "0");
        }
        if is_recognized(dialect, "Enlist") {
            cs.set("Enlist", "false");
        }

        if purpose == ConnectionPurpose::Notify {
            for (key, value) in NOTIFY_OVERRIDES {
                if is_recognized(dialect, key) {
                    cs.set(key, value);
                }
            }
        }
        cs
    }
}

/// Ordered `key=value` pairs with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    pairs: Vec<(String, String)>,
}

impl ConnectionString {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Set a key, replacing any existing spelling of it in place.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.pairs.iter().position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.pairs.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            if value.contains(';') || value.contains('"') {
                write!(f, "{}=\"{}\"", key, value.replace('"', "\"\""))?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_postgres_normalization() {
        let args = ConnectionArguments::new("db", "app")
            .port(5432)
            .username("svc")
            .pool_size(1, 20)
            .option("Application Name", "worker")
            .option("Maximum Pool Size", "50")
            .option("Frobnicate", "yes");

        let cs = args.connection_string(Dialect::Postgres, ConnectionPurpose::Query);
        assert_eq!(
            cs.to_string(),
            "Host=db;Port=5432;Database=app;Username=svc;Application Name=worker;\
             Pooling=false;Max Auto Prepare=0;Enlist=false"
        );
        assert_eq!(cs.get("frobnicate"), None);
        assert_eq!(cs.get("maximum pool size"), None);
    }

    #[test]
    fn test_extra_cannot_turn_pooling_back_on() {
        let args = ConnectionArguments::new("db", "app").option("pooling", "true");
        let cs = args.connection_string(Dialect::Postgres, ConnectionPurpose::Query);
        assert_eq!(cs.get("Pooling"), Some("false"));
    }

    #[test]
    fn test_notify_overrides() {
        let args = ConnectionArguments::new("db", "app").option("Keepalive", "30");
        let cs = args.connection_string(Dialect::Postgres, ConnectionPurpose::Notify);
        assert_eq!(cs.get("Keepalive"), Some("0"));
        assert_eq!(cs.get("Tcp Keepalive"), Some("true"));
        assert_eq!(cs.get("Tcp Keepalive Time"), Some("1"));
        assert_eq!(cs.get("Tcp Keepalive Interval"), Some("50"));

        let cs = args.connection_string(Dialect::Postgres, ConnectionPurpose::Query);
        assert_eq!(cs.get("Keepalive"), Some("30"));
        assert_eq!(cs.get("Tcp Keepalive"), None);
    }

    #[test]
    fn test_sql_server_and_sqlite_keys() {
        let args = ConnectionArguments::new("sql01", "app")
            .port(1433)
            .username("sa")
            .password("p;w");
        let cs = args.connection_string(Dialect::SqlServer, ConnectionPurpose::Query);
        assert_eq!(
            cs.to_string(),
            "Server=sql01,1433;Database=app;User Id=sa;Password=\"p;w\";Pooling=false;Enlist=false"
        );

        let args = ConnectionArguments::new("", "/tmp/app.db").option("Foreign Keys", "True");
        let cs = args.connection_string(Dialect::Sqlite, ConnectionPurpose::Notify);
        assert_eq!(
            cs.to_string(),
            "Data Source=/tmp/app.db;Foreign Keys=True;Pooling=false"
        );
    }

    #[test]
    fn test_from_toml() {
        let args = ConnectionArguments::from_toml_str(
            r#"
            host = "db.internal"
            port = 5433
            database = "app"
            username = "svc"

            [extra]
            "Search Path" = "tenant_a"
            "#,
        )
        .unwrap();
        assert_eq!(args.host, "db.internal");
        assert_eq!(args.port, Some(5433));
        assert!(args.pooling);
        assert_eq!(args.extra.get("Search Path").map(String::as_str), Some("tenant_a"));

        assert!(ConnectionArguments::from_toml_str("port = \"x\"").is_err());
    }
}
