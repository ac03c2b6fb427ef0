//! Connection configuration.

use secrecy::{ExposeSecret, SecretString};
use sqlx::mysql::MySqlConnectOptions;

use crate::domain::DatabaseName;

/// Default MySQL-protocol port of a Dolt `sql-server`.
pub const DEFAULT_PORT: u16 = 3306;

/// Where and as whom to connect. Immutable once built.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    host: String,
    port: u16,
    user: String,
    password: SecretString,
    database: DatabaseName,
}

impl ConnectionOptions {
    /// Options for `database` on `localhost:3306` as `root` with an empty password.
    #[must_use]
    pub fn new(database: DatabaseName) -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            user: "root".to_string(),
            password: SecretString::from(String::new()),
            database,
        }
    }

    /// Sets the server host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the user and password.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: SecretString) -> Self {
        self.user = user.into();
        self.password = password;
        self
    }

    /// Same server and credentials, another database.
    #[must_use]
    pub fn with_database(mut self, database: DatabaseName) -> Self {
        self.database = database;
        self
    }

    /// Server host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// User name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Target database.
    #[must_use]
    pub fn database(&self) -> &DatabaseName {
        &self.database
    }

    /// `host:port/database`, safe to log.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Driver options for a single connection.
    #[must_use]
    pub fn to_mysql(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(self.database.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConnectionOptions {
        ConnectionOptions::new(DatabaseName::new("foo").expect("valid name"))
    }

    #[test]
    fn test_defaults() {
        let opts = options();
        assert_eq!(opts.host(), "localhost");
        assert_eq!(opts.port(), 3306);
        assert_eq!(opts.user(), "root");
        assert_eq!(opts.target(), "localhost:3306/foo");
    }

    #[test]
    fn test_debug_redacts_password() {
        let opts = options().with_credentials("etl", SecretString::from("hunter2".to_string()));
        let rendered = format!("{opts:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("etl"));
    }

    #[test]
    fn test_builder_overrides() {
        let opts = options().with_host("dolt.internal").with_port(13306);
        assert_eq!(opts.target(), "dolt.internal:13306/foo");

        let other = opts.with_database(DatabaseName::new("bar").expect("valid name"));
        assert_eq!(other.target(), "dolt.internal:13306/bar");
    }
}
