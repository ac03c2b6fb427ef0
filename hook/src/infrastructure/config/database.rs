//! Database configuration for the hook.
//!
//! This module defines how to reach the Dolt `sql-server`.

use secrecy::SecretString;
use serde::Deserialize;

use crate::connection::ConnectionOptions;
use crate::domain::DatabaseName;

/// Database connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name.
    pub user: String,
    /// Password, never logged.
    pub password: SecretString,
    /// Target database.
    pub name: DatabaseName,
}

impl DatabaseSettings {
    /// Connection options for these settings.
    #[must_use]
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions::new(self.name.clone())
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_credentials(self.user.clone(), self.password.clone())
    }
}
