// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl_seconds(),
            cookie_name: default_session_cookie_name(),
        }
    }
}

fn default_session_ttl_seconds() -> u64 {
    28800 // 8 hours
}

fn default_session_cookie_name() -> String {
    "cadastro_sessao".to_string()
}

/// Credentials used to seed the default administrator (id 1) when the
/// users file does not exist yet.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BootstrapAdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            name: default_admin_name(),
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

fn default_admin_name() -> String {
    "Administrador".to_string()
}

fn default_admin_email() -> String {
    "admin@cadastro.local".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub bootstrap_admin: BootstrapAdminConfig,
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sessions: SessionConfig::default(),
            bootstrap_admin: BootstrapAdminConfig::default(),
            users_file: default_users_file(),
        }
    }
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.yaml")
}

impl Config {
    /// Load configuration from an optional YAML file; missing sections
    /// fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|err| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), err))
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|err| {
            ConfigError::LoadError(format!("Failed to parse {}: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sessions.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "sessions.ttl_seconds must be greater than zero".to_string(),
            ));
        }
        if self.sessions.cookie_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "sessions.cookie_name must not be empty".to_string(),
            ));
        }
        if self.users_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "users_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = Config::load(None).expect("config");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sessions.cookie_name, "cadastro_sessao");
        assert_eq!(config.users_file, PathBuf::from("users.yaml"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "server:\n  port: 9000\n").expect("write config");

        let config = Config::load(Some(&path)).expect("config");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.sessions.ttl_seconds, 28800);
    }

    #[test]
    fn zero_session_ttl_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "sessions:\n  ttl_seconds: 0\n").expect("write config");

        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn unreadable_file_is_a_load_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.yaml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
