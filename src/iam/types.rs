// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A user record. The password hash is opaque and never rendered.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub admin: bool,
}

// Structure matching the YAML file format
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YamlUser {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

impl YamlUser {
    pub fn into_user(self, id: u32) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password,
            admin: self.admin,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            admin: user.admin,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IamError {
    UserNotFound(u32),
    EmailInUse(String),
    ServiceNotInitialized,
    ConfigurationError(String),
    FileError(String),
    ParseError(String),
}

impl std::fmt::Display for IamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IamError::UserNotFound(id) => write!(f, "User not found: {}", id),
            IamError::EmailInUse(email) => write!(f, "Email already registered: {}", email),
            IamError::ServiceNotInitialized => write!(f, "User repository not initialized"),
            IamError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            IamError::FileError(msg) => write!(f, "File error: {}", msg),
            IamError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for IamError {}

// Mutation commands for the background task
#[derive(Debug)]
pub enum UserMutation {
    Insert {
        name: String,
        email: String,
        password_hash: String,
        admin: bool,
    },
    UpdateAttributes {
        id: u32,
        name: String,
        email: String,
        admin: bool,
    },
    UpdatePassword {
        id: u32,
        password_hash: String,
    },
    Delete {
        id: u32,
    },
}

#[derive(Debug)]
pub enum UserMutationResult {
    Inserted(User),
    Updated,
    PasswordChanged,
    Deleted,
}

// The users.yaml file structure: id -> yaml user data. BTreeMap keeps
// the serialized file in id order across rewrites.
pub type YamlUsersData = BTreeMap<u32, YamlUser>;
pub type UsersData = HashMap<u32, User>;
