// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::BootstrapAdminConfig;
use crate::iam::password::PasswordError;
use crate::iam::policy::DEFAULT_ADMIN_ID;
use crate::iam::types::{IamError, User, UsersData};
use crate::iam::{FileUserStore, UserStore, hash_password};

#[derive(Debug)]
pub enum BootstrapError {
    Password(PasswordError),
    Store(IamError),
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapError::Password(err) => write!(f, "Bootstrap password error: {}", err),
            BootstrapError::Store(err) => write!(f, "Bootstrap store error: {}", err),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<PasswordError> for BootstrapError {
    fn from(err: PasswordError) -> Self {
        BootstrapError::Password(err)
    }
}

impl From<IamError> for BootstrapError {
    fn from(err: IamError) -> Self {
        BootstrapError::Store(err)
    }
}

/// Seed the users file with the default administrator (id 1) when it
/// does not exist yet. Returns true when the file was created.
pub fn ensure_default_admin(
    store: &FileUserStore,
    admin: &BootstrapAdminConfig,
) -> Result<bool, BootstrapError> {
    if store.exists() {
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password)?;
    let user = User {
        id: DEFAULT_ADMIN_ID,
        name: admin.name.clone(),
        email: admin.email.clone(),
        password_hash: Some(password_hash),
        admin: true,
    };

    let mut users = UsersData::new();
    users.insert(DEFAULT_ADMIN_ID, user);
    store.save(&users)?;

    log::info!("Created users file with default administrator {}", admin.email);
    log::warn!(
        "{} uses the configured bootstrap password (change it immediately)",
        admin.email
    );

    Ok(true)
}
