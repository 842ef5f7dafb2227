// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::middleware::AuthRequest;
use crate::iam::types::User;
use actix_web::{Error, HttpRequest, error};

/// The reserved default administrator record. Exempt from deletion and
/// from attribute edits through the user-management routes.
pub const DEFAULT_ADMIN_ID: u32 = 1;

/// Authorization predicate: an authenticated caller, any role.
pub fn require_user(req: &HttpRequest) -> Result<User, Error> {
    req.user_info()
        .ok_or_else(|| error::ErrorUnauthorized("Authentication required"))
}

/// Authorization predicate: an authenticated administrator.
pub fn require_admin(req: &HttpRequest) -> Result<User, Error> {
    let user = require_user(req)?;
    if !user.admin {
        return Err(error::ErrorForbidden("Administrator privileges required"));
    }
    Ok(user)
}

/// Business-rule refusals for the delete operation. These are reported
/// as flash-message redirects, never as HTTP errors.
#[derive(Debug, PartialEq, Eq)]
pub enum DeletionRefusal {
    ProtectedAdmin,
    SelfDelete,
}

impl DeletionRefusal {
    pub fn message(&self) -> &'static str {
        match self {
            DeletionRefusal::ProtectedAdmin => {
                "Não é possível excluir o administrador padrão do sistema."
            }
            DeletionRefusal::SelfDelete => {
                "Não é possível excluir o próprio usuário que está logado."
            }
        }
    }
}

pub fn deletion_guard(target_id: u32, caller: &User) -> Result<(), DeletionRefusal> {
    if target_id == DEFAULT_ADMIN_ID {
        return Err(DeletionRefusal::ProtectedAdmin);
    }
    if target_id == caller.id {
        return Err(DeletionRefusal::SelfDelete);
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum EditRefusal {
    ProtectedAdmin,
}

impl EditRefusal {
    pub fn message(&self) -> &'static str {
        match self {
            EditRefusal::ProtectedAdmin => "Não é possível alterar dados do administrador padrão.",
        }
    }
}

pub fn edit_guard(target_id: u32) -> Result<(), EditRefusal> {
    if target_id == DEFAULT_ADMIN_ID {
        return Err(EditRefusal::ProtectedAdmin);
    }
    Ok(())
}
