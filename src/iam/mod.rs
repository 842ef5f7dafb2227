// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod middleware;
pub mod password;
pub mod policy;
pub mod repo;
pub mod store;
pub mod types;

pub use middleware::AuthRequest;
pub use password::{hash_password, verify_password};
pub use repo::UserRepository;
pub use store::{FileUserStore, UserStore};
pub use types::{IamError, User};
