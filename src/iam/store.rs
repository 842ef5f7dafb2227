// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{IamError, UsersData, YamlUser, YamlUsersData};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(test)]
use std::sync::{Arc, RwLock};

pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<UsersData, IamError>;
    fn save(&self, users: &UsersData) -> Result<(), IamError>;
}

pub struct FileUserStore {
    users_file: PathBuf,
}

impl FileUserStore {
    pub fn new(users_file: PathBuf) -> Result<Self, IamError> {
        if users_file.as_os_str().is_empty() {
            return Err(IamError::ConfigurationError(
                "Users file path is empty".to_string(),
            ));
        }

        Ok(Self { users_file })
    }

    pub fn exists(&self) -> bool {
        self.users_file.is_file()
    }

    fn parse_users(content: &str) -> Result<UsersData, IamError> {
        let yaml_users: YamlUsersData = serde_yaml::from_str(content)
            .map_err(|e| IamError::ParseError(format!("Failed to parse users file: {}", e)))?;

        let mut users_data = UsersData::new();
        for (id, yaml_user) in yaml_users {
            users_data.insert(id, yaml_user.into_user(id));
        }

        Ok(users_data)
    }

    fn serialize_users(users_data: &UsersData) -> Result<String, IamError> {
        let yaml_users: YamlUsersData = users_data
            .iter()
            .map(|(id, user)| (*id, YamlUser::from_user(user)))
            .collect();

        serde_yaml::to_string(&yaml_users)
            .map_err(|e| IamError::ParseError(format!("Failed to serialize users: {}", e)))
    }

    fn read_users_file(&self) -> Result<String, IamError> {
        std::fs::read_to_string(&self.users_file)
            .map_err(|e| IamError::FileError(format!("Failed to read users file: {}", e)))
    }

    fn write_users_file(&self, content: &str) -> Result<(), IamError> {
        let parent = self.users_file.parent().ok_or_else(|| {
            IamError::FileError("Users file path has no parent directory".to_string())
        })?;
        let file_name = self
            .users_file
            .file_name()
            .ok_or_else(|| IamError::FileError("Users file path has no file name".to_string()))?;
        let (mut file, temp_path) = create_temp_file(parent, file_name)?;

        if let Ok(metadata) = std::fs::metadata(&self.users_file) {
            #[cfg(unix)]
            {
                if let Err(err) = std::fs::set_permissions(&temp_path, metadata.permissions()) {
                    let _ = std::fs::remove_file(&temp_path);
                    return Err(IamError::FileError(format!(
                        "Failed to set temp users file permissions: {}",
                        err
                    )));
                }
            }
        }

        if let Err(err) = file.write_all(content.as_bytes()) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(IamError::FileError(format!(
                "Failed to write users temp file: {}",
                err
            )));
        }
        if let Err(err) = file.sync_all() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(IamError::FileError(format!(
                "Failed to sync users temp file: {}",
                err
            )));
        }

        if let Err(err) = std::fs::rename(&temp_path, &self.users_file) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(IamError::FileError(format!(
                "Failed to replace users file: {}",
                err
            )));
        }

        #[cfg(unix)]
        {
            if let Err(err) = sync_parent_dir(parent) {
                log::warn!("Users directory sync failed: {}", err);
            }
        }

        Ok(())
    }
}

fn create_temp_file(
    dir: &Path,
    file_name: &std::ffi::OsStr,
) -> Result<(std::fs::File, PathBuf), IamError> {
    use std::fs::OpenOptions;
    const MAX_ATTEMPTS: u32 = 100;
    let base = file_name.to_string_lossy();
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = dir.join(format!(".{}.tmp.{}.{}", base, std::process::id(), attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(IamError::FileError(format!(
                    "Failed to create temp users file: {}",
                    err
                )));
            }
        }
    }
    Err(IamError::FileError(
        "Failed to create temp users file after repeated attempts".to_string(),
    ))
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> Result<(), IamError> {
    let dir = std::fs::File::open(parent).map_err(|err| {
        IamError::FileError(format!("Failed to open users directory for sync: {}", err))
    })?;
    dir.sync_all()
        .map_err(|err| IamError::FileError(format!("Failed to sync users directory: {}", err)))
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        let content = self.read_users_file()?;
        Self::parse_users(&content)
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        let content = Self::serialize_users(users)?;
        self.write_users_file(&content)
    }
}

#[cfg(test)]
pub struct MemoryUserStore {
    users: Arc<RwLock<UsersData>>,
}

#[cfg(test)]
impl MemoryUserStore {
    pub fn new(initial: UsersData) -> Self {
        Self {
            users: Arc::new(RwLock::new(initial)),
        }
    }
}

#[cfg(test)]
impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        match self.users.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => {
                log::error!("MemoryUserStore lock poisoned on read; recovering");
                Ok(poisoned.into_inner().clone())
            }
        }
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        match self.users.write() {
            Ok(mut guard) => {
                *guard = users.clone();
                Ok(())
            }
            Err(poisoned) => {
                log::error!("MemoryUserStore lock poisoned on write; recovering");
                let mut guard = poisoned.into_inner();
                *guard = users.clone();
                Ok(())
            }
        }
    }
}
