// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::store::UserStore;
use super::types::{IamError, User, UserMutation, UserMutationResult, UsersData};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, oneshot};

// Type aliases for complex channel types
type MutationRequest = (
    UserMutation,
    oneshot::Sender<Result<UserMutationResult, IamError>>,
);
type MutationSender = mpsc::UnboundedSender<MutationRequest>;
type MutationReceiver = mpsc::UnboundedReceiver<MutationRequest>;

/// Repository over the persisted user records. Reads come from an
/// in-memory snapshot; mutations are serialized through a background
/// task and only committed to the snapshot after the store save
/// succeeds.
#[derive(Clone)]
pub struct UserRepository {
    users_data: Arc<RwLock<UsersData>>,
    mutation_sender: MutationSender,
    store: Arc<dyn UserStore>,
}

impl UserRepository {
    /// Load users from the store and start the background mutation task.
    pub fn new(store: Arc<dyn UserStore>) -> Result<Self, IamError> {
        let users = store.load()?;
        let users_data = Arc::new(RwLock::new(users));

        let (mutation_sender, mut mutation_receiver): (MutationSender, MutationReceiver) =
            mpsc::unbounded_channel();

        let users_data_clone = users_data.clone();
        let store_clone = store.clone();

        tokio::spawn(async move {
            while let Some((mutation, response_sender)) = mutation_receiver.recv().await {
                let result = Self::handle_mutation(&mutation, &users_data_clone, &store_clone);
                let _ = response_sender.send(result);
            }
        });

        Ok(UserRepository {
            users_data,
            mutation_sender,
            store,
        })
    }

    fn reload_users_from_store(
        users_data: &Arc<RwLock<UsersData>>,
        store: &Arc<dyn UserStore>,
    ) -> Result<(), IamError> {
        let users = store.load()?;
        match users_data.write() {
            Ok(mut guard) => {
                *guard = users;
                users_data.clear_poison();
                Ok(())
            }
            Err(poisoned) => {
                log::error!("Users lock poisoned during reload; recovering");
                let mut guard = poisoned.into_inner();
                *guard = users;
                users_data.clear_poison();
                Ok(())
            }
        }
    }

    fn with_users_read<T>(
        &self,
        f: impl FnOnce(&UsersData) -> Result<T, IamError>,
    ) -> Result<T, IamError> {
        match self.users_data.read() {
            Ok(guard) => f(&guard),
            Err(_) => {
                log::error!("Users lock poisoned on read; reloading from disk");
                Self::reload_users_from_store(&self.users_data, &self.store)?;
                let guard = self.users_data.read().map_err(|_| {
                    IamError::ConfigurationError(
                        "Users lock poisoned after recovery attempt".to_string(),
                    )
                })?;
                f(&guard)
            }
        }
    }

    fn with_users_write<T>(
        users_data: &Arc<RwLock<UsersData>>,
        store: &Arc<dyn UserStore>,
        f: impl FnOnce(&mut UsersData) -> Result<T, IamError>,
    ) -> Result<T, IamError> {
        let mut guard = match users_data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("Users lock poisoned on write; reloading from disk");
                let mut guard = poisoned.into_inner();
                let users = store.load()?;
                *guard = users;
                users_data.clear_poison();
                guard
            }
        };

        f(&mut guard)
    }

    fn email_taken(users: &UsersData, email: &str, except_id: Option<u32>) -> bool {
        users
            .values()
            .any(|user| user.email == email && Some(user.id) != except_id)
    }

    /// Handle a user mutation (runs in the background task)
    fn handle_mutation(
        mutation: &UserMutation,
        users_data: &Arc<RwLock<UsersData>>,
        store: &Arc<dyn UserStore>,
    ) -> Result<UserMutationResult, IamError> {
        match mutation {
            UserMutation::Insert {
                name,
                email,
                password_hash,
                admin,
            } => Self::with_users_write(users_data, store, |users| {
                if Self::email_taken(users, email, None) {
                    return Err(IamError::EmailInUse(email.clone()));
                }

                let id = users.keys().max().copied().unwrap_or(0) + 1;
                let user = User {
                    id,
                    name: name.clone(),
                    email: email.clone(),
                    password_hash: Some(password_hash.clone()),
                    admin: *admin,
                };

                let mut updated = users.clone();
                updated.insert(id, user.clone());

                store.save(&updated)?;
                *users = updated;
                Ok(UserMutationResult::Inserted(user))
            }),
            UserMutation::UpdateAttributes {
                id,
                name,
                email,
                admin,
            } => Self::with_users_write(users_data, store, |users| {
                if !users.contains_key(id) {
                    return Err(IamError::UserNotFound(*id));
                }
                if Self::email_taken(users, email, Some(*id)) {
                    return Err(IamError::EmailInUse(email.clone()));
                }

                let mut updated = users.clone();
                if let Some(user) = updated.get_mut(id) {
                    user.name = name.clone();
                    user.email = email.clone();
                    user.admin = *admin;
                }

                store.save(&updated)?;
                *users = updated;
                Ok(UserMutationResult::Updated)
            }),
            UserMutation::UpdatePassword { id, password_hash } => {
                Self::with_users_write(users_data, store, |users| {
                    if !users.contains_key(id) {
                        return Err(IamError::UserNotFound(*id));
                    }

                    let mut updated = users.clone();
                    if let Some(user) = updated.get_mut(id) {
                        user.password_hash = Some(password_hash.clone());
                    }

                    store.save(&updated)?;
                    *users = updated;
                    Ok(UserMutationResult::PasswordChanged)
                })
            }
            UserMutation::Delete { id } => Self::with_users_write(users_data, store, |users| {
                let mut updated = users.clone();
                if updated.remove(id).is_some() {
                    store.save(&updated)?;
                    *users = updated;
                    Ok(UserMutationResult::Deleted)
                } else {
                    Err(IamError::UserNotFound(*id))
                }
            }),
        }
    }

    async fn send_mutation(&self, mutation: UserMutation) -> Result<UserMutationResult, IamError> {
        let (response_sender, response_receiver) = oneshot::channel();

        self.mutation_sender
            .send((mutation, response_sender))
            .map_err(|_| IamError::ServiceNotInitialized)?;

        response_receiver
            .await
            .map_err(|_| IamError::ServiceNotInitialized)?
    }

    /// List all users ordered by id (synchronous read operation)
    pub fn list_users(&self) -> Result<Vec<User>, IamError> {
        self.with_users_read(|users| {
            let mut all: Vec<User> = users.values().cloned().collect();
            all.sort_by_key(|user| user.id);
            Ok(all)
        })
    }

    /// Get a user by id (synchronous read operation)
    pub fn get_by_id(&self, id: u32) -> Result<Option<User>, IamError> {
        self.with_users_read(|users| Ok(users.get(&id).cloned()))
    }

    /// Get a user by email, the login key (synchronous read operation)
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, IamError> {
        self.with_users_read(|users| Ok(users.values().find(|user| user.email == email).cloned()))
    }

    /// Get the stored password hash for an email (synchronous read operation)
    pub fn password_hash_by_email(&self, email: &str) -> Result<Option<String>, IamError> {
        self.with_users_read(|users| {
            Ok(users
                .values()
                .find(|user| user.email == email)
                .and_then(|user| user.password_hash.clone()))
        })
    }

    /// Insert a new user, assigning the next free id (async mutation)
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        admin: bool,
    ) -> Result<User, IamError> {
        let mutation = UserMutation::Insert {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            admin,
        };

        match self.send_mutation(mutation).await? {
            UserMutationResult::Inserted(user) => Ok(user),
            _ => Err(IamError::ConfigurationError(
                "Unexpected result".to_string(),
            )),
        }
    }

    /// Overwrite name, email and the administrator flag (async mutation)
    pub async fn update_attributes(
        &self,
        id: u32,
        name: &str,
        email: &str,
        admin: bool,
    ) -> Result<(), IamError> {
        let mutation = UserMutation::UpdateAttributes {
            id,
            name: name.to_string(),
            email: email.to_string(),
            admin,
        };

        match self.send_mutation(mutation).await? {
            UserMutationResult::Updated => Ok(()),
            _ => Err(IamError::ConfigurationError(
                "Unexpected result".to_string(),
            )),
        }
    }

    /// Replace the stored password hash (async mutation)
    pub async fn update_password(&self, id: u32, password_hash: &str) -> Result<(), IamError> {
        let mutation = UserMutation::UpdatePassword {
            id,
            password_hash: password_hash.to_string(),
        };

        match self.send_mutation(mutation).await? {
            UserMutationResult::PasswordChanged => Ok(()),
            _ => Err(IamError::ConfigurationError(
                "Unexpected result".to_string(),
            )),
        }
    }

    /// Delete a user record (async mutation)
    pub async fn delete(&self, id: u32) -> Result<(), IamError> {
        match self.send_mutation(UserMutation::Delete { id }).await? {
            UserMutationResult::Deleted => Ok(()),
            _ => Err(IamError::ConfigurationError(
                "Unexpected result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::store::MemoryUserStore;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct FailingUserStore {
        users: UsersData,
    }

    impl FailingUserStore {
        fn new(users: UsersData) -> Self {
            Self { users }
        }
    }

    impl UserStore for FailingUserStore {
        fn load(&self) -> Result<UsersData, IamError> {
            Ok(self.users.clone())
        }

        fn save(&self, _users: &UsersData) -> Result<(), IamError> {
            Err(IamError::FileError(
                "Simulated users save failure".to_string(),
            ))
        }
    }

    fn sample_user(id: u32, email: &str, admin: bool) -> User {
        User {
            id,
            name: format!("Usuário {}", id),
            email: email.to_string(),
            password_hash: Some("$argon2id$stub".to_string()),
            admin,
        }
    }

    fn seeded_store(users: Vec<User>) -> Arc<MemoryUserStore> {
        let data: UsersData = users.into_iter().map(|user| (user.id, user)).collect();
        Arc::new(MemoryUserStore::new(data))
    }

    #[tokio::test]
    async fn insert_assigns_next_id_above_max() {
        let store = seeded_store(vec![
            sample_user(1, "admin@example.com", true),
            sample_user(7, "other@example.com", false),
        ]);
        let repo = UserRepository::new(store).expect("repo");

        let user = repo
            .insert("Novo", "novo@example.com", "$argon2id$stub", false)
            .await
            .expect("insert");
        assert_eq!(user.id, 8);
        assert!(!user.admin);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = seeded_store(vec![sample_user(1, "admin@example.com", true)]);
        let repo = UserRepository::new(store).expect("repo");

        let result = repo
            .insert("Outro", "admin@example.com", "$argon2id$stub", false)
            .await;
        assert!(matches!(result, Err(IamError::EmailInUse(_))));
        assert_eq!(repo.list_users().expect("list").len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let store = seeded_store(vec![
            sample_user(1, "admin@example.com", true),
            sample_user(2, "user@example.com", false),
        ]);
        let repo = UserRepository::new(store).expect("repo");

        let result = repo
            .update_attributes(2, "Usuário 2", "admin@example.com", false)
            .await;
        assert!(matches!(result, Err(IamError::EmailInUse(_))));
    }

    #[tokio::test]
    async fn update_keeps_own_email() {
        let store = seeded_store(vec![sample_user(2, "user@example.com", false)]);
        let repo = UserRepository::new(store).expect("repo");

        repo.update_attributes(2, "Renomeado", "user@example.com", true)
            .await
            .expect("update");

        let user = repo.get_by_id(2).expect("get").expect("user");
        assert_eq!(user.name, "Renomeado");
        assert!(user.admin);
    }

    #[tokio::test]
    async fn list_users_is_ordered_by_id() {
        let store = seeded_store(vec![
            sample_user(5, "c@example.com", false),
            sample_user(1, "a@example.com", true),
            sample_user(3, "b@example.com", false),
        ]);
        let repo = UserRepository::new(store).expect("repo");

        let ids: Vec<u32> = repo
            .list_users()
            .expect("list")
            .into_iter()
            .map(|user| user.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn password_hash_lookup_uses_email() {
        let store = seeded_store(vec![sample_user(2, "user@example.com", false)]);
        let repo = UserRepository::new(store).expect("repo");

        let hash = repo
            .password_hash_by_email("user@example.com")
            .expect("lookup");
        assert_eq!(hash.as_deref(), Some("$argon2id$stub"));
        assert!(repo
            .password_hash_by_email("missing@example.com")
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn insert_does_not_mutate_in_memory_on_save_error() {
        let store = Arc::new(FailingUserStore::new(HashMap::new()));
        let repo = UserRepository::new(store).expect("repo");

        let result = repo
            .insert("Novo", "novo@example.com", "$argon2id$stub", false)
            .await;
        assert!(result.is_err());
        assert!(repo.list_users().expect("list").is_empty());
    }

    #[tokio::test]
    async fn update_does_not_mutate_in_memory_on_save_error() {
        let mut users = HashMap::new();
        users.insert(2, sample_user(2, "user@example.com", false));
        let store = Arc::new(FailingUserStore::new(users));
        let repo = UserRepository::new(store).expect("repo");

        let result = repo
            .update_attributes(2, "Renomeado", "user@example.com", true)
            .await;
        assert!(result.is_err());

        let user = repo.get_by_id(2).expect("get").expect("user");
        assert_eq!(user.name, "Usuário 2");
        assert!(!user.admin);
    }

    #[tokio::test]
    async fn delete_does_not_mutate_in_memory_on_save_error() {
        let mut users = HashMap::new();
        users.insert(2, sample_user(2, "user@example.com", false));
        let store = Arc::new(FailingUserStore::new(users));
        let repo = UserRepository::new(store).expect("repo");

        let result = repo.delete(2).await;
        assert!(result.is_err());
        assert_eq!(repo.list_users().expect("list").len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_user_reports_not_found() {
        let store = seeded_store(vec![sample_user(1, "admin@example.com", true)]);
        let repo = UserRepository::new(store).expect("repo");

        let result = repo.delete(42).await;
        assert!(matches!(result, Err(IamError::UserNotFound(42))));
    }

    #[tokio::test]
    async fn password_update_replaces_stored_hash() {
        let store = seeded_store(vec![sample_user(2, "user@example.com", false)]);
        let repo = UserRepository::new(store).expect("repo");

        repo.update_password(2, "$argon2id$new")
            .await
            .expect("update password");

        let hash = repo
            .password_hash_by_email("user@example.com")
            .expect("lookup");
        assert_eq!(hash.as_deref(), Some("$argon2id$new"));
    }
}
