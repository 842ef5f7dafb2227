// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{App, web};
use std::sync::Arc;

use cadastro::app_state::AppState;
use cadastro::config::Config;
use cadastro::iam::middleware::SessionAuthMiddlewareFactory;
use cadastro::iam::types::User;
use cadastro::iam::{FileUserStore, UserRepository, UserStore, hash_password};
use cadastro::login;
use cadastro::login::handlers::session_cookie;
use cadastro::usuario;
use cadastro::util::flash::FLASH_COOKIE_NAME;
use cadastro::util::test_fixtures::TestFixtureRoot;

pub const ADMIN_ID: u32 = 1;
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const REGULAR_ID: u32 = 2;
pub const REGULAR_EMAIL: &str = "user@example.com";
pub const REGULAR_PASSWORD: &str = "user-password";

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: web::Data<Config>,
    pub app_state: web::Data<AppState>,
    pub repo: web::Data<UserRepository>,
    pub store: Arc<FileUserStore>,
}

impl TestHarness {
    /// Seed a users file with the default administrator (id 1) and one
    /// regular user (id 2), then wire up the application services.
    pub async fn new(prefix: &str) -> Self {
        let fixture = TestFixtureRoot::new_unique(prefix).expect("fixture root");

        let store = Arc::new(FileUserStore::new(fixture.users_file()).expect("store"));
        let mut users = cadastro::iam::types::UsersData::new();
        users.insert(
            ADMIN_ID,
            User {
                id: ADMIN_ID,
                name: "Administrador".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password_hash: Some(hash_password(ADMIN_PASSWORD).expect("hash")),
                admin: true,
            },
        );
        users.insert(
            REGULAR_ID,
            User {
                id: REGULAR_ID,
                name: "Usuário Comum".to_string(),
                email: REGULAR_EMAIL.to_string(),
                password_hash: Some(hash_password(REGULAR_PASSWORD).expect("hash")),
                admin: false,
            },
        );
        store.save(&users).expect("seed users");

        let repo =
            UserRepository::new(store.clone() as Arc<dyn UserStore>).expect("repository");

        Self {
            fixture,
            config: web::Data::new(Config::default()),
            app_state: web::Data::new(AppState::new()),
            repo: web::Data::new(repo),
            store,
        }
    }

    /// Issue a session for a user id and wrap it in the request cookie
    /// the middleware expects.
    pub async fn session_cookie_for(&self, user_id: u32) -> Cookie<'static> {
        let ttl_seconds = self.config.sessions.ttl_seconds;
        let token = self
            .app_state
            .sessions
            .issue(user_id, ttl_seconds)
            .await
            .expect("session token");
        session_cookie(&self.config.sessions.cookie_name, &token, ttl_seconds)
    }

    /// Re-read the users file the way a restarted server would.
    pub fn persisted_users(&self) -> cadastro::iam::types::UsersData {
        self.store.load().expect("load users")
    }
}

pub fn build_test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(SessionAuthMiddlewareFactory)
        .app_data(harness.app_state.clone())
        .app_data(harness.repo.clone())
        .app_data(harness.config.clone())
        .configure(login::configure)
        .configure(usuario::configure)
}

pub fn location_header<B>(response: &ServiceResponse<B>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("Location header")
}

pub fn flash_message<B>(response: &ServiceResponse<B>) -> Option<String> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == FLASH_COOKIE_NAME)
        .map(|cookie| {
            urlencoding::decode(cookie.value())
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| cookie.value().to_string())
        })
}

pub fn session_token<B>(response: &ServiceResponse<B>, cookie_name: &str) -> Option<String> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_string())
}
