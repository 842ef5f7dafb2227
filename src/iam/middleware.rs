// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web::Data;
use actix_web::{HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc; // Services are per-thread

use crate::app_state::AppState;
use crate::config::Config;
use crate::iam::repo::UserRepository;
use crate::iam::types::User;

/// Trait to add authentication methods to HttpRequest
pub trait AuthRequest {
    fn user_info(&self) -> Option<User>;
    fn is_authenticated(&self) -> bool;
    fn is_admin(&self) -> bool;
}

impl AuthRequest for HttpRequest {
    fn user_info(&self) -> Option<User> {
        self.extensions().get::<User>().cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.user_info().is_some()
    }

    fn is_admin(&self) -> bool {
        self.user_info().map(|user| user.admin).unwrap_or(false)
    }
}

/// Session resolution middleware: maps the session cookie to a stored
/// user record and places it in request extensions. Handlers never see
/// the cookie, only the optional `User`.
pub struct SessionAuthMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let app_state = req.app_data::<Data<AppState>>().cloned();
        let repo = req.app_data::<Data<UserRepository>>().cloned();
        let config = req.app_data::<Data<Config>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            if let (Some(app_state), Some(repo), Some(config)) = (app_state, repo, config) {
                if let Some(cookie) = req.cookie(&config.sessions.cookie_name) {
                    if let Some(user_id) = app_state.sessions.resolve(cookie.value()).await {
                        match repo.get_by_id(user_id) {
                            Ok(Some(user)) => {
                                req.extensions_mut().insert(user);
                            }
                            Ok(None) => {
                                // Record deleted since the session was
                                // issued; drop the stale session.
                                app_state.sessions.invalidate(cookie.value());
                            }
                            Err(err) => {
                                log::error!("Failed to resolve session user {}: {}", user_id, err);
                            }
                        }
                    }
                }
            }

            service.call(req).await
        })
    }
}
