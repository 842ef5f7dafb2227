// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, Result, error, web};
use minijinja::context;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::config::Config;
use crate::iam::repo::UserRepository;
use crate::iam::verify_password;
use crate::util::flash::{page_response, redirect_with_message, take_flash_message};

const INVALID_CREDENTIALS_MESSAGE: &str = "E-mail ou senha inválidos.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub senha: String,
}

pub async fn get_login(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let mensagem = take_flash_message(&req);
    let html = app_state
        .templates
        .render("login/login.html", context! { mensagem })
        .map_err(error::ErrorInternalServerError)?;
    Ok(page_response(&req, html))
}

pub async fn post_login(
    form: web::Form<LoginForm>,
    repo: web::Data<UserRepository>,
    app_state: web::Data<AppState>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let user = repo
        .get_by_email(&form.email)
        .map_err(error::ErrorInternalServerError)?;

    let Some(user) = user else {
        return Ok(redirect_with_message("/login", INVALID_CREDENTIALS_MESSAGE));
    };
    let Some(stored_hash) = user.password_hash.as_deref() else {
        return Ok(redirect_with_message("/login", INVALID_CREDENTIALS_MESSAGE));
    };

    let valid = match verify_password(&form.senha, stored_hash) {
        Ok(valid) => valid,
        Err(err) => {
            log::warn!("Stored password hash for {} is unusable: {}", user.email, err);
            false
        }
    };
    if !valid {
        log::info!("Login failed for {}", user.email);
        return Ok(redirect_with_message("/login", INVALID_CREDENTIALS_MESSAGE));
    }

    let ttl_seconds = config.sessions.ttl_seconds;
    let token = app_state
        .sessions
        .issue(user.id, ttl_seconds)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let destination = if user.admin {
        "/usuario/"
    } else {
        "/usuario/arearestrita"
    };

    log::info!("Login succeeded for {}", user.email);
    Ok(HttpResponse::SeeOther()
        .cookie(session_cookie(
            &config.sessions.cookie_name,
            &token,
            ttl_seconds,
        ))
        .insert_header((LOCATION, destination))
        .finish())
}

pub async fn post_logout(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    if let Some(cookie) = req.cookie(&config.sessions.cookie_name) {
        app_state.sessions.invalidate(cookie.value());
    }

    Ok(HttpResponse::SeeOther()
        .cookie(logout_cookie(&config.sessions.cookie_name))
        .insert_header((LOCATION, "/login"))
        .finish())
}

pub fn session_cookie(name: &str, token: &str, ttl_seconds: u64) -> Cookie<'static> {
    Cookie::build(name.to_owned(), token.to_owned())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_seconds as i64))
        .finish()
}

pub fn logout_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_owned(), "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}
