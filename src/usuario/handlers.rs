// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, Result, error, web};
use minijinja::context;
use serde::Serialize;

use crate::app_state::AppState;
use crate::iam::policy;
use crate::iam::repo::UserRepository;
use crate::iam::types::User;
use crate::iam::{AuthRequest, hash_password, verify_password};
use crate::security::{validate_and_sanitize_user_name, validate_email_field};
use crate::usuario::forms::{AlterarSenhaForm, AlterarUsuarioForm, NovoUsuarioForm};
use crate::util::flash::{page_response, redirect_with_message, take_flash_message};

const PASSWORD_MISMATCH_MESSAGE: &str = "As senhas não coincidem.";
const ACCOUNT_CREATED_MESSAGE: &str =
    "Sua conta foi criada com sucesso! Use seu e-mail e senha para fazer login.";
const EMAIL_IN_USE_MESSAGE: &str = "Já existe um usuário cadastrado com este e-mail.";
const USER_DELETED_MESSAGE: &str = "Usuário excluído com sucesso.";
const USER_NOT_FOUND_MESSAGE: &str = "Usuário não encontrado.";
const USER_UPDATED_MESSAGE: &str = "Usuário alterado com sucesso.";
const WRONG_CURRENT_PASSWORD_MESSAGE: &str = "Senha atual incorreta.";
const PASSWORD_CHANGED_MESSAGE: &str = "Senha alterada com sucesso.";

/// Template-facing projection of a user record. The password hash never
/// leaves the repository layer.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: u32,
    pub nome: String,
    pub email: String,
    pub admin: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            nome: user.name.clone(),
            email: user.email.clone(),
            admin: user.admin,
        }
    }
}

fn caller_view(req: &HttpRequest) -> Option<UserView> {
    req.user_info().as_ref().map(UserView::from)
}

/// List all users. Administrators only.
pub async fn get_index(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let usuario = policy::require_admin(&req)?;

    let usuarios: Vec<UserView> = repo
        .list_users()
        .map_err(error::ErrorInternalServerError)?
        .iter()
        .map(UserView::from)
        .collect();

    let html = app_state
        .templates
        .render(
            "usuario/index.html",
            context! {
                usuario => UserView::from(&usuario),
                usuarios,
                mensagem => take_flash_message(&req),
            },
        )
        .map_err(error::ErrorInternalServerError)?;
    Ok(page_response(&req, html))
}

/// Registration form. Reachable without authentication.
pub async fn get_novo(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let html = app_state
        .templates
        .render(
            "usuario/novo.html",
            context! {
                usuario => caller_view(&req),
                mensagem => take_flash_message(&req),
            },
        )
        .map_err(error::ErrorInternalServerError)?;
    Ok(page_response(&req, html))
}

/// Self-registration. Always creates a non-administrator record.
pub async fn post_novo(
    form: web::Form<NovoUsuarioForm>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    if form.senha != form.confsenha {
        return Ok(redirect_with_message("/usuario/novo", PASSWORD_MISMATCH_MESSAGE));
    }
    let nome = match validate_and_sanitize_user_name(&form.nome) {
        Ok(nome) => nome,
        Err(msg) => return Ok(redirect_with_message("/usuario/novo", &msg)),
    };
    if let Err(msg) = validate_email_field(&form.email) {
        return Ok(redirect_with_message("/usuario/novo", &msg));
    }

    let password_hash = hash_password(&form.senha).map_err(error::ErrorInternalServerError)?;

    match repo
        .insert(&nome, form.email.trim(), &password_hash, false)
        .await
    {
        Ok(user) => {
            log::info!("User registered: {} (id {})", user.email, user.id);
            Ok(redirect_with_message("/login", ACCOUNT_CREATED_MESSAGE))
        }
        Err(crate::iam::IamError::EmailInUse(_)) => {
            Ok(redirect_with_message("/usuario/novo", EMAIL_IN_USE_MESSAGE))
        }
        Err(err) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Deletion confirmation page. Administrators only.
pub async fn get_excluir(
    req: HttpRequest,
    path: web::Path<u32>,
    app_state: web::Data<AppState>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let usuario = policy::require_admin(&req)?;

    let id = path.into_inner();
    let usuario_excluir = repo
        .get_by_id(id)
        .map_err(error::ErrorInternalServerError)?
        .as_ref()
        .map(UserView::from);

    let html = app_state
        .templates
        .render(
            "usuario/excluir.html",
            context! {
                usuario => UserView::from(&usuario),
                usuario_excluir,
                mensagem => take_flash_message(&req),
            },
        )
        .map_err(error::ErrorInternalServerError)?;
    Ok(page_response(&req, html))
}

/// Deletion submit. Administrators only; the default administrator and
/// the caller's own record are refused with a message.
pub async fn post_excluir(
    req: HttpRequest,
    path: web::Path<u32>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let usuario = policy::require_admin(&req)?;

    let id = path.into_inner();
    if let Err(refusal) = policy::deletion_guard(id, &usuario) {
        return Ok(redirect_with_message("/usuario", refusal.message()));
    }

    match repo.delete(id).await {
        Ok(()) => {
            log::info!("User {} deleted by {}", id, usuario.email);
            Ok(redirect_with_message("/usuario", USER_DELETED_MESSAGE))
        }
        Err(crate::iam::IamError::UserNotFound(_)) => {
            Ok(redirect_with_message("/usuario", USER_NOT_FOUND_MESSAGE))
        }
        Err(err) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Edit form.
pub async fn get_alterar(
    req: HttpRequest,
    path: web::Path<u32>,
    app_state: web::Data<AppState>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let usuario_alterar = repo
        .get_by_id(id)
        .map_err(error::ErrorInternalServerError)?
        .as_ref()
        .map(UserView::from);

    let html = app_state
        .templates
        .render(
            "usuario/alterar.html",
            context! {
                usuario => caller_view(&req),
                usuario_alterar,
                mensagem => take_flash_message(&req),
            },
        )
        .map_err(error::ErrorInternalServerError)?;
    Ok(page_response(&req, html))
}

/// Edit submit. Overwrites name, email and the administrator flag of
/// the target; the default administrator is refused with a message.
pub async fn post_alterar(
    req: HttpRequest,
    path: web::Path<u32>,
    form: web::Form<AlterarUsuarioForm>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let usuario = policy::require_user(&req)?;

    let id = path.into_inner();
    if let Err(refusal) = policy::edit_guard(id) {
        return Ok(redirect_with_message("/usuario", refusal.message()));
    }

    let nome = match validate_and_sanitize_user_name(&form.nome) {
        Ok(nome) => nome,
        Err(msg) => return Ok(redirect_with_message(&format!("/usuario/alterar/{}", id), &msg)),
    };
    if let Err(msg) = validate_email_field(&form.email) {
        return Ok(redirect_with_message(&format!("/usuario/alterar/{}", id), &msg));
    }

    match repo
        .update_attributes(id, &nome, form.email.trim(), form.admin_flag())
        .await
    {
        Ok(()) => {}
        Err(crate::iam::IamError::UserNotFound(_)) => {
            return Ok(redirect_with_message("/usuario", USER_NOT_FOUND_MESSAGE));
        }
        Err(crate::iam::IamError::EmailInUse(_)) => {
            return Ok(redirect_with_message(
                &format!("/usuario/alterar/{}", id),
                EMAIL_IN_USE_MESSAGE,
            ));
        }
        Err(err) => return Err(error::ErrorInternalServerError(err)),
    }

    log::info!("User {} updated by {}", id, usuario.email);
    if usuario.admin {
        Ok(redirect_with_message("/usuario/", USER_UPDATED_MESSAGE))
    } else {
        Ok(redirect_with_message(
            "/usuario/arearestrita",
            USER_UPDATED_MESSAGE,
        ))
    }
}

/// Self-service view. The caller's record is re-fetched from storage so
/// the page always reflects the persisted state.
pub async fn get_arearestrita(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let usuario = policy::require_user(&req)?;

    let fresh = repo
        .get_by_id(usuario.id)
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorUnauthorized("Authentication required"))?;

    let html = app_state
        .templates
        .render(
            "usuario/arearestrita.html",
            context! {
                usuario => UserView::from(&fresh),
                mensagem => take_flash_message(&req),
            },
        )
        .map_err(error::ErrorInternalServerError)?;
    Ok(page_response(&req, html))
}

/// Self-service password change.
pub async fn post_alterarsenha(
    req: HttpRequest,
    form: web::Form<AlterarSenhaForm>,
    repo: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let usuario = policy::require_user(&req)?;

    let stored_hash = repo
        .password_hash_by_email(&usuario.email)
        .map_err(error::ErrorInternalServerError)?;
    if let Some(stored_hash) = stored_hash {
        let current_ok = match verify_password(&form.senha_atual, &stored_hash) {
            Ok(valid) => valid,
            Err(err) => {
                log::warn!(
                    "Stored password hash for {} is unusable: {}",
                    usuario.email,
                    err
                );
                false
            }
        };
        if !current_ok {
            return Ok(redirect_with_message(
                "/usuario/arearestrita",
                WRONG_CURRENT_PASSWORD_MESSAGE,
            ));
        }
    }

    if form.novasenha != form.confnovasenha {
        return Ok(redirect_with_message(
            "/usuario/arearestrita",
            PASSWORD_MISMATCH_MESSAGE,
        ));
    }

    let new_hash = hash_password(&form.novasenha).map_err(error::ErrorInternalServerError)?;
    repo.update_password(usuario.id, &new_hash)
        .await
        .map_err(error::ErrorInternalServerError)?;

    log::info!("Password changed for {}", usuario.email);
    Ok(redirect_with_message(
        "/usuario/arearestrita",
        PASSWORD_CHANGED_MESSAGE,
    ))
}
