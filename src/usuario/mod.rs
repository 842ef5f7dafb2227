// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod forms;
pub mod handlers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/usuario")
            .route("", web::get().to(handlers::get_index))
            .route("/", web::get().to(handlers::get_index))
            .route("/novo", web::get().to(handlers::get_novo))
            .route("/novo", web::post().to(handlers::post_novo))
            .route("/excluir/{id}", web::get().to(handlers::get_excluir))
            .route("/excluir/{id}", web::post().to(handlers::post_excluir))
            .route("/alterar/{id}", web::get().to(handlers::get_alterar))
            .route("/alterar/{id}", web::post().to(handlers::post_alterar))
            .route("/arearestrita", web::get().to(handlers::get_arearestrita))
            .route("/alterarsenha", web::post().to(handlers::post_alterarsenha)),
    );
}
