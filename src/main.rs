// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::header::LOCATION;
use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use std::path::PathBuf;
use std::sync::Arc;

use cadastro::app_state::AppState;
use cadastro::bootstrap::ensure_default_admin;
use cadastro::config::Config;
use cadastro::iam::middleware::SessionAuthMiddlewareFactory;
use cadastro::iam::{FileUserStore, UserRepository, UserStore};
use cadastro::{login, usuario};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            return Err(std::io::Error::other(err.to_string()));
        }
    };

    let store = FileUserStore::new(config.users_file.clone())
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    ensure_default_admin(&store, &config.bootstrap_admin)
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let store: Arc<dyn UserStore> = Arc::new(store);
    let repo =
        UserRepository::new(store).map_err(|err| std::io::Error::other(err.to_string()))?;
    let app_state = web::Data::new(AppState::new());
    let repo_data = web::Data::new(repo);
    let config_data = web::Data::new(config.clone());

    let bind = (config.server.bind_address.clone(), config.server.port);
    log::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(SessionAuthMiddlewareFactory)
            .app_data(app_state.clone())
            .app_data(repo_data.clone())
            .app_data(config_data.clone())
            .configure(login::configure)
            .configure(usuario::configure)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::SeeOther()
                        .insert_header((LOCATION, "/login"))
                        .finish()
                }),
            )
    })
    .bind(bind)?
    .run()
    .await
}
