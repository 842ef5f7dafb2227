// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::{HttpRequest, HttpResponse};

pub const FLASH_COOKIE_NAME: &str = "mensagem";

// Long enough to survive the redirect round-trip, short enough that an
// unconsumed message does not linger.
const FLASH_MAX_AGE_SECONDS: i64 = 60;

/// Build a redirect response carrying a one-shot user-facing message.
/// The message rides a short-lived cookie consumed by the next page
/// render.
pub fn redirect_with_message(location: &str, message: &str) -> HttpResponse {
    let cookie = Cookie::build(
        FLASH_COOKIE_NAME,
        urlencoding::encode(message).into_owned(),
    )
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .max_age(time::Duration::seconds(FLASH_MAX_AGE_SECONDS))
    .finish();

    HttpResponse::SeeOther()
        .cookie(cookie)
        .insert_header((LOCATION, location.to_owned()))
        .finish()
}

/// Read the pending flash message, if any. The cookie itself is cleared
/// by `page_response` when the page is rendered.
pub fn take_flash_message(req: &HttpRequest) -> Option<String> {
    let cookie = req.cookie(FLASH_COOKIE_NAME)?;
    let decoded = urlencoding::decode(cookie.value())
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| cookie.value().to_string());
    Some(decoded)
}

/// Wrap rendered HTML in a response, clearing the flash cookie when one
/// was delivered with the request (consume-once semantics).
pub fn page_response(req: &HttpRequest, html: String) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.content_type(ContentType::html());
    if req.cookie(FLASH_COOKIE_NAME).is_some() {
        builder.cookie(clear_flash_cookie());
    }
    builder.body(html)
}

fn clear_flash_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(FLASH_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    #[test]
    fn redirect_carries_location_and_flash_cookie() {
        let response = redirect_with_message("/usuario/novo", "As senhas não coincidem.");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("/usuario/novo")
        );

        let cookie = response
            .cookies()
            .find(|cookie| cookie.name() == FLASH_COOKIE_NAME)
            .expect("flash cookie");
        let decoded = urlencoding::decode(cookie.value()).expect("decode");
        assert_eq!(decoded, "As senhas não coincidem.");
    }

    #[test]
    fn take_flash_message_decodes_cookie_value() {
        let encoded = urlencoding::encode("Usuário excluído com sucesso.").into_owned();
        let req = TestRequest::get()
            .cookie(Cookie::new(FLASH_COOKIE_NAME, encoded))
            .to_http_request();

        assert_eq!(
            take_flash_message(&req).as_deref(),
            Some("Usuário excluído com sucesso.")
        );
    }

    #[test]
    fn take_flash_message_absent_without_cookie() {
        let req = TestRequest::get().to_http_request();
        assert!(take_flash_message(&req).is_none());
    }

    #[test]
    fn page_response_clears_delivered_flash_cookie() {
        let req = TestRequest::get()
            .cookie(Cookie::new(FLASH_COOKIE_NAME, "lida"))
            .to_http_request();

        let response = page_response(&req, "<html></html>".to_string());
        let removal = response
            .cookies()
            .find(|cookie| cookie.name() == FLASH_COOKIE_NAME)
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
    }

    #[test]
    fn page_response_without_flash_sets_no_cookie() {
        let req = TestRequest::get().to_http_request();
        let response = page_response(&req, "<html></html>".to_string());
        assert!(response.cookies().next().is_none());
    }
}
