// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use minijinja::{Environment, Value, default_auto_escape_callback};

pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error>;
}

pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(default_auto_escape_callback);
        env.set_loader(embedded_template_loader);
        Self { env }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template_name)?;
        tmpl.render(context)
    }
}

/// Template loader for minijinja that loads from embedded sources
fn embedded_template_loader(name: &str) -> Result<Option<String>, minijinja::Error> {
    let template_content = match name {
        // Login template
        "login/login.html" => Some(include_str!("login/templates/login.html")),

        // User management templates
        "usuario/index.html" => Some(include_str!("usuario/templates/index.html")),
        "usuario/novo.html" => Some(include_str!("usuario/templates/novo.html")),
        "usuario/excluir.html" => Some(include_str!("usuario/templates/excluir.html")),
        "usuario/alterar.html" => Some(include_str!("usuario/templates/alterar.html")),
        "usuario/arearestrita.html" => Some(include_str!("usuario/templates/arearestrita.html")),

        _ => None,
    };

    Ok(template_content.map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_embedded_login_template() {
        let engine = MiniJinjaEngine::new();
        let html = engine
            .render("login/login.html", context! { mensagem => Value::UNDEFINED })
            .expect("render");
        assert!(html.contains("<form"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let engine = MiniJinjaEngine::new();
        assert!(engine.render("missing.html", context! {}).is_err());
    }

    #[test]
    fn user_values_are_escaped() {
        let engine = MiniJinjaEngine::new();
        let html = engine
            .render(
                "usuario/novo.html",
                context! { mensagem => "<script>alert(1)</script>" },
            )
            .expect("render");
        assert!(!html.contains("<script>alert(1)</script>"));
    }
}
