// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NovoUsuarioForm {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub confsenha: String,
}

#[derive(Debug, Deserialize)]
pub struct AlterarUsuarioForm {
    pub nome: String,
    pub email: String,
    // HTML checkbox: present ("on") when checked, absent otherwise.
    #[serde(default)]
    pub administrador: Option<String>,
}

impl AlterarUsuarioForm {
    pub fn admin_flag(&self) -> bool {
        matches!(
            self.administrador.as_deref(),
            Some("on") | Some("true") | Some("1")
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct AlterarSenhaForm {
    #[serde(rename = "senhaAtual", default)]
    pub senha_atual: String,
    #[serde(default)]
    pub novasenha: String,
    #[serde(default)]
    pub confnovasenha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_values_map_to_admin_flag() {
        let form: AlterarUsuarioForm =
            serde_urlencoded::from_str("nome=Nome&email=a%40b.com&administrador=on")
                .expect("form");
        assert!(form.admin_flag());

        let form: AlterarUsuarioForm =
            serde_urlencoded::from_str("nome=Nome&email=a%40b.com").expect("form");
        assert!(!form.admin_flag());
    }

    #[test]
    fn password_change_fields_default_to_empty() {
        let form: AlterarSenhaForm = serde_urlencoded::from_str("senhaAtual=antiga").expect("form");
        assert_eq!(form.senha_atual, "antiga");
        assert!(form.novasenha.is_empty());
        assert!(form.confnovasenha.is_empty());
    }
}
