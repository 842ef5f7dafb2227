// This file is part of the product Cadastro.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use validator::ValidateEmail;

pub const MAX_EMAIL_CHARS: usize = 128;
pub const MAX_NAME_CHARS: usize = 256;

/// Validate user email input
pub fn validate_email_field(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("O e-mail é obrigatório.".to_string());
    }
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(format!(
            "O e-mail deve ter no máximo {} caracteres.",
            MAX_EMAIL_CHARS
        ));
    }
    if !trimmed.validate_email() {
        return Err("O formato do e-mail é inválido.".to_string());
    }
    Ok(())
}

/// Validate and sanitize user names for display safety
/// Allows letters, numbers, spaces, apostrophes, hyphens, and periods
/// Replaces invalid characters with spaces and collapses multiple spaces
pub fn validate_and_sanitize_user_name(name: &str) -> Result<String, String> {
    if name.trim().is_empty() {
        return Err("O nome é obrigatório.".to_string());
    }

    let sanitized = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '\'' || c == '-' || c == '.' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>();

    let sanitized = sanitized
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    let sanitized_len = sanitized.chars().count();
    if !(2..=MAX_NAME_CHARS).contains(&sanitized_len) {
        return Err(format!(
            "O nome deve ter entre 2 e {} caracteres.",
            MAX_NAME_CHARS
        ));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_field() {
        assert!(validate_email_field("user@example.com").is_ok());
        assert!(validate_email_field("").is_err());
        assert!(validate_email_field("not-an-email").is_err());
        let long_email = format!("{}@example.com", "a".repeat(MAX_EMAIL_CHARS));
        assert!(validate_email_field(&long_email).is_err());
    }

    #[test]
    fn test_validate_and_sanitize_user_name() {
        assert_eq!(
            validate_and_sanitize_user_name("João Silva").unwrap(),
            "João Silva"
        );
        assert_eq!(
            validate_and_sanitize_user_name("Mary O'Connor").unwrap(),
            "Mary O'Connor"
        );
        assert_eq!(
            validate_and_sanitize_user_name("  Alice  ").unwrap(),
            "Alice"
        );

        // Sanitization
        assert_eq!(
            validate_and_sanitize_user_name("Test<script>").unwrap(),
            "Test script"
        );
        assert_eq!(
            validate_and_sanitize_user_name("John   Multiple   Spaces").unwrap(),
            "John Multiple Spaces"
        );

        // Edge cases
        assert!(validate_and_sanitize_user_name("").is_err());
        assert!(validate_and_sanitize_user_name("   ").is_err());
        assert!(validate_and_sanitize_user_name("A").is_err());
        assert!(validate_and_sanitize_user_name(&"A".repeat(257)).is_err());
    }
}
