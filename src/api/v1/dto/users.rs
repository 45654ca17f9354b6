/*
 * Responsibility
 * - Account (register / login / delete / password) の request/response DTO
 * - validation (形式チェック) は validate() に持たせる
 */
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::accounts::{Registration, Session};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$"#)
        .expect("email pattern is a valid regex")
});

const PASSWORD_SPECIALS: &str = r#"!@#$%^&*(),.?":{}|<>"#;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        let name_len = self.user_name.chars().count();
        if name_len == 0 {
            return Err("Username can't be empty".into());
        }
        if name_len < 3 {
            return Err("Username must be at least 3 characters long".into());
        }
        if name_len > 30 {
            return Err("Username must be at most 30 characters long".into());
        }

        validate_email(&self.email)?;
        validate_password(&self.password)
    }

    pub fn into_registration(self) -> Registration {
        Registration {
            username: self.user_name,
            email: self.email,
            password: self.password,
        }
    }
}

/// login と account 削除で共通
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl CredentialsRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.is_empty() {
            return Err("Email can't be empty".into());
        }
        if self.password.is_empty() {
            return Err("Password can't be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub email: String,
    pub password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.is_empty() {
            return Err("Email can't be empty".into());
        }
        if self.password.is_empty() {
            return Err("Password can't be empty".into());
        }
        validate_password(&self.new_password)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

impl From<Session> for TokenResponse {
    fn from(s: Session) -> Self {
        Self {
            user_id: s.user_id,
            token: s.token.token,
            token_type: "Bearer",
            expires_in: s.token.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedAccountResponse {
    pub user_id: Uuid,
}

fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email can't be empty".into());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Invalid email format".into());
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len == 0 {
        return Err("Password can't be empty".into());
    }
    if len < 8 {
        return Err("Password must be at least 8 characters long".into());
    }
    if len > 20 {
        return Err("Password must be at most 20 characters long".into());
    }

    let (mut upper, mut lower, mut number, mut special) = (false, false, false, false);
    for c in password.chars() {
        match c {
            c if c.is_uppercase() => upper = true,
            c if c.is_lowercase() => lower = true,
            c if c.is_numeric() => number = true,
            c if PASSWORD_SPECIALS.contains(c) => special = true,
            _ => {}
        }
    }

    let missing: Vec<&str> = [
        (upper, "uppercase letter"),
        (lower, "lowercase letter"),
        (number, "number"),
        (special, "special character"),
    ]
    .into_iter()
    .filter(|(present, _)| !present)
    .map(|(_, name)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Password must contain at least one {}",
            missing.join(", ")
        ))
    }
}
