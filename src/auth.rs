use log::info;
use spin_sdk::http::{Request, Response};

use crate::config::*;
use crate::core::db::{load_users_or_default, save_current_user, save_users, load_state};
use crate::core::errors::{AuthError, StoreError};
use crate::core::helpers::{html, redirect, validate_email};
use crate::core::kv::KeyValue;
use crate::core::query_params::{get_string, parse_form};
use crate::models::models::{AppState, FeedView, User};
use crate::templates::{render_page, Notice};

pub fn signup(store: &dyn KeyValue, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
    let name = name.trim();
    let email = email.trim().to_lowercase();

    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::field("signup-name-err", "Name must be at least 3 characters"));
    }
    if !validate_email(&email) {
        return Err(AuthError::field("signup-email-err", "Enter a valid email"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::field("signup-pass-err", "Password must be 6+ characters"));
    }

    let mut users = load_users_or_default(store)?;
    if users.iter().any(|u| u.email.to_lowercase() == email) {
        return Err(AuthError::field("signup-email-err", "Email already registered"));
    }

    let user = User {
        name: name.to_string(),
        email,
        password: password.to_string(),
    };
    users.push(user.clone());
    save_users(store, &users)?;
    save_current_user(store, Some(&user))?;

    info!("registered {}", user.email);
    Ok(user)
}

pub fn login(store: &dyn KeyValue, email: &str, password: &str) -> Result<User, AuthError> {
    let email = email.trim().to_lowercase();
    let users = load_users_or_default(store)?;

    if users.is_empty() {
        return Err(AuthError::field("login-error", "No account found. Please signup."));
    }

    match users.into_iter().find(|u| u.email == email && u.password == password) {
        Some(user) => {
            save_current_user(store, Some(&user))?;
            info!("logged in {}", user.email);
            Ok(user)
        }
        None => Err(AuthError::field("login-error", "Invalid credentials")),
    }
}

/// Clears the active-user record; the user list is untouched.
pub fn logout(store: &dyn KeyValue) -> Result<(), StoreError> {
    save_current_user(store, None)
}

// === HTTP Handlers ===

pub fn handle_signup(store: &dyn KeyValue, req: &Request) -> anyhow::Result<Response> {
    let form = parse_form(req.body());
    let name = get_string(&form, "name", Some("")).unwrap_or_default();
    let email = get_string(&form, "email", Some("")).unwrap_or_default();
    let password = get_string(&form, "password", Some("")).unwrap_or_default();

    let result = signup(store, &name, &email, &password);
    auth_response(store, result, true)
}

pub fn handle_login(store: &dyn KeyValue, req: &Request) -> anyhow::Result<Response> {
    let form = parse_form(req.body());
    let email = get_string(&form, "email", Some("")).unwrap_or_default();
    let password = get_string(&form, "password", Some("")).unwrap_or_default();

    let result = login(store, &email, &password);
    auth_response(store, result, false)
}

pub fn handle_logout(store: &dyn KeyValue) -> anyhow::Result<Response> {
    logout(store)?;
    Ok(redirect("/"))
}

fn auth_response(store: &dyn KeyValue, result: Result<User, AuthError>, signup: bool) -> anyhow::Result<Response> {
    match result {
        Ok(_) => Ok(redirect("/")),
        Err(AuthError::Field { field, message }) => {
            // Errors belong to the auth forms, even over a stale session
            let state = AppState { current_user: None, ..load_state(store)? };
            let notice = Notice {
                field_error: Some((field, message)),
                signup,
                ..Notice::default()
            };
            Ok(html(400, render_page(&state, &FeedView::default(), &notice)?))
        }
        Err(AuthError::Internal(msg)) => Err(anyhow::anyhow!(msg)),
    }
}
