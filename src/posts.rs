use chrono::{DateTime, Utc};
use log::{debug, info};
use spin_sdk::http::{Request, Response};

use crate::config::*;
use crate::core::db::{load_state, save_posts};
use crate::core::errors::ApiError;
use crate::core::helpers::{html, next_id, redirect};
use crate::core::kv::KeyValue;
use crate::core::query_params::{feed_view, get_string, parse_form, parse_query_params, view_location};
use crate::models::models::{AppState, Comment, FeedView, Post, User};
use crate::templates::{render_page, Notice};

fn active_user(state: &AppState) -> Result<&User, ApiError> {
    state.current_user.as_ref().ok_or(ApiError::Unauthorized)
}

fn post_index(state: &AppState, post_id: &str) -> Result<usize, ApiError> {
    state
        .posts
        .iter()
        .position(|p| p.id == post_id)
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

fn check_length(text: &str) -> Result<(), ApiError> {
    if text.chars().count() > max_post_length() {
        return Err(ApiError::BadRequest(format!(
            "Posts are limited to {} characters",
            max_post_length()
        )));
    }
    Ok(())
}

pub fn create_post(state: &AppState, text: &str, image: &str, now: DateTime<Utc>) -> Result<AppState, ApiError> {
    let text = text.trim();
    let image = image.trim();
    if text.is_empty() && image.is_empty() {
        return Err(ApiError::BadRequest("Write something or add an image".to_string()));
    }
    let user = active_user(state)?;
    check_length(text)?;

    let post = Post {
        id: next_id(now, state.posts.iter().map(|p| p.id.as_str())),
        author: user.name.clone(),
        author_email: user.email.clone(),
        text: text.to_string(),
        image: if image.is_empty() { None } else { Some(image.to_string()) },
        created_at: now.to_rfc3339(),
        likes: 0,
        liked_by: Vec::new(),
        comments: Vec::new(),
    };

    let mut next = state.clone();
    // newest first
    next.posts.insert(0, post);
    Ok(next)
}

/// Likes the post for the active user, or unlikes it if they already did.
pub fn toggle_like(state: &AppState, post_id: &str) -> Result<AppState, ApiError> {
    let email = active_user(state)?.email.clone();
    let idx = post_index(state, post_id)?;

    let mut next = state.clone();
    let post = &mut next.posts[idx];
    if post.is_liked_by(&email) {
        post.liked_by.retain(|e| *e != email);
        post.likes = post.likes.saturating_sub(1);
    } else {
        post.liked_by.push(email);
        post.likes += 1;
    }
    Ok(next)
}

pub fn delete_post(state: &AppState, post_id: &str) -> Result<AppState, ApiError> {
    let user = active_user(state)?;
    let idx = post_index(state, post_id)?;
    if !state.posts[idx].is_owned_by(user) {
        return Err(ApiError::Forbidden);
    }

    let mut next = state.clone();
    next.posts.remove(idx);
    Ok(next)
}

pub fn edit_post(state: &AppState, post_id: &str, text: &str) -> Result<AppState, ApiError> {
    let user = active_user(state)?;
    let idx = post_index(state, post_id)?;
    let post = &state.posts[idx];
    if !post.is_owned_by(user) {
        return Err(ApiError::Forbidden);
    }

    let text = text.trim();
    if text.is_empty() && post.image.is_none() {
        return Err(ApiError::BadRequest("Write something or add an image".to_string()));
    }
    check_length(text)?;

    let mut next = state.clone();
    next.posts[idx].text = text.to_string();
    Ok(next)
}

/// Empty comments are ignored rather than rejected.
pub fn add_comment(state: &AppState, post_id: &str, text: &str, now: DateTime<Utc>) -> Result<AppState, ApiError> {
    let user = active_user(state)?;
    let idx = post_index(state, post_id)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(state.clone());
    }
    check_length(text)?;

    let post = &state.posts[idx];
    let comment = Comment {
        id: next_id(now, post.comments.iter().map(|c| c.id.as_str())),
        author: user.name.clone(),
        author_email: user.email.clone(),
        text: text.to_string(),
    };

    let mut next = state.clone();
    next.posts[idx].comments.push(comment);
    Ok(next)
}

fn owned_comment_index(state: &AppState, post_id: &str, comment_id: &str) -> Result<(usize, usize), ApiError> {
    let user = active_user(state)?;
    let idx = post_index(state, post_id)?;
    let cidx = state.posts[idx]
        .comments
        .iter()
        .position(|c| c.id == comment_id)
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    if !state.posts[idx].comments[cidx].is_owned_by(user) {
        return Err(ApiError::Forbidden);
    }
    Ok((idx, cidx))
}

pub fn edit_comment(state: &AppState, post_id: &str, comment_id: &str, text: &str) -> Result<AppState, ApiError> {
    let (idx, cidx) = owned_comment_index(state, post_id, comment_id)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
    }
    check_length(text)?;

    let mut next = state.clone();
    next.posts[idx].comments[cidx].text = text.to_string();
    Ok(next)
}

pub fn delete_comment(state: &AppState, post_id: &str, comment_id: &str) -> Result<AppState, ApiError> {
    let (idx, cidx) = owned_comment_index(state, post_id, comment_id)?;

    let mut next = state.clone();
    next.posts[idx].comments.remove(cidx);
    Ok(next)
}

// === HTTP Handlers ===

/// Runs one mutation: load, apply, persist the full post list, redirect back
/// to the feed. Rejections re-render the page instead.
fn apply<F>(store: &dyn KeyValue, req: &Request, action: &str, op: F) -> anyhow::Result<Response>
where
    F: FnOnce(&AppState, &std::collections::HashMap<String, String>) -> Result<AppState, ApiError>,
{
    let view = feed_view(&parse_query_params(req.uri()));
    let form = parse_form(req.body());
    let state = load_state(store)?;

    match op(&state, &form) {
        Ok(next) => {
            save_posts(store, &next.posts)?;
            debug!("{} applied, {} posts stored", action, next.posts.len());
            Ok(redirect(&view_location(&view)))
        }
        Err(err) => rejected(&state, &view, err),
    }
}

fn rejected(state: &AppState, view: &FeedView, err: ApiError) -> anyhow::Result<Response> {
    info!("rejected: {}", err);
    match err {
        ApiError::BadRequest(msg) => {
            let notice = Notice { alert: Some(msg), ..Notice::default() };
            Ok(html(400, render_page(state, view, &notice)?))
        }
        ApiError::Unauthorized => {
            let notice = Notice { alert: Some(err.message()), ..Notice::default() };
            Ok(html(401, render_page(state, view, &notice)?))
        }
        ApiError::InternalError(msg) => Err(anyhow::anyhow!(msg)),
        other => Ok(other.into()),
    }
}

pub fn handle_create_post(store: &dyn KeyValue, req: &Request) -> anyhow::Result<Response> {
    apply(store, req, "create_post", |state, form| {
        let text = get_string(form, "text", Some("")).unwrap_or_default();
        let image = get_string(form, "image", Some("")).unwrap_or_default();
        create_post(state, &text, &image, Utc::now())
    })
}

pub fn handle_toggle_like(store: &dyn KeyValue, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    apply(store, req, "toggle_like", |state, _| toggle_like(state, post_id))
}

pub fn handle_delete_post(store: &dyn KeyValue, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    apply(store, req, "delete_post", |state, _| delete_post(state, post_id))
}

pub fn handle_edit_post(store: &dyn KeyValue, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    apply(store, req, "edit_post", |state, form| {
        let text = get_string(form, "text", Some("")).unwrap_or_default();
        edit_post(state, post_id, &text)
    })
}

pub fn handle_add_comment(store: &dyn KeyValue, req: &Request, post_id: &str) -> anyhow::Result<Response> {
    apply(store, req, "add_comment", |state, form| {
        let text = get_string(form, "text", Some("")).unwrap_or_default();
        add_comment(state, post_id, &text, Utc::now())
    })
}

pub fn handle_edit_comment(store: &dyn KeyValue, req: &Request, post_id: &str, comment_id: &str) -> anyhow::Result<Response> {
    apply(store, req, "edit_comment", |state, form| {
        let text = get_string(form, "text", Some("")).unwrap_or_default();
        edit_comment(state, post_id, comment_id, &text)
    })
}

pub fn handle_delete_comment(store: &dyn KeyValue, req: &Request, post_id: &str, comment_id: &str) -> anyhow::Result<Response> {
    apply(store, req, "delete_comment", |state, _| delete_comment(state, post_id, comment_id))
}
