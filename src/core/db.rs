use std::collections::HashSet;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::*;
use crate::core::errors::StoreError;
use crate::core::helpers::{next_id, now_iso};
use crate::core::kv::KeyValue;
use crate::models::models::{AppState, Post, User};

fn load_json<T: DeserializeOwned>(store: &dyn KeyValue, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Malformed { key: key.to_string(), reason: e.to_string() }),
        None => Ok(None),
    }
}

fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValue, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)
        .map_err(|source| StoreError::Serialize { key: key.to_string(), source })?;
    store.set(key, &raw)?;
    Ok(())
}

pub fn load_current_user(store: &dyn KeyValue) -> Result<Option<User>, StoreError> {
    load_json(store, CURRENT_USER_KEY)
}

/// Writes the active-user record, or deletes it when logging out.
pub fn save_current_user(store: &dyn KeyValue, user: Option<&User>) -> Result<(), StoreError> {
    match user {
        Some(u) => save_json(store, CURRENT_USER_KEY, u),
        None => Ok(store.delete(CURRENT_USER_KEY)?),
    }
}

pub fn load_users(store: &dyn KeyValue) -> Result<Vec<User>, StoreError> {
    Ok(load_json(store, USERS_KEY)?.unwrap_or_default())
}

pub fn save_users(store: &dyn KeyValue, users: &[User]) -> Result<(), StoreError> {
    save_json(store, USERS_KEY, users)
}

pub fn load_posts(store: &dyn KeyValue) -> Result<Vec<Post>, StoreError> {
    let posts: Vec<Post> = load_json(store, POSTS_KEY)?.unwrap_or_default();
    validate_posts(&posts).map_err(|reason| StoreError::Malformed { key: POSTS_KEY.to_string(), reason })?;
    Ok(posts)
}

pub fn save_posts(store: &dyn KeyValue, posts: &[Post]) -> Result<(), StoreError> {
    save_json(store, POSTS_KEY, posts)
}

pub fn load_dark_mode(store: &dyn KeyValue) -> Result<bool, StoreError> {
    match store.get(DARK_MODE_KEY)?.as_deref() {
        None | Some("0") => Ok(false),
        Some("1") => Ok(true),
        Some(other) => Err(StoreError::Malformed {
            key: DARK_MODE_KEY.to_string(),
            reason: format!("expected \"0\" or \"1\", found {:?}", other),
        }),
    }
}

pub fn save_dark_mode(store: &dyn KeyValue, dark: bool) -> Result<(), StoreError> {
    store.set(DARK_MODE_KEY, if dark { "1" } else { "0" })?;
    Ok(())
}

fn validate_posts(posts: &[Post]) -> Result<(), String> {
    let mut ids = HashSet::new();
    for post in posts {
        if !ids.insert(post.id.as_str()) {
            return Err(format!("duplicate post id {}", post.id));
        }
        if post.likes as usize != post.liked_by.len() {
            return Err(format!(
                "post {} has {} likes but {} liking users",
                post.id,
                post.likes,
                post.liked_by.len()
            ));
        }
    }
    Ok(())
}

/// Loads every record, falling back to the default for any key that is
/// malformed so one bad record does not lock the user out of the rest.
pub fn load_state(store: &dyn KeyValue) -> anyhow::Result<AppState> {
    Ok(AppState {
        current_user: or_default(CURRENT_USER_KEY, load_current_user(store))?,
        posts: or_default(POSTS_KEY, load_posts(store))?,
        dark: or_default(DARK_MODE_KEY, load_dark_mode(store))?,
    })
}

/// User list with a malformed record treated as empty, so signup can
/// replace it.
pub fn load_users_or_default(store: &dyn KeyValue) -> Result<Vec<User>, StoreError> {
    or_default(USERS_KEY, load_users(store))
}

fn or_default<T: Default>(key: &str, loaded: Result<T, StoreError>) -> Result<T, StoreError> {
    match loaded {
        Ok(value) => Ok(value),
        Err(StoreError::Malformed { reason, .. }) => {
            warn!("ignoring malformed record {}: {}", key, reason);
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

pub fn seed_demo_data(store: &dyn KeyValue) -> anyhow::Result<()> {
    let users = load_users_or_default(store)?;
    if !users.is_empty() {
        return Ok(());
    }

    let demo = User {
        name: "Demo".to_string(),
        email: "demo@example.com".to_string(),
        password: "demo123".to_string(),
    };
    save_users(store, std::slice::from_ref(&demo))?;

    let mut posts = or_default(POSTS_KEY, load_posts(store))?;
    let post = Post {
        id: next_id(chrono::Utc::now(), posts.iter().map(|p| p.id.as_str())),
        author: demo.name.clone(),
        author_email: demo.email.clone(),
        text: "Welcome to mini-social! Say hello 👋".to_string(),
        image: None,
        created_at: now_iso(),
        likes: 0,
        liked_by: Vec::new(),
        comments: Vec::new(),
    };
    posts.insert(0, post);
    save_posts(store, &posts)?;

    info!("seeded demo account {}", demo.email);
    Ok(())
}

pub fn reset_data(store: &dyn KeyValue) -> anyhow::Result<()> {
    for key in [CURRENT_USER_KEY, POSTS_KEY, DARK_MODE_KEY, USERS_KEY] {
        store.delete(key)?;
    }
    Ok(())
}
