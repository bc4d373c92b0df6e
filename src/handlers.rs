use log::{debug, error};
use spin_sdk::http::{Request, Response};

use crate::auth::{handle_login, handle_logout, handle_signup};
use crate::core::db::{load_dark_mode, load_state, save_dark_mode};
use crate::core::errors::ApiError;
use crate::core::helpers::{html, redirect};
use crate::core::kv::KeyValue;
use crate::core::query_params::{feed_view, get_string, parse_query_params, view_location};
use crate::core::static_server::serve_static;
use crate::models::models::{FeedView, Filter};
use crate::posts::{
    handle_add_comment, handle_create_post, handle_delete_comment, handle_delete_post,
    handle_edit_comment, handle_edit_post, handle_toggle_like,
};
use crate::templates::{render_page, Notice};

/// Dispatches one request against `store`. Unexpected failures are logged
/// and turned into a 500 page.
pub fn route(store: &dyn KeyValue, req: Request) -> Response {
    let method = req.method().to_string();
    let path = req.path().to_string();
    debug!("{} {}", method, path);

    match dispatch(store, &req, &method, &path) {
        Ok(resp) => resp,
        Err(e) => {
            error!("{} {} failed: {:#}", method, path, e);
            ApiError::InternalError("Something went wrong".to_string()).into()
        }
    }
}

fn dispatch(store: &dyn KeyValue, req: &Request, method: &str, path: &str) -> anyhow::Result<Response> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method.to_uppercase().as_str(), segments.as_slice()) {
        ("GET", [""]) | ("GET", ["index.html"]) => render_index(store, req),
        ("POST", ["signup"]) => handle_signup(store, req),
        ("POST", ["login"]) => handle_login(store, req),
        ("POST", ["logout"]) => handle_logout(store),
        ("POST", ["theme"]) => toggle_theme(store, req),
        ("POST", ["posts"]) => handle_create_post(store, req),
        ("POST", ["posts", id, "like"]) => handle_toggle_like(store, req, &decode(id)),
        ("POST", ["posts", id, "edit"]) => handle_edit_post(store, req, &decode(id)),
        ("POST", ["posts", id, "delete"]) => handle_delete_post(store, req, &decode(id)),
        ("POST", ["posts", id, "comments"]) => handle_add_comment(store, req, &decode(id)),
        ("POST", ["posts", id, "comments", cid, "edit"]) => {
            handle_edit_comment(store, req, &decode(id), &decode(cid))
        }
        ("POST", ["posts", id, "comments", cid, "delete"]) => {
            handle_delete_comment(store, req, &decode(id), &decode(cid))
        }
        ("GET", ["home"]) => Ok(redirect(&view_location(&FeedView::default()))),
        ("GET", ["my-posts"]) => Ok(redirect(&view_location(&FeedView {
            filter: Filter::Mine,
            ..FeedView::default()
        }))),
        ("GET", ["notifications"]) => show_notifications(store),
        ("GET", ["profile"]) => show_profile(store),
        ("GET", ["static", ..]) => serve_static(path),
        _ => Ok(ApiError::NotFound("No route found".to_string()).into()),
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn render_index(store: &dyn KeyValue, req: &Request) -> anyhow::Result<Response> {
    let params = parse_query_params(req.uri());
    let state = load_state(store)?;
    let notice = Notice {
        signup: get_string(&params, "auth", None).as_deref() == Some("signup"),
        ..Notice::default()
    };
    Ok(html(200, render_page(&state, &feed_view(&params), &notice)?))
}

fn toggle_theme(store: &dyn KeyValue, req: &Request) -> anyhow::Result<Response> {
    let dark = load_dark_mode(store).unwrap_or(false);
    save_dark_mode(store, !dark)?;
    let view = feed_view(&parse_query_params(req.uri()));
    Ok(redirect(&view_location(&view)))
}

fn show_notifications(store: &dyn KeyValue) -> anyhow::Result<Response> {
    let state = load_state(store)?;
    let notice = Notice::alert("No notifications yet!");
    Ok(html(200, render_page(&state, &FeedView::default(), &notice)?))
}

fn show_profile(store: &dyn KeyValue) -> anyhow::Result<Response> {
    let state = load_state(store)?;
    let user = match &state.current_user {
        Some(u) => u,
        None => return Ok(redirect("/")),
    };
    let notice = Notice::alert(&format!("Profile\nName: {}\nEmail: {}", user.name, user.email));
    Ok(html(200, render_page(&state, &FeedView::default(), &notice)?))
}
