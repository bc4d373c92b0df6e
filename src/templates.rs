use chrono::Utc;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use rust_embed::RustEmbed;

use crate::core::query_params::view_location;
use crate::feed::render_feed;
use crate::models::models::{AppState, FeedView, Filter, User};

#[derive(RustEmbed)]
#[folder = "static"]
struct Assets;

/// Feedback shown on the re-rendered page after a rejected action.
#[derive(Debug, Default)]
pub struct Notice {
    pub alert: Option<String>,
    pub field_error: Option<(&'static str, String)>,
    pub signup: bool,
}

impl Notice {
    pub fn alert(message: &str) -> Self {
        Notice { alert: Some(message.to_string()), ..Notice::default() }
    }

    fn error_for(&self, field: &str) -> String {
        match &self.field_error {
            Some((f, msg)) if *f == field => {
                format!(r#"<div id="{}" class="validation">{}</div>"#, field, text(msg))
            }
            _ => format!(r#"<div id="{}" class="validation d-none"></div>"#, field),
        }
    }
}

pub fn render_page(state: &AppState, view: &FeedView, notice: &Notice) -> anyhow::Result<String> {
    let template = Assets::get("index.html")
        .ok_or_else(|| anyhow::anyhow!("Page template not found"))?
        .data
        .to_vec();
    let mut html = String::from_utf8(template)?;

    let content = match &state.current_user {
        Some(user) => render_app(state, user, view, notice),
        None => render_auth(notice),
    };

    html = html.replace("PAGE_THEME", if state.dark { "dark" } else { "" });
    html = html.replace("PAGE_CONTENT", &content);
    Ok(html)
}

fn render_alert(notice: &Notice) -> String {
    notice
        .alert
        .as_ref()
        .map(|msg| format!(r#"<div class="alert" role="alert">{}</div>"#, text(msg)))
        .unwrap_or_default()
}

fn render_auth(notice: &Notice) -> String {
    let (login_hidden, signup_hidden) = if notice.signup { ("d-none", "") } else { ("", "d-none") };
    format!(
        r#"<section id="auth-screen">
  {alert}
  <div class="auth-switch">
    <a id="show-login" class="{login_active}" href="/?auth=login">Login</a>
    <a id="show-signup" class="{signup_active}" href="/?auth=signup">Sign up</a>
  </div>
  <form id="login-form" class="{login_hidden}" method="post" action="/login">
    <input id="login-email" name="email" type="email" placeholder="Email">
    <input id="login-password" name="password" type="password" placeholder="Password">
    {login_error}
    <button class="btn btn-primary">Login</button>
  </form>
  <form id="signup-form" class="{signup_hidden}" method="post" action="/signup">
    <input id="signup-name" name="name" placeholder="Name">
    {name_error}
    <input id="signup-email" name="email" type="email" placeholder="Email">
    {email_error}
    <input id="signup-password" name="password" type="password" placeholder="Password">
    {pass_error}
    <button class="btn btn-primary">Sign up</button>
  </form>
</section>"#,
        alert = render_alert(notice),
        login_active = if notice.signup { "" } else { "active" },
        signup_active = if notice.signup { "active" } else { "" },
        login_hidden = login_hidden,
        signup_hidden = signup_hidden,
        login_error = notice.error_for("login-error"),
        name_error = notice.error_for("signup-name-err"),
        email_error = notice.error_for("signup-email-err"),
        pass_error = notice.error_for("signup-pass-err"),
    )
}

fn render_app(state: &AppState, user: &User, view: &FeedView, notice: &Notice) -> String {
    let chip = |filter: Filter, label: &str| {
        let target = FeedView { filter, ..view.clone() };
        format!(
            r#"<a class="filter-chip{}" data-filter="{}" href="{}">{}</a>"#,
            if view.filter == filter { " active" } else { "" },
            filter.as_str(),
            attr(&view_location(&target)),
            label
        )
    };

    format!(
        r#"<section id="app">
  <nav class="navbar">
    <a id="nav-home" href="/home">Home</a>
    <a id="nav-myposts" href="/my-posts">My posts</a>
    <a id="nav-notifications" href="/notifications">Notifications</a>
    <a id="nav-profile" href="/profile">Profile</a>
    <span id="welcome-user" class="user-badge">Welcome, {name}</span>
    <form method="post" action="{theme_action}" class="inline">
      <button id="toggle-theme">{theme_label}</button>
    </form>
    <form method="post" action="/logout" class="inline">
      <button id="logout">Logout</button>
    </form>
  </nav>
  {alert}
  <form class="composer" method="post" action="{post_action}">
    <textarea id="post-text" name="text" placeholder="What's on your mind?"></textarea>
    <input id="post-image" name="image" placeholder="Image URL (optional)">
    <div class="emojis">
      <button type="button" class="emoji-btn" data-emoji="😀">😀</button>
      <button type="button" class="emoji-btn" data-emoji="🎉">🎉</button>
      <button type="button" class="emoji-btn" data-emoji="❤️">❤️</button>
      <button type="button" class="emoji-btn" data-emoji="👍">👍</button>
    </div>
    <button id="post-btn" class="btn btn-primary">Post</button>
    <button id="clear-btn" type="reset" class="btn btn-light">Clear</button>
  </form>
  <form class="search" method="get" action="/">
    <input type="hidden" name="filter" value="{filter}">
    <input id="search" name="q" value="{search}" placeholder="Search posts">
  </form>
  <div class="filters">{all_chip}{mine_chip}</div>
  <div id="feed">{feed}</div>
  {modal}
</section>"#,
        name = text(&user.name),
        theme_action = action_for("/theme", view),
        post_action = action_for("/posts", view),
        theme_label = if state.dark { "Light" } else { "Dark" },
        alert = render_alert(notice),
        filter = view.filter.as_str(),
        search = attr(&view.search),
        all_chip = chip(Filter::All, "All"),
        mine_chip = chip(Filter::Mine, "Mine"),
        feed = render_feed(&state.posts, view, user, Utc::now()),
        modal = render_edit_modal(state, user, view),
    )
}

/// Form action under `path` that redirects back to the same filter and search.
fn action_for(path: &str, view: &FeedView) -> String {
    let back = view_location(view);
    attr(&format!("{}{}", path, back.trim_start_matches('/'))).to_string()
}

/// Edit modal for the post named by `?edit=`, shown only to its owner.
fn render_edit_modal(state: &AppState, user: &User, view: &FeedView) -> String {
    if view.editing_comment.is_some() {
        return String::new();
    }
    let post = match view
        .editing
        .as_deref()
        .and_then(|id| state.posts.iter().find(|p| p.id == id))
    {
        Some(p) if p.is_owned_by(user) => p,
        _ => return String::new(),
    };
    let back = view_location(view);
    format!(
        r#"<div id="edit-modal" class="modal">
  <form method="post" action="/posts/{id}/edit{query}">
    <textarea id="edit-text" name="text" autofocus>{body}</textarea>
    <button id="save-edit" class="btn btn-primary">Save</button>
    <a id="cancel-edit" class="btn btn-light" href="{back}">Cancel</a>
  </form>
</div>"#,
        id = attr(&urlencoding::encode(&post.id)),
        query = attr(back.trim_start_matches('/')),
        body = text(&post.text),
        back = attr(&back),
    )
}
