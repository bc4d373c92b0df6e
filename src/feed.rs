//! Feed rendering.
//!
//! The feed is a pure function of the post list, the view (filter, search,
//! edit target) and the active user. Every call rebuilds the whole card list;
//! at this scale there is nothing to gain from diffing.

use std::collections::HashSet;

use ammonia::Builder;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::core::helpers::time_ago;
use crate::core::query_params::view_location;
use crate::models::models::{Comment, FeedView, Filter, Post, User};

/// Posts the active user should see, in stored (newest-first) order.
pub fn visible_posts<'a>(posts: &'a [Post], view: &FeedView, user: Option<&User>) -> Vec<&'a Post> {
    let query = view.search.trim().to_lowercase();
    posts
        .iter()
        .filter(|p| match (view.filter, user) {
            (Filter::Mine, Some(u)) => p.author_email == u.email,
            (Filter::Mine, None) => false,
            (Filter::All, _) => true,
        })
        .filter(|p| {
            query.is_empty()
                || p.text.to_lowercase().contains(&query)
                || p.author.to_lowercase().contains(&query)
        })
        .collect()
}

pub fn render_feed(posts: &[Post], view: &FeedView, user: &User, now: DateTime<Utc>) -> String {
    let list = visible_posts(posts, view, Some(user));
    if list.is_empty() {
        return r#"<div class="text-center text-muted py-4">No posts to show.</div>"#.to_string();
    }
    list.iter()
        .map(|post| render_post_card(post, view, user, now))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn avatar_initial(author: &str) -> String {
    author
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "U".to_string())
}

/// `<img>` markup for a post image; anything but http(s) is dropped.
fn render_image(url: &str) -> String {
    let mut schemes = HashSet::new();
    schemes.insert("http");
    schemes.insert("https");
    let tag = format!(
        r#"<img src="{}" alt="Post Image" class="img-fluid rounded mt-2">"#,
        attr(url)
    );
    Builder::default()
        .url_schemes(schemes)
        .add_tag_attributes("img", &["class"])
        .url_relative(ammonia::UrlRelative::Deny)
        .clean(&tag)
        .to_string()
}

/// Form action under `path` that returns to the same filter and search.
fn action(path: &str, view: &FeedView) -> String {
    let back = view_location(view);
    let query = back.trim_start_matches("/?");
    attr(&format!("{}?{}", path, query)).to_string()
}

fn render_post_card(post: &Post, view: &FeedView, user: &User, now: DateTime<Utc>) -> String {
    let owner = post.is_owned_by(user);
    let base = format!("/posts/{}", urlencoding::encode(&post.id));

    let owner_buttons = if owner {
        let edit_href = format!("{}&edit={}", view_location(view), urlencoding::encode(&post.id));
        format!(
            r#"<a class="edit-btn" href="{}">Edit</a>
            <form method="post" action="{}" class="inline" onsubmit="return confirm('Delete this post?')">
              <button class="delete-btn">Delete</button>
            </form>"#,
            attr(&edit_href),
            action(&format!("{}/delete", base), view),
        )
    } else {
        String::new()
    };

    let image = post.image.as_deref().map(render_image).unwrap_or_default();

    let comments = post
        .comments
        .iter()
        .map(|c| render_comment(post, c, view, user))
        .collect::<Vec<_>>()
        .join("");

    format!(
        r#"<div class="post-card" id="post-{id}">
  <div class="d-flex justify-content-between align-items-start">
    <div class="post-author">
      <div class="avatar">{initial}</div>
      <div>
        <div><strong>{author}</strong></div>
        <div class="post-meta">{ago}</div>
      </div>
    </div>
    <div class="post-btns">{owner_buttons}</div>
  </div>
  <div class="post-text mt-2">{body}</div>
  {image}
  <div class="post-actions">
    <form method="post" action="{like_action}" class="inline">
      <button class="like-btn{liked}">❤ <span class="like-count">{likes}</span></button>
    </form>
  </div>
  <div class="comments mt-2">
    {comments}
    <details class="add-comment"{open}>
      <summary class="comment-btn btn btn-sm btn-light">💬 Comment</summary>
      <form method="post" action="{comment_action}">
        <input type="text" name="text" class="form-control form-control-sm comment-input mb-1" placeholder="Write a comment">
        <button class="btn btn-primary btn-sm submit-comment">Post</button>
      </form>
    </details>
  </div>
</div>"#,
        id = attr(&post.id),
        initial = text(&avatar_initial(&post.author)),
        author = text(&post.author),
        ago = time_ago(&post.created_at, now),
        owner_buttons = owner_buttons,
        body = text(&post.text),
        image = image,
        like_action = action(&format!("{}/like", base), view),
        liked = if post.is_liked_by(&user.email) { " liked" } else { "" },
        likes = post.likes,
        comments = comments,
        open = if view.editing.as_deref() == Some(post.id.as_str()) { " open" } else { "" },
        comment_action = action(&format!("{}/comments", base), view),
    )
}

fn render_comment(post: &Post, comment: &Comment, view: &FeedView, user: &User) -> String {
    let base = format!(
        "/posts/{}/comments/{}",
        urlencoding::encode(&post.id),
        urlencoding::encode(&comment.id)
    );
    let editing = view.editing.as_deref() == Some(post.id.as_str())
        && view.editing_comment.as_deref() == Some(comment.id.as_str());

    let controls = if !comment.is_owned_by(user) {
        String::new()
    } else if editing {
        format!(
            r#"<form method="post" action="{}" class="edit-comment-form">
              <input type="text" name="text" value="{}" class="form-control form-control-sm">
              <button class="btn btn-sm btn-primary">Save</button>
              <a class="btn btn-sm btn-light" href="{}">Cancel</a>
            </form>"#,
            action(&format!("{}/edit", base), view),
            attr(&comment.text),
            attr(&view_location(view)),
        )
    } else {
        let edit_href = format!(
            "{}&edit={}&comment={}",
            view_location(view),
            urlencoding::encode(&post.id),
            urlencoding::encode(&comment.id)
        );
        format!(
            r#"<a class="edit-comment btn btn-sm btn-outline-secondary" href="{}">Edit</a>
            <form method="post" action="{}" class="inline">
              <button class="delete-comment btn btn-sm btn-outline-danger">Delete</button>
            </form>"#,
            attr(&edit_href),
            action(&format!("{}/delete", base), view),
        )
    };

    format!(
        r#"<div class="comment" data-comment-id="{}">
      <div><strong>{}:</strong> {}</div>
      <div>{}</div>
    </div>"#,
        attr(&comment.id),
        text(&comment.author),
        text(&comment.text),
        controls
    )
}
