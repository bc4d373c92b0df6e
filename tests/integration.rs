use mini_social::config::{CURRENT_USER_KEY, POSTS_KEY, USERS_KEY};
use mini_social::core::db::{load_posts, load_users};
use mini_social::core::kv::{KeyValue, MemoryStore};
use mini_social::handlers::route;
use spin_sdk::http::{Method, Request, Response};

fn get(store: &MemoryStore, uri: &str) -> Response {
    let req = Request::builder().method(Method::Get).uri(uri).body(Vec::new()).build();
    route(store, req)
}

fn post(store: &MemoryStore, uri: &str, form: &str) -> Response {
    let req = Request::builder()
        .method(Method::Post)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(form.as_bytes().to_vec())
        .build();
    route(store, req)
}

fn status(resp: &Response) -> u16 {
    *resp.status()
}

fn body(resp: &Response) -> String {
    String::from_utf8_lossy(resp.body()).to_string()
}

fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .find(|(name, _)| name.eq_ignore_ascii_case("location"))
        .and_then(|(_, value)| value.as_str().map(str::to_string))
}

fn unique_email() -> String {
    format!("user_{}@example.com", uuid::Uuid::new_v4().simple())
}

fn signup(store: &MemoryStore, name: &str, email: &str) {
    let resp = post(store, "/signup", &format!("name={}&email={}&password=secret1", name, email));
    assert_eq!(status(&resp), 303, "signup failed: {}", body(&resp));
}

#[test]
fn test_full_user_flow() {
    let store = MemoryStore::new();
    let email = unique_email();

    // 1. Signup logs the user in
    signup(&store, "Ann", &email);
    let page = body(&get(&store, "/"));
    assert!(page.contains("Welcome, Ann"));

    // 2. Create post
    let resp = post(&store, "/posts?filter=all", "text=hello+world&image=");
    assert_eq!(status(&resp), 303);
    assert_eq!(location(&resp).as_deref(), Some("/?filter=all"));
    let posts = load_posts(&store).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "hello world");
    assert_eq!(posts[0].author_email, email);
    let id = posts[0].id.clone();

    // 3. Like, then unlike
    post(&store, &format!("/posts/{}/like", id), "");
    assert_eq!(load_posts(&store).unwrap()[0].likes, 1);
    post(&store, &format!("/posts/{}/like", id), "");
    assert_eq!(load_posts(&store).unwrap()[0].likes, 0);

    // 4. Edit post
    let resp = post(&store, &format!("/posts/{}/edit?filter=mine", id), "text=updated");
    assert_eq!(location(&resp).as_deref(), Some("/?filter=mine"));
    assert_eq!(load_posts(&store).unwrap()[0].text, "updated");

    // 5. Comment, edit comment, delete comment
    post(&store, &format!("/posts/{}/comments", id), "text=first%21");
    let cid = load_posts(&store).unwrap()[0].comments[0].id.clone();
    post(&store, &format!("/posts/{}/comments/{}/edit", id, cid), "text=second");
    assert_eq!(load_posts(&store).unwrap()[0].comments[0].text, "second");
    post(&store, &format!("/posts/{}/comments/{}/delete", id, cid), "");
    assert!(load_posts(&store).unwrap()[0].comments.is_empty());

    // 6. Delete post
    post(&store, &format!("/posts/{}/delete", id), "");
    assert!(load_posts(&store).unwrap().is_empty());

    // 7. Logout keeps the account
    let resp = post(&store, "/logout", "");
    assert_eq!(status(&resp), 303);
    assert_eq!(store.get(CURRENT_USER_KEY).unwrap(), None);
    assert_eq!(load_users(&store).unwrap().len(), 1);
    assert!(body(&get(&store, "/")).contains("id=\"auth-screen\""));
}

#[test]
fn test_login_round_trip() {
    let store = MemoryStore::new();
    let email = unique_email();
    signup(&store, "Ann", &email);
    post(&store, "/logout", "");

    let resp = post(&store, "/login", &format!("email={}&password=wrong123", email));
    assert_eq!(status(&resp), 400);
    assert!(body(&resp).contains("Invalid credentials"));

    let resp = post(&store, "/login", &format!("email={}&password=secret1", email.to_uppercase()));
    assert_eq!(status(&resp), 303);
    assert!(body(&get(&store, "/")).contains("Welcome, Ann"));
}

#[test]
fn test_login_without_accounts() {
    let store = MemoryStore::new();
    let resp = post(&store, "/login", "email=a%40b.io&password=secret1");
    assert_eq!(status(&resp), 400);
    assert!(body(&resp).contains("No account found. Please signup."));
}

#[test]
fn test_duplicate_signup_rejected() {
    let store = MemoryStore::new();
    let email = unique_email();
    signup(&store, "Ann", &email);

    let resp = post(
        &store,
        "/signup",
        &format!("name=Other&email={}&password=secret1", email.to_uppercase()),
    );
    assert_eq!(status(&resp), 400);
    let page = body(&resp);
    assert!(page.contains("id=\"auth-screen\""));
    assert!(page.contains("Email already registered"));
    assert_eq!(load_users(&store).unwrap().len(), 1);
}

#[test]
fn test_failed_login_over_existing_session_shows_error() {
    let store = MemoryStore::new();
    let email = unique_email();
    signup(&store, "Ann", &email);

    let resp = post(&store, "/login", &format!("email={}&password=wrong123", email));
    assert_eq!(status(&resp), 400);
    let page = body(&resp);
    assert!(page.contains("id=\"login-form\" class=\"\""));
    assert!(page.contains("Invalid credentials"));
    assert!(!page.contains("id=\"app\""));
}

#[test]
fn test_corrupt_user_list_does_not_block_auth() {
    let store = MemoryStore::new();
    store.set(USERS_KEY, "{garbage").unwrap();

    let resp = post(&store, "/login", "email=a%40b.io&password=secret1");
    assert_eq!(status(&resp), 400);
    assert!(body(&resp).contains("No account found. Please signup."));

    signup(&store, "Ann", &unique_email());
    assert_eq!(load_users(&store).unwrap().len(), 1);
}

#[test]
fn test_comments_visible_and_editable_in_page() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());
    post(&store, "/posts", "text=hello");
    let id = load_posts(&store).unwrap()[0].id.clone();
    post(&store, &format!("/posts/{}/comments", id), "text=visible+comment");
    let cid = load_posts(&store).unwrap()[0].comments[0].id.clone();

    let page = body(&get(&store, "/"));
    let comment_at = page.find("visible comment").expect("comment rendered");
    assert!(comment_at < page.find("<details").expect("comment box rendered"));

    let page = body(&get(&store, &format!("/?filter=all&edit={}&comment={}", id, cid)));
    let form_at = page.find("edit-comment-form").expect("edit form rendered");
    assert!(form_at < page.find("<details").expect("comment box rendered"));
}

#[test]
fn test_create_post_keeps_search() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());
    let page = body(&get(&store, "/?filter=mine&q=hello"));
    assert!(page.contains("action=\"/posts?filter=mine&amp;q=hello\""));

    let resp = post(&store, "/posts?filter=mine&q=hello", "text=hello+again");
    assert_eq!(location(&resp).as_deref(), Some("/?filter=mine&q=hello"));
    let resp = post(&store, "/theme?filter=mine&q=hello", "");
    assert_eq!(location(&resp).as_deref(), Some("/?filter=mine&q=hello"));
}

#[test]
fn test_post_content_validation() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());

    let resp = post(&store, "/posts", "text=+++&image=");
    assert_eq!(status(&resp), 400);
    assert!(body(&resp).contains("Write something or add an image"));

    let long_content = "a".repeat(5001);
    let resp = post(&store, "/posts", &format!("text={}", long_content));
    assert_eq!(status(&resp), 400);
    assert!(load_posts(&store).unwrap().is_empty());
}

#[test]
fn test_create_post_requires_login() {
    let store = MemoryStore::new();
    let resp = post(&store, "/posts", "text=hi");
    assert_eq!(status(&resp), 401);
    assert!(body(&resp).contains("Login required"));
    assert!(load_posts(&store).unwrap().is_empty());
}

#[test]
fn test_other_users_cannot_edit() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());
    post(&store, "/posts", "text=ann+post");
    let id = load_posts(&store).unwrap()[0].id.clone();
    post(&store, &format!("/posts/{}/comments", id), "text=ann+comment");
    let cid = load_posts(&store).unwrap()[0].comments[0].id.clone();
    post(&store, "/logout", "");

    signup(&store, "Bob", &unique_email());
    let page = body(&get(&store, "/"));
    assert!(!page.contains("class=\"edit-btn\""));
    assert!(!page.contains(&format!("comment={}", cid)));

    let resp = post(&store, &format!("/posts/{}/edit", id), "text=hijack");
    assert_eq!(status(&resp), 403);
    let resp = post(&store, &format!("/posts/{}/comments/{}/edit", id, cid), "text=hijack");
    assert_eq!(status(&resp), 403);
    let resp = post(&store, &format!("/posts/{}/delete", id), "");
    assert_eq!(status(&resp), 403);

    let posts = load_posts(&store).unwrap();
    assert_eq!(posts[0].text, "ann post");
    assert_eq!(posts[0].comments[0].text, "ann comment");

    // Anyone may like
    post(&store, &format!("/posts/{}/like", id), "");
    assert_eq!(load_posts(&store).unwrap()[0].likes, 1);
}

#[test]
fn test_filter_and_search() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());
    post(&store, "/posts", "text=hello+world");
    post(&store, "/logout", "");
    signup(&store, "Bob", &unique_email());
    post(&store, "/posts", "text=bye");

    let page = body(&get(&store, "/?filter=all&q=hel"));
    assert!(page.contains("hello world"));
    assert!(!page.contains(">bye<"));

    let page = body(&get(&store, "/?filter=mine"));
    assert!(page.contains(">bye<"));
    assert!(!page.contains("hello world"));

    let page = body(&get(&store, "/?filter=mine&q=hello"));
    assert!(page.contains("No posts to show."));
}

#[test]
fn test_unknown_post_is_not_found() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());
    assert_eq!(status(&post(&store, "/posts/404/like", "")), 404);
    assert_eq!(status(&get(&store, "/nowhere")), 404);
}

#[test]
fn test_theme_toggle_and_nav() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());

    post(&store, "/theme", "");
    let page = body(&get(&store, "/"));
    assert!(page.contains("class=\"dark\""));
    post(&store, "/theme", "");
    assert!(!body(&get(&store, "/")).contains("class=\"dark\""));

    assert_eq!(location(&get(&store, "/my-posts")).as_deref(), Some("/?filter=mine"));
    assert_eq!(location(&get(&store, "/home")).as_deref(), Some("/?filter=all"));
    assert!(body(&get(&store, "/notifications")).contains("No notifications yet!"));
    assert!(body(&get(&store, "/profile")).contains("Name: Ann"));
}

#[test]
fn test_corrupt_posts_fall_back_to_empty_feed() {
    let store = MemoryStore::new();
    signup(&store, "Ann", &unique_email());
    store.set(POSTS_KEY, "[{\"broken\":").unwrap();

    let resp = get(&store, "/");
    assert_eq!(status(&resp), 200);
    assert!(body(&resp).contains("No posts to show."));
}

#[test]
fn test_static_assets() {
    let store = MemoryStore::new();
    let resp = get(&store, "/static/style.css");
    assert_eq!(status(&resp), 200);
    assert!(body(&resp).contains(".post-card"));
    assert_eq!(status(&get(&store, "/static/missing.js")), 404);
}
