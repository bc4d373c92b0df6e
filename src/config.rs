// === Store keys ===
pub const CURRENT_USER_KEY: &str = "mini_social_user";
pub const POSTS_KEY: &str = "mini_social_posts";
pub const DARK_MODE_KEY: &str = "mini_social_dark";
pub const USERS_KEY: &str = "mini_social_users";

// === Validation limits ===
pub const MIN_NAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn bind_address() -> String {
    std::env::var("MINI_SOCIAL_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

pub fn seed_demo_data() -> bool {
    std::env::var("MINI_SOCIAL_SEED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn max_post_length() -> usize {
    std::env::var("MINI_SOCIAL_MAX_POST_LENGTH")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(5000)
}
