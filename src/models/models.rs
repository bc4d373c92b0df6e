use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub author_email: String,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub author_email: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.author_email == user.email
    }

    pub fn is_liked_by(&self, email: &str) -> bool {
        self.liked_by.iter().any(|e| e == email)
    }
}

impl Comment {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.author_email == user.email
    }
}

/// Ownership filter chip above the feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Mine,
}

impl Filter {
    pub fn parse(value: &str) -> Filter {
        match value {
            "mine" => Filter::Mine,
            _ => Filter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Mine => "mine",
        }
    }
}

/// Everything persisted in the store, loaded once per request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub current_user: Option<User>,
    pub posts: Vec<Post>,
    pub dark: bool,
}

/// Transient view parameters carried in the page URL.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedView {
    pub filter: Filter,
    pub search: String,
    pub editing: Option<String>,
    pub editing_comment: Option<String>,
}
