use http::StatusCode;
use spin_sdk::http::Response;
use std::fmt;

#[derive(Debug, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user in the alert banner.
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalError(msg) => msg.clone(),
            ApiError::Unauthorized => "Login required".to_string(),
            ApiError::Forbidden => "You can only change your own posts and comments".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        let body = format!(
            r#"<!doctype html><html><body><p class="error">{}</p><a href="/">Back</a></body></html>"#,
            html_escape::encode_text(&err.message())
        );
        Response::builder()
            .status(err.status().as_u16())
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body.into_bytes())
            .build()
    }
}

impl std::error::Error for ApiError {}

/// Failures reading or writing one persisted record.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("malformed record under `{key}`: {reason}")]
    Malformed { key: String, reason: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    #[error("could not serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A rejected signup or login, tied to the inline error slot it renders in.
#[derive(Debug, PartialEq)]
pub enum AuthError {
    Field { field: &'static str, message: String },
    Internal(String),
}

impl AuthError {
    pub fn field(field: &'static str, message: &str) -> Self {
        AuthError::Field { field, message: message.to_string() }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Field { field, message } => write!(f, "{}: {}", field, message),
            AuthError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
