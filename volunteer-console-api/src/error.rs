use core::time::Duration;

use http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("hyper {0}")]
    Hyper(#[from] hyper::Error),
    #[error("hyper http {0}")]
    HyperHttp(#[from] http::Error),
    #[error("io {0}")]
    Io(#[from] std::io::Error),
    #[error("json {0}")]
    Json(#[from] serde_json::Error),
    #[error("query string {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
    #[error("invalid api url {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),
    #[error("api url has no host")]
    MissingHost,
    #[error("invalid tls server name {0}")]
    InvalidServerName(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("session expired")]
    Unauthorized,
    #[error("not signed in")]
    NotAuthenticated,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = core::result::Result<T, ApiError>;
