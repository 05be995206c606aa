//! Error type shared by the library and the HTTP layer.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::notes::html_escape;
use crate::templates::base_html;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Share or export invoked with nothing selected.
    #[error("Please select at least one paper")]
    EmptySelection,
    #[error("unknown paper: {0}")]
    UnknownPaper(String),
    #[error("no note editor is open")]
    NoEditorOpen,
    #[error("invalid page url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::EmptySelection | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::UnknownPaper(_) => StatusCode::NOT_FOUND,
            Error::NoEditorOpen => StatusCode::CONFLICT,
            Error::Storage(_) | Error::Json(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = format!(
            r#"<div class="warning" role="alert">{}</div><p><a href="/">Back to papers</a></p>"#,
            html_escape(&self.to_string())
        );
        (status, Html(base_html("Papers", &body, None))).into_response()
    }
}
