use crate::state_actor::StateActorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use statusdeck::export::ExportError;
use std::{error::Error, fmt::Display};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    ProviderNotFound(String),
    StateActor(StateActorError),
    Export(ExportError),
}

impl From<StateActorError> for ApiError {
    fn from(value: StateActorError) -> Self {
        Self::StateActor(value)
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderNotFound(name) => write!(f, "Unknown service: {name}"),
            Self::StateActor(e) => e.fmt(f),
            Self::Export(e) => write!(f, "Could not build report: {e}"),
        }
    }
}

impl Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProviderNotFound(_) | Self::StateActor(StateActorError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::StateActor(StateActorError::Gone) | Self::Export(_) => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Values in `text` safe to embed in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_404() {
        let response = ApiError::ProviderNotFound("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn dead_actor_is_500() {
        let response = ApiError::from(StateActorError::Gone).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
