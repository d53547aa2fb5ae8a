//! The single static document and the not-found fallback.
//!
//! Both handlers also accept WebSocket upgrades, so clients can open the
//! relay socket on any path, the page itself included.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use relay_core::config::StaticPageConfig;
use relay_core::error::{AppError, ErrorKind};
use relay_core::result::AppResult;

use crate::error::ApiError;
use crate::handlers::ws;
use crate::state::AppState;

const BUILTIN_INDEX: &str = include_str!("../../public/index.html");

/// Fixed HTML document, loaded once at startup.
#[derive(Debug, Clone)]
pub struct StaticPage {
    html: Arc<str>,
}

impl StaticPage {
    /// The page compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_html(BUILTIN_INDEX)
    }

    pub fn from_html(html: impl Into<Arc<str>>) -> Self {
        Self { html: html.into() }
    }

    /// Loads the configured override, or the built-in page when none is set.
    pub async fn load(config: &StaticPageConfig) -> AppResult<Self> {
        let Some(path) = config.index_file.as_deref() else {
            return Ok(Self::builtin());
        };

        let html = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to read static page '{path}': {e}"),
                e,
            )
        })?;
        tracing::info!(path = %path, "Loaded static page override");
        Ok(Self::from_html(html))
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// `/` and `/index.html`: WebSocket upgrade, or the page.
pub async fn index(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    match upgrade {
        Ok(upgrade) => ws::accept(state, upgrade),
        Err(_) => Ok(Html(state.page.html().to_owned()).into_response()),
    }
}

/// Every other path: WebSocket upgrade, or 404.
pub async fn fallback(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    match upgrade {
        Ok(upgrade) => ws::accept(state, upgrade),
        Err(_) => Ok((StatusCode::NOT_FOUND, "Not Found").into_response()),
    }
}
