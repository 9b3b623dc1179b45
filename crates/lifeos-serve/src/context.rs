use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::AppState;

pub const WORKSPACE_HEADER: &str = "x-workspace-id";

/// Workspace a request acts on: the trimmed `x-workspace-id` header, else the
/// server default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Workspace(pub String);

impl FromRequestParts<Arc<AppState>> for Workspace {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(WORKSPACE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        Ok(Workspace(
            from_header
                .unwrap_or(state.default_workspace.as_str())
                .to_string(),
        ))
    }
}
