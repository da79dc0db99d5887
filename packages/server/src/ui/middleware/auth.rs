//! Authentication middleware.
//!
//! `Authorization: Bearer <token>` ヘッダー、または `access_token` クエリパラメータ
//! （ブラウザの WebSocket はヘッダーを付けられない）から資格情報を取り出し、
//! 解決した [`Identity`](crate::domain::Identity) をリクエストの extension に入れる。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    domain::{AuthError, IdentityResolver},
    infrastructure::dto::http::ErrorResponse,
};

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

fn query_token(request: &Request) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()?
        .0
        .access_token
}

fn unauthorized(error: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

pub async fn authenticate(
    State(resolver): State<Arc<dyn IdentityResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(credential) = bearer_token(request.headers()).or_else(|| query_token(&request))
    else {
        return unauthorized(&AuthError::MissingCredential);
    };

    match resolver.resolve(&credential) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(uri = %request.uri().path(), error = %e, "rejected credential");
            unauthorized(&e)
        }
    }
}
