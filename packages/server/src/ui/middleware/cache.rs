//! Read cache middleware.
//!
//! GET リクエストのレスポンスボディを、パスとクエリ（`access_token` を除く）をキーにして保存する。
//! ヒットした場合はハンドラを呼ばずに保存済みのボディを `200 application/json` で返す。
//! 2xx 以外は保存しない。他の書き込みでの無効化は行わないため、
//! 同じ URI には TTL が切れるまで（既定では永久に）同じ内容を返す。

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::ResponseCache;

const ACCESS_TOKEN_PARAM: &str = "access_token";

/// パスとクエリからキーを作る。`access_token` はユーザーごとに異なるため含めない。
fn cache_key(request: &Request) -> String {
    let uri = request.uri();
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or_default();
            !pair.is_empty() && name != ACCESS_TOKEN_PARAM
        })
        .collect();
    if kept.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), kept.join("&"))
    }
}

fn cached_response(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        Body::from(body),
    )
        .into_response()
}

pub async fn read_cache(
    State(cache): State<Arc<dyn ResponseCache>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);
    if let Some(body) = cache.get(&key) {
        tracing::debug!(key = %key, "read cache hit");
        return cached_response(body);
    }

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            tracing::debug!(key = %key, bytes = bytes.len(), "read cache stored");
            cache.put(key, bytes.to_vec());
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(key = %key, error = %e, "failed to buffer response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
