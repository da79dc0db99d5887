//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State, ws::WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{
    domain::Identity,
    ui::{session::ChatSession, state::AppState},
};

use super::http::{ApiError, parse_event_id};

/// `GET /ws/events/{id}`
///
/// イベントの存在を確認してからアップグレードする。
/// ID が不正なら 400、存在しなければ 404 を返し、アップグレードしない。
pub async fn chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = parse_event_id(&raw_id)?;
    let event = state.get_event_usecase.execute(event_id).await?;

    tracing::info!(
        event_id = %event.id,
        user_id = %identity.user_id,
        "upgrading chat connection"
    );
    let session = ChatSession::new(identity, event.room_id(), state.clone());
    Ok(ws.on_upgrade(move |socket| session.run(socket)))
}
