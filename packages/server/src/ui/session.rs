//! ChatSession: 1 接続ぶんのプロトコル処理
//!
//! ## 状態遷移
//!
//! `Connecting → Active → Closing → Closed`
//!
//! - `Active` に入るときに ConnectionRegistry へ登録し、履歴再生タスクと
//!   送信タスク（pusher loop）を起動する
//! - 読み込みループが終わる（切断、不正なフレーム、送信エラー、
//!   registry からの登録解除、プロセス停止）と `Closing` に入る
//! - `Closing` では 読み込み停止 → 送信キューを閉じて流し切る →
//!   registry から登録解除 → ソケット解放 の順に処理する
//!
//! 登録解除は [`Registration`] の `Drop` で行うため、panic を含むどの経路でも
//! 接続が registry に残ることはない。

use std::{sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, StreamExt, stream::SplitStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    domain::{ConnectionId, Identity, RoomId},
    infrastructure::{
        dto::websocket::{ChatMessage as ChatFrame, ErrorCode, ErrorMessage, InboundMessage},
        message_pusher::{ConnectionHandle, ConnectionRegistry, OutboundFrame},
    },
    usecase::{ReplayHistoryUseCase, SendMessageError},
};

use super::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

/// 読み込みループが終わった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    /// クライアントが切断した（Close フレーム、またはストリーム終端）
    ClientClosed,
    /// JSON でない・`content` がない・バイナリのフレーム
    Malformed,
    /// 受信エラー
    Transport,
    /// 登録解除、送信エラー、プロセス停止
    Cancelled,
}

/// registry への登録。drop で必ず登録解除する
struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    fn new(registry: Arc<ConnectionRegistry>, handle: ConnectionHandle) -> Self {
        let id = handle.id();
        registry.add(handle);
        Self { registry, id }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}

pub struct ChatSession {
    id: ConnectionId,
    identity: Identity,
    room_id: RoomId,
    app: Arc<AppState>,
    state: SessionState,
}

impl ChatSession {
    pub fn new(identity: Identity, room_id: RoomId, app: Arc<AppState>) -> Self {
        Self {
            id: ConnectionId::generate(),
            identity,
            room_id,
            app,
            state: SessionState::Connecting,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "session state changed");
        self.state = next;
    }

    /// アップグレード済みのソケットでセッションを最後まで実行する
    pub async fn run(self, socket: WebSocket) {
        let span = tracing::info_span!(
            "chat_session",
            connection_id = %self.id,
            room_id = %self.room_id,
            sender_id = %self.identity.user_id
        );
        self.drive(socket).instrument(span).await;
    }

    async fn drive(mut self, socket: WebSocket) {
        let config = self.app.chat;
        let (sink, mut stream) = socket.split();
        let (tx, rx) = mpsc::channel(config.outbound_queue_capacity.max(1));

        let handle = ConnectionHandle::new(
            self.id,
            self.room_id.clone(),
            self.identity.user_id.clone(),
            tx.clone(),
        );
        let cancel = handle.cancellation();
        let registration = Registration::new(self.app.registry.clone(), handle);
        self.transition(SessionState::Active);
        tracing::info!("chat session started");

        let replay = tokio::spawn(
            replay_history(
                self.app.replay_history_usecase.clone(),
                self.room_id.clone(),
                tx.clone(),
            )
            .in_current_span(),
        );
        let writer = tokio::spawn(
            pusher_loop(rx, sink, cancel.clone(), config.drain_timeout).in_current_span(),
        );

        let reason = self.read_loop(&mut stream, &tx, &cancel).await;
        self.transition(SessionState::Closing);
        tracing::info!(reason = ?reason, "closing chat session");

        cancel.cancel();
        replay.abort();
        drop(tx);

        let sink = match writer.await {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(error = %e, "outbound writer task failed");
                None
            }
        };

        drop(registration);

        if let Some(mut sink) = sink
            && tokio::time::timeout(config.drain_timeout, sink.close())
                .await
                .is_err()
        {
            tracing::warn!("timed out closing websocket");
        }
        drop(stream);

        self.transition(SessionState::Closed);
        tracing::info!("chat session closed");
    }

    async fn read_loop(
        &self,
        stream: &mut SplitStream<WebSocket>,
        tx: &mpsc::Sender<OutboundFrame>,
        cancel: &CancellationToken,
    ) -> CloseReason {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return CloseReason::Cancelled,
                next = stream.next() => next,
            };

            let msg = match next {
                None => return CloseReason::ClientClosed,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "websocket receive error");
                    return CloseReason::Transport;
                }
                Some(Ok(msg)) => msg,
            };

            match msg {
                Message::Text(text) => {
                    let inbound = match serde_json::from_str::<InboundMessage>(text.as_str()) {
                        Ok(inbound) => inbound,
                        Err(e) => {
                            tracing::warn!(error = %e, "malformed chat frame");
                            return CloseReason::Malformed;
                        }
                    };
                    self.handle_inbound(inbound, tx).await;
                }
                Message::Binary(_) => {
                    tracing::warn!("binary frames are not supported");
                    return CloseReason::Malformed;
                }
                Message::Close(_) => return CloseReason::ClientClosed,
                // Ping/pong is handled automatically by the WebSocket protocol
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    async fn handle_inbound(&self, inbound: InboundMessage, tx: &mpsc::Sender<OutboundFrame>) {
        let result = self
            .app
            .send_message_usecase
            .execute(&self.identity, &self.room_id, inbound.content)
            .await;

        match result {
            Ok(message) => {
                tracing::debug!(message_id = %message.id, "message stored and published");
            }
            Err(SendMessageError::InvalidContent(e)) => {
                tracing::debug!(error = %e, "rejected message content");
                notify(tx, ErrorMessage::new(ErrorCode::InvalidContent, e.to_string()));
            }
            Err(SendMessageError::Persist(e)) => {
                tracing::error!(error = %e, "failed to persist message, not publishing");
                notify(
                    tx,
                    ErrorMessage::new(ErrorCode::PersistFailed, "message could not be saved"),
                );
            }
            Err(SendMessageError::Publish { message, source }) => {
                tracing::warn!(
                    message_id = %message.id,
                    error = %source,
                    "message stored but not delivered live"
                );
            }
            Err(SendMessageError::Encode(e)) => {
                tracing::error!(error = %e, "failed to encode chat frame");
            }
        }
    }
}

/// この接続にだけエラーフレームを送る（キューが満杯なら捨てる）
fn notify(tx: &mpsc::Sender<OutboundFrame>, error: ErrorMessage) {
    let frame = match serde_json::to_string(&error) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode error frame");
            return;
        }
    };
    if tx.try_send(frame).is_err() {
        tracing::warn!(code = ?error.code, "outbound queue unavailable, dropping error frame");
    }
}

/// 直近の履歴を `history` フレームとして送信キューに積む
///
/// タイムアウトや失敗時は諦めるだけで、接続は閉じない。
async fn replay_history(
    usecase: Arc<ReplayHistoryUseCase>,
    room_id: RoomId,
    tx: mpsc::Sender<OutboundFrame>,
) {
    let messages = match usecase.execute(&room_id).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::warn!(error = %e, "history replay abandoned");
            return;
        }
    };

    let count = messages.len();
    for message in messages {
        let frame = ChatFrame::from(message).history();
        let payload = match serde_json::to_string(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode history frame");
                continue;
            }
        };
        if tx.send(payload).await.is_err() {
            return;
        }
    }
    tracing::debug!(count, "history replayed");
}

/// 送信キューのフレームを順番にソケットへ書き込む
///
/// `cancel` されたらキューを閉じ、積まれていたフレームを `drain_timeout` 以内で
/// 書き切ってから sink を返す。書き込みに失敗した場合は `cancel` して `None` を返す。
async fn pusher_loop<S>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut sink: S,
    cancel: CancellationToken,
    drain_timeout: Duration,
) -> Option<S>
where
    S: Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = rx.recv() => match frame {
                Some(frame) => {
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        tracing::debug!("websocket send failed");
                        cancel.cancel();
                        return None;
                    }
                }
                None => break,
            },
        }
    }

    rx.close();
    let drain = async {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                return false;
            }
        }
        true
    };
    let drained = tokio::time::timeout(drain_timeout, drain).await;
    match drained {
        Ok(true) => Some(sink),
        Ok(false) => None,
        Err(_) => {
            tracing::warn!("timed out draining outbound queue");
            Some(sink)
        }
    }
}
