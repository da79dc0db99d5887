//! Server execution logic.

use std::{future::IntoFuture, sync::Arc, time::Duration};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::{
    domain::Broker,
    infrastructure::message_pusher::{Dispatcher, DispatcherConfig, DispatcherError},
};

use super::{
    handler::{
        chat_handler, create_event, get_event, health_check, join_event, leave_event,
        list_events, login, register_user,
    },
    middleware::{authenticate, read_cache},
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),
    #[error("dispatcher stopped unexpectedly")]
    DispatcherStopped,
    #[error("dispatcher task panicked: {0}")]
    DispatcherPanicked(String),
}

/// ルーターを組み立てる
///
/// - `/events` 系: 認証 + 読み取りキャッシュ（GET のみ）
/// - `/ws/events/{id}`: 認証のみ
/// - `/register`, `/login`, `/api/health`: 認証なし
pub fn build_router(state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/join", post(join_event).delete(leave_event))
        .route_layer(from_fn_with_state(
            state.response_cache.clone(),
            read_cache,
        ))
        .route("/ws/events/{id}", get(chat_handler))
        .route_layer(from_fn_with_state(
            state.identity_resolver.clone(),
            authenticate,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/register", post(register_user))
        .route("/login", post(login))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Event chat server
///
/// HTTP / WebSocket の受付と、Broker からの配信を振り分ける Dispatcher を
/// 同じプロセスで動かす。
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, broker, DispatcherConfig::default());
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    broker: Arc<dyn Broker>,
    dispatcher_config: DispatcherConfig,
}

impl Server {
    pub fn new(
        state: Arc<AppState>,
        broker: Arc<dyn Broker>,
        dispatcher_config: DispatcherConfig,
    ) -> Self {
        Self {
            state,
            broker,
            dispatcher_config,
        }
    }

    /// Bind to `host:port` and serve until Ctrl+C / SIGTERM
    pub async fn run(self, host: &str, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Event chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/events/{{id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// 停止時は新規接続の受付をやめ、registry 経由で全セッションを 1 度ずつ閉じる。
    /// Dispatcher が購読を諦めた場合はエラーを返す。
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let registry = self.state.registry.clone();
        let drain_timeout = self.state.chat.drain_timeout;

        let dispatcher_shutdown = CancellationToken::new();
        let dispatcher = Dispatcher::new(
            self.broker.clone(),
            registry.clone(),
            self.dispatcher_config,
        );
        let mut dispatcher_task = tokio::spawn(dispatcher.run(dispatcher_shutdown.clone()));

        let closing = registry.clone();
        let graceful = async move {
            shutdown.await;
            let closed = closing.close_all();
            tracing::info!(connections = closed, "closing chat sessions");
        };
        let app = build_router(self.state.clone());
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .into_future();

        let result = tokio::select! {
            served = server => {
                dispatcher_shutdown.cancel();
                match dispatcher_task.await {
                    Ok(Ok(())) => served.map_err(ServerError::from),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(ServerError::DispatcherPanicked(e.to_string())),
                }
            }
            finished = &mut dispatcher_task => {
                registry.close_all();
                match finished {
                    Ok(Ok(())) => Err(ServerError::DispatcherStopped),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(ServerError::DispatcherPanicked(e.to_string())),
                }
            }
        };

        wait_for_sessions(&registry, drain_timeout * 2).await;
        tracing::info!("Server shutdown complete");
        result
    }
}

async fn wait_for_sessions(
    registry: &crate::infrastructure::message_pusher::ConnectionRegistry,
    timeout: Duration,
) {
    let drained = tokio::time::timeout(timeout, async {
        while !registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            remaining = registry.len(),
            "chat sessions still open at shutdown"
        );
    }
}
