//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::StreamExt;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};
use tsudoi_server::{
    domain::{EventId, EventRepository, MessageStore, NewEvent, RoomId, Timestamp, UserId},
    infrastructure::{
        auth::{Argon2CredentialHasher, JwtIdentityResolver},
        broker::InProcessBroker,
        cache::InMemoryResponseCache,
        message_pusher::DispatcherConfig,
        repository::{InMemoryEventRepository, InMemoryMessageStore, InMemoryUserRepository},
    },
    ui::{AppDependencies, AppState, ChatConfig, HistoryConfig, Server, ServerError},
};
use tsudoi_shared::time::SystemClock;

pub const SECRET: &[u8] = b"integration-test-secret";
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper struct to manage an in-process server lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub store: Arc<dyn MessageStore>,
    pub events: Arc<InMemoryEventRepository>,
    resolver: Arc<JwtIdentityResolver>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    /// Start a server backed by an in-memory message store
    pub async fn start() -> Self {
        Self::start_with_store(Arc::new(InMemoryMessageStore::new())).await
    }

    pub async fn start_with_store(store: Arc<dyn MessageStore>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let broker = Arc::new(InProcessBroker::default());
        let events = Arc::new(InMemoryEventRepository::new());
        let resolver = Arc::new(JwtIdentityResolver::new(SECRET));
        let state = Arc::new(AppState::new(
            AppDependencies {
                message_store: store.clone(),
                event_repository: events.clone(),
                user_repository: Arc::new(InMemoryUserRepository::new()),
                broker: broker.clone(),
                identity_resolver: resolver.clone(),
                token_issuer: resolver.clone(),
                credential_hasher: Arc::new(Argon2CredentialHasher::with_cost(8, 1, 1).unwrap()),
                response_cache: Arc::new(InMemoryResponseCache::new(None)),
                clock: Arc::new(SystemClock),
            },
            HistoryConfig::default(),
            ChatConfig::default(),
        ));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = Server::new(state.clone(), broker.clone(), DispatcherConfig::default());
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        // Dispatcher is ready once it has subscribed
        tokio::time::timeout(FRAME_TIMEOUT, broker.wait_for_subscribers(1))
            .await
            .expect("dispatcher did not subscribe");

        Self {
            addr,
            state,
            store,
            events,
            resolver,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn token(&self, user_id: &str) -> String {
        self.resolver
            .issue(&user(user_id), Duration::from_secs(3600))
            .unwrap()
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, event_id: &str, token: &str) -> String {
        format!(
            "ws://{}/ws/events/{}?access_token={}",
            self.addr, event_id, token
        )
    }

    /// Create events until one with `id` exists
    pub async fn ensure_event(&self, id: u64) -> EventId {
        loop {
            let event = self
                .events
                .create(
                    NewEvent::new(
                        "meetup".to_string(),
                        "Tokyo".to_string(),
                        Timestamp::new(0),
                        String::new(),
                        user("organizer"),
                    )
                    .unwrap(),
                    Timestamp::new(0),
                )
                .await
                .unwrap();
            if event.id.value() >= id {
                return event.id;
            }
        }
    }

    pub async fn connect(&self, event_id: &str, user_id: &str) -> WsClient {
        let (ws, _) = connect_async(self.ws_url(event_id, &self.token(user_id)))
            .await
            .unwrap();
        ws
    }

    /// Wait until `count` connections are registered for the room
    pub async fn wait_for_room(&self, room: &str, count: usize) {
        let room_id = RoomId::new(room.to_string()).unwrap();
        tokio::time::timeout(FRAME_TIMEOUT, async {
            while self.state.registry.room_len(&room_id) != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("room {room} never reached {count} connections"));
    }

    /// Whether the server task is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Trigger graceful shutdown and wait for the server to return
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let handle = self.handle.take().unwrap();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("server did not stop")
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

/// Next text frame as JSON (ping/pong are skipped)
pub async fn next_frame(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Assert no text frame arrives within `wait`
pub async fn assert_silent(ws: &mut WsClient, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("unexpected frame: {}", text.as_str());
    }
}

/// Wait for the server to end the connection
pub async fn wait_closed(ws: &mut WsClient) {
    tokio::time::timeout(FRAME_TIMEOUT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("connection was not closed");
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    use futures_util::SinkExt;
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}
