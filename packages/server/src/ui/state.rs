//! Shared application state.

use std::{sync::Arc, time::Duration};

use tsudoi_shared::time::Clock;

use crate::{
    domain::{
        Broker, CredentialHasher, EventRepository, IdentityResolver, MessageStore, ResponseCache,
        TokenIssuer, UserRepository,
    },
    infrastructure::{dto::websocket::ChatFrameEncoder, message_pusher::ConnectionRegistry},
    usecase::{
        CreateEventUseCase, GetEventUseCase, JoinEventUseCase, LeaveEventUseCase,
        ListEventsUseCase, LoginUseCase, RegisterUserUseCase, ReplayHistoryUseCase,
        SendMessageUseCase,
    },
};

/// チャットセッションの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    /// 接続ごとの送信キューの長さ
    pub outbound_queue_capacity: usize,
    /// クローズ時に送信キューを流し切る・ソケットを閉じるまでの待ち時間
    pub drain_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 64,
            drain_timeout: Duration::from_secs(2),
        }
    }
}

/// 参加時の履歴再生の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    pub limit: usize,
    pub timeout: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            timeout: Duration::from_secs(5),
        }
    }
}

/// AppState の組み立てに必要な外部依存
pub struct AppDependencies {
    pub message_store: Arc<dyn MessageStore>,
    pub event_repository: Arc<dyn EventRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub broker: Arc<dyn Broker>,
    pub identity_resolver: Arc<dyn IdentityResolver>,
    pub token_issuer: Arc<dyn TokenIssuer>,
    pub credential_hasher: Arc<dyn CredentialHasher>,
    pub response_cache: Arc<dyn ResponseCache>,
    pub clock: Arc<dyn Clock>,
}

/// Shared application state
pub struct AppState {
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub replay_history_usecase: Arc<ReplayHistoryUseCase>,
    pub create_event_usecase: Arc<CreateEventUseCase>,
    pub list_events_usecase: Arc<ListEventsUseCase>,
    pub get_event_usecase: Arc<GetEventUseCase>,
    pub join_event_usecase: Arc<JoinEventUseCase>,
    pub leave_event_usecase: Arc<LeaveEventUseCase>,
    pub register_user_usecase: Arc<RegisterUserUseCase>,
    pub login_usecase: Arc<LoginUseCase>,
    /// このプロセスの接続テーブル
    pub registry: Arc<ConnectionRegistry>,
    pub identity_resolver: Arc<dyn IdentityResolver>,
    pub response_cache: Arc<dyn ResponseCache>,
    pub chat: ChatConfig,
}

impl AppState {
    /// UseCase を組み立てて AppState を作る
    pub fn new(deps: AppDependencies, history: HistoryConfig, chat: ChatConfig) -> Self {
        let AppDependencies {
            message_store,
            event_repository,
            user_repository,
            broker,
            identity_resolver,
            token_issuer,
            credential_hasher,
            response_cache,
            clock,
        } = deps;

        Self {
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                message_store.clone(),
                broker,
                Arc::new(ChatFrameEncoder),
                clock.clone(),
            )),
            replay_history_usecase: Arc::new(ReplayHistoryUseCase::new(
                message_store,
                history.limit,
                history.timeout,
            )),
            create_event_usecase: Arc::new(CreateEventUseCase::new(
                event_repository.clone(),
                clock.clone(),
            )),
            list_events_usecase: Arc::new(ListEventsUseCase::new(event_repository.clone())),
            get_event_usecase: Arc::new(GetEventUseCase::new(event_repository.clone())),
            join_event_usecase: Arc::new(JoinEventUseCase::new(
                event_repository.clone(),
                clock.clone(),
            )),
            leave_event_usecase: Arc::new(LeaveEventUseCase::new(
                event_repository,
                clock.clone(),
            )),
            register_user_usecase: Arc::new(RegisterUserUseCase::new(
                user_repository.clone(),
                credential_hasher.clone(),
                clock,
            )),
            login_usecase: Arc::new(LoginUseCase::new(
                user_repository,
                credential_hasher,
                token_issuer,
            )),
            registry: Arc::new(ConnectionRegistry::new()),
            identity_resolver,
            response_cache,
            chat,
        }
    }
}
