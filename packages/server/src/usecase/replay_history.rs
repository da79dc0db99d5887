//! UseCase: 参加時の履歴再生

use std::{sync::Arc, time::Duration};

use crate::domain::{ChatMessage, MessageStore, RoomId};

use super::error::ReplayError;

/// 直近のメッセージを時間制限付きで取得するユースケース
pub struct ReplayHistoryUseCase {
    store: Arc<dyn MessageStore>,
    limit: usize,
    timeout: Duration,
}

impl ReplayHistoryUseCase {
    pub fn new(store: Arc<dyn MessageStore>, limit: usize, timeout: Duration) -> Self {
        Self {
            store,
            limit,
            timeout,
        }
    }

    /// ルームの直近 `limit` 件を古い順に返す
    ///
    /// `timeout` を過ぎたら諦めて `ReplayError::TimedOut` を返す。
    pub async fn execute(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, ReplayError> {
        let query = self.store.query_recent(room_id, self.limit);
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ReplayError::TimedOut(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MockMessageStore, NewChatMessage, StoreError};
    use crate::infrastructure::repository::InMemoryMessageStore;
    use async_trait::async_trait;

    struct SlowStore;

    #[async_trait]
    impl MessageStore for SlowStore {
        async fn append(&self, _message: NewChatMessage) -> Result<MessageId, StoreError> {
            Ok(MessageId::generate())
        }

        async fn query_recent(
            &self,
            _room_id: &RoomId,
            _limit: usize,
        ) -> Result<Vec<ChatMessage>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    fn room_42() -> RoomId {
        RoomId::new("42".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_replay_passes_limit_to_store() {
        // テスト項目: 設定した件数上限で MessageStore に問い合わせる
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store
            .expect_query_recent()
            .withf(|room, limit| room.as_str() == "42" && *limit == 50)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        let usecase = ReplayHistoryUseCase::new(Arc::new(store), 50, Duration::from_secs(5));

        // when (操作):
        let result = usecase.execute(&room_42()).await;

        // then (期待する結果):
        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replay_returns_stored_messages_in_order() {
        // テスト項目: 保存済みのメッセージが古い順で返される
        // given (前提条件):
        let store = Arc::new(InMemoryMessageStore::new());
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            store
                .append(NewChatMessage {
                    room_id: room_42(),
                    sender_id: crate::domain::UserId::new("alice".to_string()).unwrap(),
                    content: crate::domain::MessageContent::new(text.to_string()).unwrap(),
                    timestamp: crate::domain::Timestamp::new(i as i64),
                })
                .await
                .unwrap();
        }
        let usecase = ReplayHistoryUseCase::new(store, 2, Duration::from_secs(5));

        // when (操作):
        let messages = usecase.execute(&room_42()).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn test_replay_gives_up_after_timeout() {
        // テスト項目: 問い合わせが終わらない場合はタイムアウトする
        // given (前提条件):
        let timeout = Duration::from_millis(50);
        let usecase = ReplayHistoryUseCase::new(Arc::new(SlowStore), 50, timeout);

        // when (操作):
        let result = usecase.execute(&room_42()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ReplayError::TimedOut(d)) if d == timeout));
    }

    #[tokio::test]
    async fn test_replay_store_error() {
        // テスト項目: MessageStore のエラーは Store エラーとして返される
        let mut store = MockMessageStore::new();
        store
            .expect_query_recent()
            .returning(|_, _| Err(StoreError::Unavailable("down".to_string())));
        let usecase = ReplayHistoryUseCase::new(Arc::new(store), 50, Duration::from_secs(5));

        let result = usecase.execute(&room_42()).await;

        assert!(matches!(result, Err(ReplayError::Store(_))));
    }
}
