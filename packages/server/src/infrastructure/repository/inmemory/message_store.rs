//! InMemory MessageStore 実装
//!
//! ルームごとの `Vec<ChatMessage>` を 1 つのロックで保持する。
//! 追記と読み出しが同じロックを通るため、`query_recent` は常に
//! 途中状態を含まないスナップショットを返す。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ChatMessage, MessageId, MessageStore, NewChatMessage, RoomId, StoreError};

/// 末尾 `limit` 件を古い順に複製する
pub(crate) fn recent(messages: &[ChatMessage], limit: usize) -> Vec<ChatMessage> {
    let start = messages.len().saturating_sub(limit);
    messages[start..].to_vec()
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    rooms: RwLock<HashMap<RoomId, Vec<ChatMessage>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: NewChatMessage) -> Result<MessageId, StoreError> {
        let id = MessageId::generate();
        let stored = ChatMessage::assign(id.clone(), message);

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(stored.room_id.clone())
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn query_recent(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .get(room_id)
            .map(|messages| recent(messages, limit))
            .unwrap_or_default())
    }
}
