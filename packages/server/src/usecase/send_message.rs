//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 送信者・時刻のサーバー側スタンプ、保存してから配信する順序
//!
//! ### なぜこのテストが必要か
//! - クライアントが送った sender_id でなく、認証済み ID が使われることを保証
//! - 保存に失敗したメッセージがライブ配信されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存してルームのトピックに配信
//! - 異常系：内容が不正、保存失敗、配信失敗

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{
    Broker, ChatMessage, Identity, MessageContent, MessageStore, NewChatMessage, PayloadEncoder,
    RoomId, RoomTopic, Timestamp,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// MessageStore（メッセージログ）
    store: Arc<dyn MessageStore>,
    /// Broker（プロセス間配信）
    broker: Arc<dyn Broker>,
    /// 配信ペイロードの形式（UI 層が決める）
    encoder: Arc<dyn PayloadEncoder>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        store: Arc<dyn MessageStore>,
        broker: Arc<dyn Broker>,
        encoder: Arc<dyn PayloadEncoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            broker,
            encoder,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// 1. 内容を検証する
    /// 2. 送信者（認証済み ID）と時刻をスタンプする
    /// 3. MessageStore に追記する（失敗したら配信しない）
    /// 4. ルームのトピックに publish する
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 保存・配信したメッセージ
    /// * `Err(SendMessageError::Publish)` - 保存は成功したが配信に失敗した
    pub async fn execute(
        &self,
        identity: &Identity,
        room_id: &RoomId,
        content: String,
    ) -> Result<ChatMessage, SendMessageError> {
        let content = MessageContent::new(content).map_err(SendMessageError::InvalidContent)?;
        let message = NewChatMessage {
            room_id: room_id.clone(),
            sender_id: identity.user_id.clone(),
            content,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };

        let id = self
            .store
            .append(message.clone())
            .await
            .map_err(SendMessageError::Persist)?;
        let stored = ChatMessage::assign(id, message);

        let payload = self
            .encoder
            .encode(&stored)
            .map_err(SendMessageError::Encode)?;

        if let Err(source) = self
            .broker
            .publish(&RoomTopic::for_room(room_id), payload)
            .await
        {
            return Err(SendMessageError::Publish {
                message: Box::new(stored),
                source,
            });
        }

        Ok(stored)
    }
}
