//! Broker trait 定義
//!
//! プロセス外の Pub/Sub チャンネル。メッセージを全サーバープロセスへ届ける。
//!
//! ## トピック規約
//!
//! ルームごとに 1 トピック。トピック名は `room:` + RoomId で、
//! RoomId は `:` を含まないため `RoomTopic::parse` で一意に逆変換できる。

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::{BrokerError, ChatMessage, RoomId};

/// ルームトピックの接頭辞
pub const ROOM_TOPIC_PREFIX: &str = "room:";

/// 全ルームトピックを購読するためのパターン
pub const ROOM_TOPIC_PATTERN: &str = "room:*";

/// ルームから導出される Pub/Sub トピック名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomTopic(String);

impl RoomTopic {
    pub fn for_room(room_id: &RoomId) -> Self {
        Self(format!("{}{}", ROOM_TOPIC_PREFIX, room_id.as_str()))
    }

    /// トピック名から RoomId を復元する
    ///
    /// 接頭辞がない、または RoomId として不正な場合は `None`。
    pub fn parse(topic: &str) -> Option<RoomId> {
        let raw = topic.strip_prefix(ROOM_TOPIC_PREFIX)?;
        RoomId::new(raw.to_string()).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Broker から届いた 1 件の配信
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerDelivery {
    pub topic: String,
    pub payload: String,
}

/// 購読ストリーム
///
/// ストリームの終了は購読が切れたことを意味する。
pub type BrokerStream = BoxStream<'static, Result<BrokerDelivery, BrokerError>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Broker: Send + Sync {
    /// トピックに発行する
    async fn publish(&self, topic: &RoomTopic, payload: String) -> Result<(), BrokerError>;

    /// パターンに一致するトピックを購読する
    async fn subscribe(&self, pattern: &str) -> Result<BrokerStream, BrokerError>;
}

/// 保存済みメッセージを Broker に流すペイロードへ変換する
pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, message: &ChatMessage) -> Result<String, BrokerError>;
}
