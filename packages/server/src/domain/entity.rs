//! Entities
//!
//! ID によって同一性が決まるドメインオブジェクト。

use serde::{Deserialize, Serialize};

use super::{
    error::ValueObjectError,
    value_object::{
        Email, EventId, MessageContent, MessageId, RoomId, Timestamp, UserId, UserName,
    },
};

/// 永続化前のチャットメッセージ
///
/// 送信者と時刻はサーバー側で確定済み。ID は MessageStore が採番する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

/// 永続化済みのチャットメッセージ（不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// MessageStore が採番した ID を付与して確定する
    pub fn assign(id: MessageId, message: NewChatMessage) -> Self {
        Self {
            id,
            room_id: message.room_id,
            sender_id: message.sender_id,
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

/// 登録前のユーザー（パスワードはハッシュ済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: UserName,
    pub email: Email,
    pub password_hash: String,
}

/// 登録済みのユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: Email,
    /// PHC 形式のハッシュ文字列
    pub password_hash: String,
    pub created_at: Timestamp,
}

/// イベント作成の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub location: String,
    pub date: Timestamp,
    pub description: String,
    pub creator_id: UserId,
}

impl NewEvent {
    pub fn new(
        name: String,
        location: String,
        date: Timestamp,
        description: String,
        creator_id: UserId,
    ) -> Result<Self, ValueObjectError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ValueObjectError::EventNameEmpty);
        }
        let location = location.trim().to_string();
        if location.is_empty() {
            return Err(ValueObjectError::EventLocationEmpty);
        }
        Ok(Self {
            name,
            location,
            date,
            description,
            creator_id,
        })
    }
}

/// イベント（チャットルームの持ち主）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub location: String,
    pub date: Timestamp,
    pub description: String,
    pub creator_id: UserId,
    pub members: Vec<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// このイベントのチャットルーム ID
    pub fn room_id(&self) -> RoomId {
        RoomId::from(self.id)
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}
