//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ChatMessage, Email, Event, EventId, MessageId, NewChatMessage, NewEvent, NewUser,
    RepositoryError, RoomId, StoreError, Timestamp, User, UserId,
};

/// チャットメッセージの追記専用ログ
///
/// ## 保証
///
/// - `append` が成功を返した時点で、そのメッセージは `query_recent` から見える
/// - 同じルームへの並行 `append` はどちらの順序でも構わないが、
///   `query_recent` は途中状態を含まないスナップショットを返す
/// - 更新・削除の操作は持たない
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを追記し、採番した ID を返す
    async fn append(&self, message: NewChatMessage) -> Result<MessageId, StoreError>;

    /// ルームの直近 `limit` 件を古い順に返す
    async fn query_recent(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError>;
}

/// イベントカタログ Repository
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// イベントを作成する（作成者は最初のメンバーになる）
    async fn create(&self, event: NewEvent, created_at: Timestamp)
    -> Result<Event, RepositoryError>;

    /// ID 順にイベントを取得
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Event>, RepositoryError>;

    /// イベントを取得
    async fn get(&self, id: EventId) -> Result<Event, RepositoryError>;

    /// メンバーを追加
    async fn add_member(
        &self,
        id: EventId,
        user_id: UserId,
        updated_at: Timestamp,
    ) -> Result<Event, RepositoryError>;

    /// メンバーを削除
    async fn remove_member(
        &self,
        id: EventId,
        user_id: &UserId,
        updated_at: Timestamp,
    ) -> Result<Event, RepositoryError>;
}

/// ユーザーカタログ Repository
///
/// メールアドレスはユーザー間で一意。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを登録する（同じメールアドレスがあれば `EmailTaken`）
    async fn create(&self, user: NewUser, created_at: Timestamp) -> Result<User, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
}
