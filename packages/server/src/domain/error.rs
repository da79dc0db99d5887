//! Domain errors
//!
//! ドメイン層およびドメイン層が定義する trait の失敗を表すエラー型。

use thiserror::Error;

use super::value_object::{Email, EventId, UserId};

/// Value Object 生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("room id is too long ({0} bytes)")]
    RoomIdTooLong(usize),

    #[error("room id '{0}' contains characters other than [A-Za-z0-9_-]")]
    RoomIdInvalidCharacter(String),

    #[error("user id must not be empty")]
    UserIdEmpty,

    #[error("user id is too long ({0} bytes)")]
    UserIdTooLong(usize),

    #[error("'{0}' is not a valid event id")]
    EventIdInvalid(String),

    #[error("message content must not be empty")]
    MessageContentEmpty,

    #[error("message content is too long ({0} characters)")]
    MessageContentTooLong(usize),

    #[error("event name must not be empty")]
    EventNameEmpty,

    #[error("event location must not be empty")]
    EventLocationEmpty,

    #[error("'{0}' is not a valid email address")]
    EmailInvalid(String),

    #[error("user name must not be empty")]
    UserNameEmpty,

    #[error("user name is too long ({0} characters)")]
    UserNameTooLong(usize),

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),
}

/// MessageStore のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("message log record is corrupt at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// Broker のエラー
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("publish to '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    #[error("subscribe to '{pattern}' failed: {reason}")]
    SubscribeFailed { pattern: String, reason: String },

    #[error("broker connection lost: {0}")]
    ConnectionLost(String),

    #[error("failed to encode payload: {0}")]
    EncodeFailed(String),

    #[error("undeliverable message on '{topic}': {reason}")]
    MalformedDelivery { topic: String, reason: String },
}

/// イベントカタログ Repository のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("event {0} not found")]
    EventNotFound(EventId),

    #[error("user '{user_id}' is already a member of event {event_id}")]
    AlreadyMember { event_id: EventId, user_id: UserId },

    #[error("user '{user_id}' is not a member of event {event_id}")]
    NotMember { event_id: EventId, user_id: UserId },

    #[error("email '{0}' is already registered")]
    EmailTaken(Email),
}

/// 認証（アイデンティティ解決）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credential was supplied")]
    MissingCredential,

    #[error("credential is invalid: {0}")]
    InvalidCredential(String),

    #[error("credential has expired")]
    Expired,

    #[error("failed to issue credential: {0}")]
    IssueFailed(String),

    #[error("incorrect email or password")]
    InvalidLogin,

    #[error("password hashing failed: {0}")]
    HashFailed(String),
}
