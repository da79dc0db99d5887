//! UseCase 層のエラー定義

use std::time::Duration;

use thiserror::Error;

use crate::domain::{
    AuthError, BrokerError, ChatMessage, RepositoryError, StoreError, ValueObjectError,
};

/// メッセージ送信のエラー
#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error("invalid message content: {0}")]
    InvalidContent(#[source] ValueObjectError),
    #[error("failed to persist message: {0}")]
    Persist(#[source] StoreError),
    #[error("failed to encode message: {0}")]
    Encode(#[source] BrokerError),
    /// 保存は完了しているが、ライブ配信できなかった
    #[error("message {} was stored but not published: {source}", .message.id)]
    Publish {
        message: Box<ChatMessage>,
        #[source]
        source: BrokerError,
    },
}

/// 履歴再生のエラー
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("history query timed out after {0:?}")]
    TimedOut(Duration),
    #[error("history query failed: {0}")]
    Store(#[from] StoreError),
}

/// イベントカタログ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),
    #[error("page must be 1 or greater")]
    InvalidPage,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// ユーザー登録・ログインのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),
    /// メールアドレスが未登録、またはパスワードが違う（どちらかは区別しない）
    #[error("incorrect email or password")]
    InvalidLogin,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
