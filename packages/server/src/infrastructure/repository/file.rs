//! JSON Lines ファイルによる追記専用 MessageStore
//!
//! 1 行 1 メッセージ。起動時にファイル全体を読み込んでルーム別の索引を作り、
//! 以降の `append` はファイルへの書き込みと `sync_data` が終わってから
//! 索引に反映して ID を返す。
//!
//! 書き込みが途中で失敗した場合は、最後に確定した長さまでファイルを切り詰める。
//! 切り詰めにも失敗したときは次の書き込みの前にもう一度切り詰めるので、
//! 書きかけの断片の後ろに正常な行が続くことはない。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

use crate::domain::{ChatMessage, MessageId, MessageStore, NewChatMessage, RoomId, StoreError};

use super::inmemory::message_store::recent;

struct MessageLog {
    file: File,
    /// 確定済みのファイル長（バイト）
    committed_len: u64,
    /// `committed_len` より後ろに書きかけの断片が残っている
    torn: bool,
    index: HashMap<RoomId, Vec<ChatMessage>>,
}

impl MessageLog {
    async fn append_record(&mut self, line: &[u8]) -> Result<(), StoreError> {
        self.discard_torn().await?;

        if let Err(e) = write_synced(&mut self.file, line).await {
            self.torn = true;
            if let Err(rollback) = self.discard_torn().await {
                tracing::error!(
                    error = %rollback,
                    committed_len = self.committed_len,
                    "failed to roll back partial record, retrying before next append"
                );
            }
            return Err(e.into());
        }
        self.committed_len += line.len() as u64;
        Ok(())
    }

    async fn discard_torn(&mut self) -> std::io::Result<()> {
        if self.torn {
            self.file.set_len(self.committed_len).await?;
            self.file.sync_data().await?;
            self.torn = false;
            tracing::warn!(committed_len = self.committed_len, "discarded partial record");
        }
        Ok(())
    }
}

async fn write_synced(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.sync_data().await
}

pub struct FileMessageStore {
    path: PathBuf,
    log: Mutex<MessageLog>,
}

impl FileMessageStore {
    /// ログファイルを開く（存在しなければ作成する）
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let index = load_index(&existing)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        // 書きかけの最終行があれば、次の追記と同じ行にならないよう改行で閉じる
        if !existing.is_empty() && !existing.ends_with('\n') {
            file.write_all(b"\n").await?;
            file.sync_data().await?;
        }
        let committed_len = file.metadata().await?.len();

        let count: usize = index.values().map(Vec::len).sum();
        tracing::info!(path = %path.display(), messages = count, "message log opened");

        Ok(Self {
            path,
            log: Mutex::new(MessageLog {
                file,
                committed_len,
                torn: false,
                index,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_index(contents: &str) -> Result<HashMap<RoomId, Vec<ChatMessage>>, StoreError> {
    let mut index: HashMap<RoomId, Vec<ChatMessage>> = HashMap::new();
    let complete = contents.ends_with('\n');
    let lines: Vec<&str> = contents.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ChatMessage>(line) {
            Ok(message) => index
                .entry(message.room_id.clone())
                .or_default()
                .push(message),
            Err(e) if i + 1 == lines.len() && !complete => {
                tracing::warn!(line = i + 1, error = %e, "skipping truncated final record");
            }
            Err(source) => {
                return Err(StoreError::Corrupt {
                    line: i + 1,
                    source,
                });
            }
        }
    }
    Ok(index)
}

#[async_trait]
impl MessageStore for FileMessageStore {
    async fn append(&self, message: NewChatMessage) -> Result<MessageId, StoreError> {
        let id = MessageId::generate();
        let stored = ChatMessage::assign(id.clone(), message);
        let mut line = serde_json::to_vec(&stored).map_err(StoreError::Encode)?;
        line.push(b'\n');

        let mut log = self.log.lock().await;
        log.append_record(&line).await?;
        log.index
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
        let log = self.log.lock().await;
        Ok(log
            .index
            .get(room_id)
            .map(|messages| recent(messages, limit))
            .unwrap_or_default())
    }
}
