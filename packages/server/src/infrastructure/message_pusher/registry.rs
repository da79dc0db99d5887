//! ConnectionRegistry: プロセス内の接続テーブル
//!
//! ## 責務
//!
//! - 「今どの接続が存在するか」の唯一の管理者
//! - 接続ごとの送信キュー（有界 `mpsc::Sender`）と RoomId の保持
//! - ルーム単位の走査（Dispatcher 用）
//!
//! ## 同期の規律
//!
//! テーブルは `ConnectionRegistry` 内部の 1 つの `RwLock` だけで保護され、
//! 外部からは `add` / `remove` / `for_each_in_room` を通してのみ触れる。
//! ロック保持中に await しないため、同期ロック（`parking_lot`）を使う。
//! これにより `Drop` からの登録解除も可能になる。
//!
//! `close_all` 以降に `add` された接続は、登録と同時に終了を要求される。
//! 停止処理と並行してアップグレード中だったセッションも取り残されない。

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::domain::{ConnectionId, RoomId, UserId};

/// 接続へ送るシリアライズ済みの JSON フレーム
pub type OutboundFrame = String;

/// `try_deliver` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// キューに積んだ
    Delivered,
    /// キューが満杯なので破棄した（遅い購読者は欠損を許容する）
    QueueFull,
    /// 受信側がすでに閉じている
    Closed,
}

/// レジストリに登録される 1 接続分のエントリ
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    room_id: RoomId,
    sender_id: UserId,
    outbound: mpsc::Sender<OutboundFrame>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(
        id: ConnectionId,
        room_id: RoomId,
        sender_id: UserId,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> Self {
        Self {
            id,
            room_id,
            sender_id,
            outbound,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn sender_id(&self) -> &UserId {
        &self.sender_id
    }

    /// この接続のセッションを閉じるためのトークン
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// セッションに終了を要求する（何度呼んでもよい）
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// ブロックせずに送信キューへ積む
    pub fn try_deliver(&self, frame: OutboundFrame) -> DeliveryOutcome {
        match self.outbound.try_send(frame) {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(TrySendError::Full(_)) => DeliveryOutcome::QueueFull,
            Err(TrySendError::Closed(_)) => DeliveryOutcome::Closed,
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
    closing: bool,
}

/// プロセス内の接続レジストリ
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    table: RwLock<Table>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を登録する
    ///
    /// 同じ ID が既に登録されていれば置き換える（ConnectionId は生成ごとに一意なので通常起きない）。
    pub fn add(&self, handle: ConnectionHandle) {
        let mut table = self.table.write();
        let id = handle.id;
        table
            .rooms
            .entry(handle.room_id.clone())
            .or_default()
            .insert(id);
        if table.closing {
            handle.close();
        }
        if let Some(previous) = table.connections.insert(id, handle) {
            previous.close();
        }
        tracing::debug!(connection_id = %id, closing = table.closing, "connection registered");
    }

    /// 接続を登録解除する（冪等）
    ///
    /// 登録されていた場合は `true` を返し、そのセッションに終了を要求する。
    /// 既に存在しない ID では何もせず `false` を返す。
    pub fn remove(&self, id: &ConnectionId) -> bool {
        let mut table = self.table.write();
        let Some(handle) = table.connections.remove(id) else {
            return false;
        };
        if let Some(members) = table.rooms.get_mut(&handle.room_id) {
            members.remove(id);
            if members.is_empty() {
                table.rooms.remove(&handle.room_id);
            }
        }
        drop(table);

        handle.close();
        tracing::debug!(connection_id = %id, room_id = %handle.room_id, "connection unregistered");
        true
    }

    /// ルームに属する全接続に対して `f` を呼ぶ
    ///
    /// 読み取りロックを保持したまま呼ぶので、`f` はブロックしてはならない
    /// （`ConnectionHandle::try_deliver` のような即時操作のみ）。
    pub fn for_each_in_room<F>(&self, room_id: &RoomId, mut f: F)
    where
        F: FnMut(&ConnectionHandle),
    {
        let table = self.table.read();
        let Some(members) = table.rooms.get(room_id) else {
            return;
        };
        for id in members {
            if let Some(handle) = table.connections.get(id) {
                f(handle);
            }
        }
    }

    /// 全接続に終了を要求する（プロセス停止時）
    ///
    /// 各セッションは自身のクローズ処理の中で `remove` を呼ぶ。
    /// 以降に登録される接続も即座に終了を要求される。要求した接続数を返す。
    pub fn close_all(&self) -> usize {
        let mut table = self.table.write();
        table.closing = true;
        for handle in table.connections.values() {
            handle.close();
        }
        table.connections.len()
    }

    pub fn len(&self) -> usize {
        self.table.read().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn room_len(&self, room_id: &RoomId) -> usize {
        self.table
            .read()
            .rooms
            .get(room_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.table.read().connections.contains_key(id)
    }
}
