//! インメモリ ResponseCache
//!
//! 書き込みによる無効化は行わない。TTL を指定した場合のみ、
//! 古いエントリは `get` でミス扱いになり次の `put` で上書きされる。

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::RwLock;

use crate::domain::ResponseCache;

struct Entry {
    body: Vec<u8>,
    stored_at: Instant,
}

#[derive(Default)]
pub struct InMemoryResponseCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl InMemoryResponseCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResponseCache for InMemoryResponseCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if let Some(ttl) = self.ttl
            && entry.stored_at.elapsed() >= ttl
        {
            return None;
        }
        Some(entry.body.clone())
    }

    fn put(&self, key: String, body: Vec<u8>) {
        self.entries.write().insert(
            key,
            Entry {
                body,
                stored_at: Instant::now(),
            },
        );
    }
}
