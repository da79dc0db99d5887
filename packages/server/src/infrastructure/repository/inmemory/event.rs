//! InMemory Event Repository 実装
//!
//! ドメイン層が定義する EventRepository trait の具体的な実装。
//! `BTreeMap` をインメモリ DB として使用し、ID 順の一覧取得をそのまま実現する。

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Event, EventId, EventRepository, NewEvent, RepositoryError, Timestamp, UserId};

#[derive(Default)]
struct EventTable {
    last_id: u64,
    events: BTreeMap<EventId, Event>,
}

/// インメモリ Event Repository 実装
#[derive(Default)]
pub struct InMemoryEventRepository {
    table: Mutex<EventTable>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(
        &self,
        event: NewEvent,
        created_at: Timestamp,
    ) -> Result<Event, RepositoryError> {
        let mut table = self.table.lock().await;
        table.last_id += 1;
        let id = EventId::new(table.last_id);
        let event = Event {
            id,
            name: event.name,
            location: event.location,
            date: event.date,
            description: event.description,
            members: vec![event.creator_id.clone()],
            creator_id: event.creator_id,
            created_at,
            updated_at: created_at,
        };
        table.events.insert(id, event.clone());
        Ok(event)
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Event>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .events
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: EventId) -> Result<Event, RepositoryError> {
        let table = self.table.lock().await;
        table
            .events
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::EventNotFound(id))
    }

    async fn add_member(
        &self,
        id: EventId,
        user_id: UserId,
        updated_at: Timestamp,
    ) -> Result<Event, RepositoryError> {
        let mut table = self.table.lock().await;
        let event = table
            .events
            .get_mut(&id)
            .ok_or(RepositoryError::EventNotFound(id))?;
        if event.is_member(&user_id) {
            return Err(RepositoryError::AlreadyMember {
                event_id: id,
                user_id,
            });
        }
        event.members.push(user_id);
        event.updated_at = updated_at;
        Ok(event.clone())
    }

    async fn remove_member(
        &self,
        id: EventId,
        user_id: &UserId,
        updated_at: Timestamp,
    ) -> Result<Event, RepositoryError> {
        let mut table = self.table.lock().await;
        let event = table
            .events
            .get_mut(&id)
            .ok_or(RepositoryError::EventNotFound(id))?;
        let before = event.members.len();
        event.members.retain(|m| m != user_id);
        if event.members.len() == before {
            return Err(RepositoryError::NotMember {
                event_id: id,
                user_id: user_id.clone(),
            });
        }
        event.updated_at = updated_at;
        Ok(event.clone())
    }
}
