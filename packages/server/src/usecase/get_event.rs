//! UseCase: イベント詳細取得

use std::sync::Arc;

use crate::domain::{Event, EventId, EventRepository};

use super::error::EventError;

pub struct GetEventUseCase {
    repository: Arc<dyn EventRepository>,
}

impl GetEventUseCase {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id: EventId) -> Result<Event, EventError> {
        Ok(self.repository.get(id).await?)
    }
}
