//! UseCase: イベント退出

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{Event, EventId, EventRepository, Identity, Timestamp};

use super::error::EventError;

pub struct LeaveEventUseCase {
    repository: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
}

impl LeaveEventUseCase {
    pub fn new(repository: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(&self, id: EventId, identity: &Identity) -> Result<Event, EventError> {
        let now = Timestamp::new(self.clock.now_millis());
        let event = self
            .repository
            .remove_member(id, &identity.user_id, now)
            .await?;
        tracing::info!(event_id = %id, user_id = %identity.user_id, "left event");
        Ok(event)
    }
}
