//! UseCase: イベント参加

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{Event, EventId, EventRepository, Identity, Timestamp};

use super::error::EventError;

pub struct JoinEventUseCase {
    repository: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
}

impl JoinEventUseCase {
    pub fn new(repository: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(&self, id: EventId, identity: &Identity) -> Result<Event, EventError> {
        let now = Timestamp::new(self.clock.now_millis());
        let event = self
            .repository
            .add_member(id, identity.user_id.clone(), now)
            .await?;
        tracing::info!(event_id = %id, user_id = %identity.user_id, "joined event");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{NewEvent, RepositoryError, UserId},
        infrastructure::repository::InMemoryEventRepository,
    };
    use tsudoi_shared::time::FixedClock;

    #[tokio::test]
    async fn test_join_event() {
        // テスト項目: 参加するとメンバーに追加され、二重参加はエラーになる
        // given (前提条件):
        let repository = Arc::new(InMemoryEventRepository::new());
        let alice = UserId::new("alice".to_string()).unwrap();
        let event = repository
            .create(
                NewEvent::new(
                    "meetup".to_string(),
                    "Tokyo".to_string(),
                    Timestamp::new(0),
                    String::new(),
                    alice,
                )
                .unwrap(),
                Timestamp::new(0),
            )
            .await
            .unwrap();
        let usecase = JoinEventUseCase::new(repository, Arc::new(FixedClock::new(500)));
        let bob = Identity::new(UserId::new("bob".to_string()).unwrap());

        // when (操作):
        let joined = usecase.execute(event.id, &bob).await.unwrap();
        let again = usecase.execute(event.id, &bob).await;

        // then (期待する結果):
        assert!(joined.is_member(&bob.user_id));
        assert_eq!(joined.updated_at, Timestamp::new(500));
        assert!(matches!(
            again,
            Err(EventError::Repository(RepositoryError::AlreadyMember { .. }))
        ));
    }

    #[tokio::test]
    async fn test_join_unknown_event() {
        // テスト項目: 存在しないイベントには参加できない
        let usecase = JoinEventUseCase::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(FixedClock::new(0)),
        );
        let bob = Identity::new(UserId::new("bob".to_string()).unwrap());

        let result = usecase.execute(EventId::new(1), &bob).await;

        assert_eq!(
            result,
            Err(EventError::Repository(RepositoryError::EventNotFound(
                EventId::new(1)
            )))
        );
    }
}
