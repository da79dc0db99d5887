//! UseCase: イベント作成

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{Event, EventRepository, Identity, NewEvent, Timestamp};

use super::error::EventError;

/// イベント作成の入力
#[derive(Debug, Clone)]
pub struct CreateEventInput {
    pub name: String,
    pub location: String,
    pub date: Timestamp,
    pub description: String,
}

/// イベント作成のユースケース
///
/// 作成者は最初のメンバーとして登録される。
pub struct CreateEventUseCase {
    repository: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateEventUseCase {
    pub fn new(repository: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(
        &self,
        creator: &Identity,
        input: CreateEventInput,
    ) -> Result<Event, EventError> {
        let event = NewEvent::new(
            input.name,
            input.location,
            input.date,
            input.description,
            creator.user_id.clone(),
        )?;
        let created_at = Timestamp::new(self.clock.now_millis());
        let event = self.repository.create(event, created_at).await?;
        tracing::info!(event_id = %event.id, creator = %creator.user_id, "event created");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{UserId, ValueObjectError},
        infrastructure::repository::InMemoryEventRepository,
    };
    use tsudoi_shared::time::FixedClock;

    fn input(name: &str) -> CreateEventInput {
        CreateEventInput {
            name: name.to_string(),
            location: "Tokyo".to_string(),
            date: Timestamp::new(1_700_000_000_000),
            description: "monthly".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_event_success() {
        // テスト項目: 作成者がメンバーとなったイベントが作成される
        // given (前提条件):
        let usecase = CreateEventUseCase::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(FixedClock::new(1000)),
        );
        let alice = Identity::new(UserId::new("alice".to_string()).unwrap());

        // when (操作):
        let event = usecase.execute(&alice, input("Rust meetup")).await.unwrap();

        // then (期待する結果):
        assert_eq!(event.name, "Rust meetup");
        assert_eq!(event.members, vec![alice.user_id.clone()]);
        assert_eq!(event.created_at, Timestamp::new(1000));
    }

    #[tokio::test]
    async fn test_create_event_with_blank_name() {
        // テスト項目: 名前が空白のイベントは作成できない
        // given (前提条件):
        let usecase = CreateEventUseCase::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(FixedClock::new(1000)),
        );
        let alice = Identity::new(UserId::new("alice".to_string()).unwrap());

        // when (操作):
        let result = usecase.execute(&alice, input("  ")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(EventError::InvalidInput(ValueObjectError::EventNameEmpty))
        );
    }
}
