//! UseCase: イベント一覧取得

use std::sync::Arc;

use crate::domain::{Event, EventRepository};

use super::error::EventError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// イベント一覧取得のユースケース
pub struct ListEventsUseCase {
    repository: Arc<dyn EventRepository>,
}

impl ListEventsUseCase {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    /// `page` は 1 始まり。`page_size` は `MAX_PAGE_SIZE` で頭打ちになる。
    pub async fn execute(
        &self,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> Result<Vec<Event>, EventError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(EventError::InvalidPage);
        }
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(page_size);
        Ok(self.repository.list(offset, page_size).await?)
    }
}
