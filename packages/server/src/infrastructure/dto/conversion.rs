//! Conversion logic between DTOs and domain entities.

use tsudoi_shared::time::timestamp_to_rfc3339;

use crate::domain::{AccessToken, entity};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::ChatMessage> for dto::ChatMessage {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            r#type: dto::MessageType::Chat,
            id: model.id.as_str().to_string(),
            room_id: model.room_id.into_string(),
            sender_id: model.sender_id.into_string(),
            content: model.content.into_string(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<entity::Event> for http::EventDto {
    fn from(model: entity::Event) -> Self {
        Self {
            id: model.id.value(),
            name: model.name,
            location: model.location,
            date: timestamp_to_rfc3339(model.date.value()),
            description: model.description,
            creator_id: model.creator_id.into_string(),
            members: model.members.into_iter().map(|m| m.into_string()).collect(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
            updated_at: timestamp_to_rfc3339(model.updated_at.value()),
        }
    }
}

impl From<entity::User> for http::UserDto {
    fn from(model: entity::User) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name.as_str().to_string(),
            email: model.email.as_str().to_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<AccessToken> for http::TokenDto {
    fn from(token: AccessToken) -> Self {
        Self {
            token: token.token,
            token_type: "Bearer".to_string(),
            expires_at: timestamp_to_rfc3339(token.expires_at.value()),
        }
    }
}
