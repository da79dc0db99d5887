//! Domain layer: value objects, entities and the interfaces the core depends on.

pub mod broker;
pub mod cache;
pub mod entity;
pub mod error;
pub mod identity;
pub mod repository;
pub mod value_object;

pub use broker::{
    Broker, BrokerDelivery, BrokerStream, PayloadEncoder, ROOM_TOPIC_PATTERN, ROOM_TOPIC_PREFIX,
    RoomTopic,
};
pub use cache::ResponseCache;
pub use entity::{ChatMessage, Event, NewChatMessage, NewEvent, NewUser, User};
pub use error::{AuthError, BrokerError, RepositoryError, StoreError, ValueObjectError};
pub use identity::{AccessToken, CredentialHasher, Identity, IdentityResolver, TokenIssuer};
pub use repository::{EventRepository, MessageStore, UserRepository};
pub use value_object::{
    ConnectionId, Email, EventId, MessageContent, MessageId, Password, RoomId, Timestamp,
    UserId, UserName,
};

#[cfg(test)]
pub use broker::MockBroker;
#[cfg(test)]
pub use identity::MockCredentialHasher;
#[cfg(test)]
pub use repository::{MockMessageStore, MockUserRepository};
