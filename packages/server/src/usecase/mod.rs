//! UseCase 層
//!
//! 1 ファイル 1 ユースケース。ドメイン層の trait にのみ依存する。

pub mod create_event;
pub mod error;
pub mod get_event;
pub mod join_event;
pub mod leave_event;
pub mod list_events;
pub mod login;
pub mod register_user;
pub mod replay_history;
pub mod send_message;

pub use create_event::{CreateEventInput, CreateEventUseCase};
pub use error::{EventError, ReplayError, SendMessageError, UserError};
pub use get_event::GetEventUseCase;
pub use join_event::JoinEventUseCase;
pub use leave_event::LeaveEventUseCase;
pub use list_events::{DEFAULT_PAGE_SIZE, ListEventsUseCase, MAX_PAGE_SIZE};
pub use login::LoginUseCase;
pub use register_user::{RegisterUserInput, RegisterUserUseCase};
pub use replay_history::ReplayHistoryUseCase;
pub use send_message::SendMessageUseCase;
