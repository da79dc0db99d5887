//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{EventId, Identity, RepositoryError, Timestamp, ValueObjectError},
    infrastructure::dto::http::{
        CreateEventRequest, ErrorResponse, EventDto, HealthDto, ListEventsQuery, LoginRequest,
        RegisterRequest, TokenDto, UserDto,
    },
    ui::state::AppState,
    usecase::{CreateEventInput, EventError, RegisterUserInput, UserError},
};

/// HTTP API のエラーレスポンス
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    /// 詳細はログにだけ残し、クライアントには固定の文言を返す
    Internal,
}

impl From<ValueObjectError> for ApiError {
    fn from(e: ValueObjectError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<EventError> for ApiError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::InvalidInput(_) | EventError::InvalidPage => {
                Self::BadRequest(e.to_string())
            }
            EventError::Repository(RepositoryError::EventNotFound(_)) => {
                Self::NotFound(e.to_string())
            }
            EventError::Repository(
                RepositoryError::AlreadyMember { .. }
                | RepositoryError::NotMember { .. }
                | RepositoryError::EmailTaken(_),
            ) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::InvalidInput(_) => Self::BadRequest(e.to_string()),
            UserError::InvalidLogin => Self::Unauthorized(e.to_string()),
            UserError::Repository(RepositoryError::EmailTaken(_)) => {
                Self::Conflict(e.to_string())
            }
            UserError::Auth(_) | UserError::Repository(_) => {
                tracing::error!(error = %e, "user request failed");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::Conflict(m) => (StatusCode::CONFLICT, m),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub(crate) fn parse_event_id(raw: &str) -> Result<EventId, ApiError> {
    raw.parse::<EventId>().map_err(|e| {
        tracing::warn!("Invalid event id: '{}'", raw);
        ApiError::from(e)
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.registry.len(),
    })
}

/// Register a user account
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let input = RegisterUserInput {
        name: request.name,
        email: request.email,
        password: request.password,
    };
    let user = state.register_user_usecase.execute(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange email and password for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenDto>, ApiError> {
    let token = state
        .login_usecase
        .execute(request.email, request.password)
        .await?;
    Ok(Json(token.into()))
}

/// Create an event (the caller becomes its first member)
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventDto>), ApiError> {
    let input = CreateEventInput {
        name: request.name,
        location: request.location,
        date: Timestamp::new(request.date.timestamp_millis()),
        description: request.description,
    };
    let event = state.create_event_usecase.execute(&identity, input).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Get list of events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<EventDto>>, ApiError> {
    let events = state
        .list_events_usecase
        .execute(query.page, query.page_size)
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(events.into_iter().map(EventDto::from).collect()))
}

/// Get event detail by ID
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<EventDto>, ApiError> {
    let id = parse_event_id(&raw_id)?;
    let event = state.get_event_usecase.execute(id).await?;
    Ok(Json(event.into()))
}

pub async fn join_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(raw_id): Path<String>,
) -> Result<Json<EventDto>, ApiError> {
    let id = parse_event_id(&raw_id)?;
    let event = state.join_event_usecase.execute(id, &identity).await?;
    Ok(Json(event.into()))
}

pub async fn leave_event(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(raw_id): Path<String>,
) -> Result<Json<EventDto>, ApiError> {
    let id = parse_event_id(&raw_id)?;
    let event = state.leave_event_usecase.execute(id, &identity).await?;
    Ok(Json(event.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn test_event_error_status_mapping() {
        // テスト項目: ユースケースのエラーが HTTP ステータスに対応付けられる
        let alice = UserId::new("alice".to_string()).unwrap();
        let cases = [
            (EventError::InvalidPage, StatusCode::BAD_REQUEST),
            (
                EventError::InvalidInput(ValueObjectError::EventNameEmpty),
                StatusCode::BAD_REQUEST,
            ),
            (
                EventError::Repository(RepositoryError::EventNotFound(EventId::new(1))),
                StatusCode::NOT_FOUND,
            ),
            (
                EventError::Repository(RepositoryError::AlreadyMember {
                    event_id: EventId::new(1),
                    user_id: alice.clone(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                EventError::Repository(RepositoryError::NotMember {
                    event_id: EventId::new(1),
                    user_id: alice,
                }),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_malformed_event_id_is_bad_request() {
        // テスト項目: 数値でないイベント ID は 400
        let result = parse_event_id("abc");
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(parse_event_id("42").unwrap(), EventId::new(42));
    }

    #[test]
    fn test_user_error_status_mapping() {
        // テスト項目: 登録・ログインのエラーが HTTP ステータスに対応付けられる
        let email = crate::domain::Email::new("alice@example.com".to_string()).unwrap();
        let cases = [
            (
                UserError::InvalidInput(ValueObjectError::PasswordTooShort(8)),
                StatusCode::BAD_REQUEST,
            ),
            (UserError::InvalidLogin, StatusCode::UNAUTHORIZED),
            (
                UserError::Repository(RepositoryError::EmailTaken(email)),
                StatusCode::CONFLICT,
            ),
            (
                UserError::Auth(crate::domain::AuthError::HashFailed("oom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
