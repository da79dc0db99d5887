//! HTTP API DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

/// Event detail response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDto {
    pub id: u64,
    pub name: String,
    pub location: String,
    /// RFC 3339 (UTC)
    pub date: String,
    pub description: String,
    pub creator_id: String,
    pub members: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// `POST /events` request body
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub location: String,
    /// RFC 3339, or `YYYY-MM-DD` for midnight UTC
    #[serde(deserialize_with = "event_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

fn event_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(date) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| {
            de::Error::custom(format!(
                "invalid date '{raw}', expected YYYY-MM-DD or RFC 3339"
            ))
        })
}

/// `POST /register` request body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /login` request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registered user (never includes the password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// `POST /login` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDto {
    pub token: String,
    pub token_type: String,
    /// RFC 3339 (UTC)
    pub expires_at: String,
}

/// `GET /events` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEventsQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub connections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(date: &str) -> Result<CreateEventRequest, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "name": "Rust meetup",
            "location": "Tokyo",
            "date": date,
        }))
    }

    #[test]
    fn test_event_date_accepts_rfc3339_and_plain_date() {
        // テスト項目: 日付は RFC 3339 と YYYY-MM-DD（UTC の 0 時）のどちらでも受け付ける
        // given (前提条件):
        let rfc3339 = "2030-01-01T10:00:00+09:00";
        let plain = "2030-01-01";

        // when (操作):
        let with_time = parse(rfc3339).unwrap();
        let date_only = parse(plain).unwrap();

        // then (期待する結果):
        assert_eq!(with_time.date.to_rfc3339(), "2030-01-01T01:00:00+00:00");
        assert_eq!(date_only.date.to_rfc3339(), "2030-01-01T00:00:00+00:00");
        assert_eq!(date_only.description, "");
    }

    #[test]
    fn test_event_date_rejects_other_formats() {
        // テスト項目: どちらの形式でもない日付はエラーになる
        for date in ["01/02/2030", "2030-13-01", "tomorrow"] {
            let error = parse(date).unwrap_err().to_string();
            assert!(error.contains("expected YYYY-MM-DD or RFC 3339"), "{error}");
        }
    }
}
