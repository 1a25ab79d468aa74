use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::booking::BookingError;
use crate::domain::{
    CallerId, DomainEvent, PostId, commands::RequestBooking, post::Post, reservation::Reservation,
};

// ============================================================================
// Requests
// ============================================================================

/// 価格はUIから数値でも文字列でも届く
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

/// 予約リクエスト（POST /reservations と POST /api/DateReserve）
///
/// UIのフォームをそのまま受け取る。項目の検証はコーディネーターが行うため、
/// ここでは型の変換だけを行う。
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(rename = "CIN", default)]
    pub cin: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(rename = "postId", default)]
    pub post_id: Option<String>,
    #[serde(rename = "dateDebut", default)]
    pub date_debut: Option<String>,
    #[serde(rename = "dateFine", default)]
    pub date_fine: Option<String>,
}

impl BookingRequest {
    /// リクエストをコマンドに変換する
    ///
    /// 空文字の日付は未指定として扱う。
    pub fn to_command(
        &self,
        requested_by: Option<CallerId>,
        deadline: Option<DateTime<Utc>>,
        requested_at: DateTime<Utc>,
    ) -> Result<RequestBooking, BookingError> {
        let post_id = parse_post_id(self.post_id.as_deref())?;
        let price = self.price.as_ref().map(parse_price).transpose()?.flatten();

        Ok(RequestBooking {
            post_id,
            full_name: self.full_name.clone().unwrap_or_default(),
            cin: self.cin.clone().unwrap_or_default(),
            price,
            date_start: parse_date("dateDebut", self.date_debut.as_deref())?,
            date_end: parse_date("dateFine", self.date_fine.as_deref())?,
            requested_by,
            requested_at,
            deadline,
        })
    }
}

fn parse_post_id(raw: Option<&str>) -> Result<PostId, BookingError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(BookingError::MissingRequiredField("postId"))?;

    Uuid::parse_str(raw)
        .map(PostId::from_uuid)
        .map_err(|e| BookingError::InvalidField {
            field: "postId",
            reason: e.to_string(),
        })
}

/// 空文字は未指定（`None`）
fn parse_price(input: &PriceInput) -> Result<Option<f64>, BookingError> {
    match input {
        PriceInput::Number(value) => Ok(Some(*value)),
        PriceInput::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|e| BookingError::InvalidField {
                    field: "price",
                    reason: e.to_string(),
                })
        }
    }
}

/// `YYYY-MM-DD` またはRFC 3339の日時（日付部分のみ使う）
fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, BookingError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|e| BookingError::InvalidField {
            field,
            reason: e.to_string(),
        })
}

/// 物件登録リクエスト（POST /posts）
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPostRequest {
    pub title: String,
    pub category: String,
}

/// 物件一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// カテゴリでフィルタリング（大文字小文字を区別しない）
    pub category: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// 物件レスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub post_id: Uuid,
    pub title: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            post_id: post.post_id.value(),
            title: post.title,
            category: post.category.to_string(),
            status: post.status.as_str().to_string(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// 物件詳細レスポンス（GET /posts/:id）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub active_reservations: usize,
}

/// 予約レスポンス
///
/// 項目名はUIの予約フォームに合わせる。
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    #[serde(rename = "reservationId")]
    pub reservation_id: Uuid,
    #[serde(rename = "postId")]
    pub post_id: Uuid,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "CIN")]
    pub cin: String,
    pub price: f64,
    #[serde(rename = "dateDebut")]
    pub date_debut: Option<NaiveDate>,
    #[serde(rename = "dateFine")]
    pub date_fine: Option<NaiveDate>,
    pub state: String,
    #[serde(rename = "requestedBy")]
    pub requested_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "cancelledAt")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            reservation_id: reservation.reservation_id.value(),
            post_id: reservation.post_id.value(),
            full_name: reservation.customer_name.as_str().to_string(),
            cin: reservation.cin.as_str().to_string(),
            price: reservation.price.value(),
            date_debut: reservation.period.map(|p| p.start()),
            date_fine: reservation.period.map(|p| p.end()),
            state: reservation.state.as_str().to_string(),
            requested_by: reservation.requested_by.map(|c| c.as_str().to_string()),
            created_at: reservation.created_at,
            cancelled_at: reservation.cancelled_at,
        }
    }
}

/// 予約履歴の1件（GET /posts/:id/history）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub event_type: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl From<DomainEvent> for HistoryEntryResponse {
    fn from(event: DomainEvent) -> Self {
        Self {
            event_type: event.event_type(),
            occurred_at: event.occurred_at(),
            event,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: Option<&str>) -> Self {
        self.field = field.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> BookingRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_price_accepts_number_and_numeric_string() {
        let post_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let numeric = request(serde_json::json!({ "postId": post_id, "price": 450 }));
        assert_eq!(numeric.to_command(None, None, now).unwrap().price, Some(450.0));

        let text = request(serde_json::json!({ "postId": post_id, "price": " 450.5 " }));
        assert_eq!(text.to_command(None, None, now).unwrap().price, Some(450.5));

        let empty = request(serde_json::json!({ "postId": post_id, "price": "" }));
        assert_eq!(empty.to_command(None, None, now).unwrap().price, None);
    }

    #[test]
    fn test_price_rejects_non_numeric_string() {
        let req = request(serde_json::json!({ "postId": Uuid::new_v4(), "price": "cheap" }));
        let err = req.to_command(None, None, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_FIELD");
        assert_eq!(err.field(), Some("price"));
    }

    #[test]
    fn test_empty_dates_are_absent() {
        let req = request(serde_json::json!({
            "postId": Uuid::new_v4(),
            "dateDebut": "",
            "dateFine": "  ",
        }));
        let cmd = req.to_command(None, None, Utc::now()).unwrap();
        assert_eq!(cmd.date_start, None);
        assert_eq!(cmd.date_end, None);
    }

    #[test]
    fn test_dates_accept_plain_and_rfc3339() {
        let req = request(serde_json::json!({
            "postId": Uuid::new_v4(),
            "dateDebut": "2024-06-01",
            "dateFine": "2024-06-10T00:00:00.000Z",
        }));
        let cmd = req.to_command(None, None, Utc::now()).unwrap();
        assert_eq!(cmd.date_start, "2024-06-01".parse().ok());
        assert_eq!(cmd.date_end, "2024-06-10".parse().ok());
    }

    #[test]
    fn test_missing_post_id() {
        let req = request(serde_json::json!({ "fullName": "Yassine" }));
        let err = req.to_command(None, None, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "MISSING_REQUIRED_FIELD");
        assert_eq!(err.field(), Some("postId"));
    }
}
