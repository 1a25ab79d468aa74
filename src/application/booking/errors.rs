use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{BookingConflict, PostId, PostStatus, ReservationId, ValidationError};

use super::exclusion::DeadlineExceeded;

/// 予約調整アプリケーション層のエラー
///
/// ドメイン上の拒否理由はすべて個別のバリアントとして呼び出し元に返す。
#[derive(Debug, Error)]
pub enum BookingError {
    /// 物件が存在しない
    #[error("Post {0} not found")]
    PostNotFound(PostId),

    /// 物件が予約を受け付けられる状態にない
    #[error("Post {post_id} is not available for booking (status: {status})")]
    PostUnavailable { post_id: PostId, status: PostStatus },

    /// 既存の有効な予約と期間が重なる
    #[error("Requested dates overlap reservation {existing} ({start} to {end})")]
    DateRangeOverlap {
        existing: ReservationId,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// 開始日が終了日以降
    #[error("Invalid date range: {start} must be before {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// 必須項目の欠落
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// 項目の値が不正
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// 有効な予約が見つからない（存在しない・取消済み）
    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// 排他ゲート取得前に呼び出し元の期限を過ぎた
    #[error("Deadline exceeded before the booking could be processed")]
    DeadlineExceeded,

    /// PostRegistryのエラー
    #[error("Post registry error")]
    PostRegistryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ReservationLedgerのエラー
    #[error("Reservation ledger error")]
    LedgerError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// EventStoreのエラー
    #[error("Event store error")]
    EventStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// 物件側の競合を、対象の物件IDを添えて変換する
    pub fn from_conflict(post_id: PostId, conflict: BookingConflict) -> Self {
        match conflict {
            BookingConflict::PostUnavailable(status) => {
                BookingError::PostUnavailable { post_id, status }
            }
            BookingConflict::DateRangeOverlap { existing, range } => {
                BookingError::DateRangeOverlap {
                    existing,
                    start: range.start(),
                    end: range.end(),
                }
            }
        }
    }

    /// 安定した理由コード（クライアントの表示切り替え用）
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::PostNotFound(_) => "POST_NOT_FOUND",
            BookingError::PostUnavailable { .. } => "POST_UNAVAILABLE",
            BookingError::DateRangeOverlap { .. } => "DATE_RANGE_OVERLAP",
            BookingError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            BookingError::MissingRequiredField(_) => "MISSING_REQUIRED_FIELD",
            BookingError::InvalidField { .. } => "INVALID_FIELD",
            BookingError::ReservationNotFound(_) => "RESERVATION_NOT_FOUND",
            BookingError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            BookingError::PostRegistryError(_) => "POST_REGISTRY_ERROR",
            BookingError::LedgerError(_) => "RESERVATION_LEDGER_ERROR",
            BookingError::EventStoreError(_) => "EVENT_STORE_ERROR",
        }
    }

    /// 拒否の原因となった項目（UIのフィールド名）
    pub fn field(&self) -> Option<&'static str> {
        match self {
            BookingError::PostNotFound(_) | BookingError::PostUnavailable { .. } => Some("postId"),
            BookingError::DateRangeOverlap { .. } | BookingError::InvalidDateRange { .. } => {
                Some("dateDebut")
            }
            BookingError::MissingRequiredField(field) => Some(*field),
            BookingError::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl From<ValidationError> for BookingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingRequiredField(field) => {
                BookingError::MissingRequiredField(field)
            }
            ValidationError::InvalidField { field, reason } => {
                BookingError::InvalidField { field, reason }
            }
            ValidationError::InvalidDateRange { start, end } => {
                BookingError::InvalidDateRange { start, end }
            }
        }
    }
}

impl From<DeadlineExceeded> for BookingError {
    fn from(_: DeadlineExceeded) -> Self {
        BookingError::DeadlineExceeded
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingError>;
