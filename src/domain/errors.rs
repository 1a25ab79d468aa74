use chrono::NaiveDate;

use super::{DateRange, PostStatus, ReservationId};

/// 入力検証エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 必須項目が欠けている（項目名はUIのフィールド名）
    MissingRequiredField(&'static str),
    /// 値が不正
    InvalidField { field: &'static str, reason: String },
    /// 開始日が終了日以降
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// 予約受付時の物件側の競合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingConflict {
    /// 物件が予約を受け付けられる状態にない
    PostUnavailable(PostStatus),
    /// 既存の有効な予約と期間が重なる
    DateRangeOverlap {
        existing: ReservationId,
        range: DateRange,
    },
}

/// 予約取消のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReservationError {
    /// 既に取消済み
    AlreadyCancelled,
}
