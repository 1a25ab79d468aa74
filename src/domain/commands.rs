use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{CallerId, Category, PostId, ReservationId};

/// コマンド：物件を予約する
///
/// UIの予約フォーム1回の送信に対応する。各項目は未検証のまま受け取り、
/// 物件のカテゴリが判明してから検証する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBooking {
    pub post_id: PostId,
    pub full_name: String,
    pub cin: String,
    pub price: Option<f64>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub requested_by: Option<CallerId>,
    pub requested_at: DateTime<Utc>,
    /// 呼び出し元の期限。排他ゲート取得前にのみ参照される
    pub deadline: Option<DateTime<Utc>>,
}

/// コマンド：予約を取り消す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub reservation_id: ReservationId,
    pub cancelled_at: DateTime<Utc>,
    pub requested_by: Option<CallerId>,
}

/// コマンド：物件を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPost {
    pub title: String,
    pub category: Category,
    pub registered_at: DateTime<Utc>,
}

/// コマンド：物件の掲載を停止する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPost {
    pub post_id: PostId,
    pub withdrawn_at: DateTime<Utc>,
}

/// コマンド：掲載停止中の物件を再掲載する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelistPost {
    pub post_id: PostId,
    pub relisted_at: DateTime<Utc>,
}
