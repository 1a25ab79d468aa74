use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CallerId, CancelReservationError, Cin, CustomerName, DateRange, PostId, Price,
    ReservationCancelled, ReservationCommitted, ReservationId, ReservationState, ValidationError,
    commands::RequestBooking, post::Post,
};

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// 検証済みだがまだコミットされていない予約
///
/// IDを持たない。コミットされるまで台帳には存在せず、
/// 拒否された場合はそのまま破棄される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReservation {
    pub post_id: PostId,
    pub customer_name: CustomerName,
    pub cin: Cin,
    pub price: Price,
    /// `Location`カテゴリの物件でのみ存在する
    pub period: Option<DateRange>,
    pub requested_by: Option<CallerId>,
    pub requested_at: DateTime<Utc>,
}

impl PendingReservation {
    pub fn state(&self) -> ReservationState {
        ReservationState::Pending
    }
}

/// 台帳に保存された予約（Committed または Cancelled）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    // 識別子
    pub reservation_id: ReservationId,

    // 他の集約への参照（IDのみ）
    pub post_id: PostId,

    // 顧客情報（不透明な値として保持）
    pub customer_name: CustomerName,
    pub cin: Cin,
    pub price: Price,

    pub period: Option<DateRange>,
    pub state: ReservationState,

    // 監査情報
    pub requested_by: Option<CallerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// 純粋関数：予約リクエストを物件のカテゴリに照らして検証する
///
/// ビジネスルール：
/// - 氏名・CIN・価格は必須
/// - `Location`では開始日・終了日ともに必須で、開始日 < 終了日
/// - それ以外のカテゴリでは日付は持たない（渡されても捨てる）
///
/// 副作用なし。物件の状態（空き状況）はここでは見ない。
pub fn prepare_reservation(
    post: &Post,
    cmd: &RequestBooking,
) -> Result<PendingReservation, ValidationError> {
    let customer_name = CustomerName::parse(&cmd.full_name)?;
    let cin = Cin::parse(&cmd.cin)?;
    let price = cmd
        .price
        .ok_or(ValidationError::MissingRequiredField("price"))
        .and_then(Price::new)?;

    let period = if post.category.requires_date_range() {
        let start = cmd
            .date_start
            .ok_or(ValidationError::MissingRequiredField("dateDebut"))?;
        let end = cmd
            .date_end
            .ok_or(ValidationError::MissingRequiredField("dateFine"))?;
        Some(DateRange::new(start, end)?)
    } else {
        None
    };

    Ok(PendingReservation {
        post_id: post.post_id,
        customer_name,
        cin,
        price,
        period,
        requested_by: cmd.requested_by.clone(),
        requested_at: cmd.requested_at,
    })
}

/// 純粋関数：予約をコミットする
///
/// 台帳がIDを採番した時点で呼ばれる。Pending → Committed。
pub fn commit(
    pending: PendingReservation,
    reservation_id: ReservationId,
    committed_at: DateTime<Utc>,
) -> Reservation {
    Reservation {
        reservation_id,
        post_id: pending.post_id,
        customer_name: pending.customer_name,
        cin: pending.cin,
        price: pending.price,
        period: pending.period,
        state: ReservationState::Committed,
        requested_by: pending.requested_by,
        created_at: committed_at,
        updated_at: committed_at,
        cancelled_at: None,
    }
}

/// 純粋関数：予約を取り消す
///
/// ビジネスルール：
/// - 取消済みの予約は再度取り消せない
///
/// 副作用なし。取消後のReservationを返す。
pub fn cancel(
    reservation: &Reservation,
    cancelled_at: DateTime<Utc>,
) -> Result<Reservation, CancelReservationError> {
    if !reservation.is_active() {
        return Err(CancelReservationError::AlreadyCancelled);
    }

    Ok(Reservation {
        state: ReservationState::Cancelled,
        updated_at: cancelled_at,
        cancelled_at: Some(cancelled_at),
        ..reservation.clone()
    })
}

/// 純粋関数：期間が重なる有効な予約を探す
///
/// 期間を持たない予約（`Location`以外）は対象外。
pub fn find_overlap<'a>(
    period: &DateRange,
    reservations: &'a [Reservation],
) -> Option<&'a Reservation> {
    reservations.iter().find(|r| {
        r.is_active()
            && r.period
                .as_ref()
                .is_some_and(|existing| existing.overlaps(period))
    })
}

impl From<&Reservation> for ReservationCommitted {
    fn from(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.reservation_id,
            post_id: reservation.post_id,
            period: reservation.period,
            requested_by: reservation.requested_by.clone(),
            committed_at: reservation.created_at,
        }
    }
}

impl ReservationCancelled {
    /// 取消後の予約からイベントを作る（取消を依頼した呼び出し元を記録する）
    pub fn from_cancelled(reservation: &Reservation, requested_by: Option<CallerId>) -> Self {
        Self {
            reservation_id: reservation.reservation_id,
            post_id: reservation.post_id,
            requested_by,
            cancelled_at: reservation.cancelled_at.unwrap_or(reservation.updated_at),
        }
    }
}
