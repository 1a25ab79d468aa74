use crate::domain::{
    PostId, ReservationId,
    reservation::{PendingReservation, Reservation},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[allow(dead_code)]
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約台帳ポート
///
/// コミット済み・取消済みの予約を保存する。
/// 重複や期間の重なりは再検証しない（予約調整サービスの排他ゲートの内側でのみ書き込まれる）。
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// 物件の有効な（取消されていない）予約を取得する
    async fn list_active_for_post(&self, post_id: PostId) -> Result<Vec<Reservation>>;

    /// 予約を保存する
    ///
    /// IDを採番し、Committed 状態で保存したものを返す。
    async fn insert(
        &self,
        pending: PendingReservation,
        committed_at: DateTime<Utc>,
    ) -> Result<Reservation>;

    /// 予約を取り消す
    ///
    /// 有効な予約が見つからない場合（存在しない・取消済み）は `None`。
    async fn cancel(
        &self,
        reservation_id: ReservationId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Reservation>>;

    /// コミットを取り消して予約を物理的に破棄する
    ///
    /// ステータス遷移に失敗した予約を、観測される前に取り除くためだけに使う。
    async fn discard(&self, reservation_id: ReservationId) -> Result<()>;

    /// IDで予約を取得する（状態を問わない）
    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>>;
}
