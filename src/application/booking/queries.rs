use crate::domain::{Category, DomainEvent, PostId, ReservationId, post::Post, reservation::Reservation};

use super::booking_service::{ServiceDependencies, load_post};
use super::errors::{BookingError, Result};

/// 物件をIDで取得する
pub async fn get_post(deps: &ServiceDependencies, post_id: PostId) -> Result<Post> {
    load_post(&deps.post_registry, post_id).await
}

/// 予約受付中の物件を一覧する
///
/// レジストリが返す現在の状態をそのまま返す。
pub async fn list_available_posts(
    deps: &ServiceDependencies,
    category: Option<&Category>,
) -> Result<Vec<Post>> {
    deps.post_registry
        .list_available(category)
        .await
        .map_err(BookingError::PostRegistryError)
}

/// 物件の有効な予約を一覧する
///
/// 排他ゲートは取らないため、並行する予約処理の途中経過は見えない
/// （台帳に保存済みのものだけが返る）。
pub async fn list_active_reservations(
    deps: &ServiceDependencies,
    post_id: PostId,
) -> Result<Vec<Reservation>> {
    load_post(&deps.post_registry, post_id).await?;

    deps.reservation_ledger
        .list_active_for_post(post_id)
        .await
        .map_err(BookingError::LedgerError)
}

/// 予約をIDで取得する（取消済みも含む）
pub async fn get_reservation(
    deps: &ServiceDependencies,
    reservation_id: ReservationId,
) -> Result<Reservation> {
    deps.reservation_ledger
        .get_by_id(reservation_id)
        .await
        .map_err(BookingError::LedgerError)?
        .ok_or(BookingError::ReservationNotFound(reservation_id))
}

/// 物件の予約履歴を追加順に取得する
pub async fn post_history(deps: &ServiceDependencies, post_id: PostId) -> Result<Vec<DomainEvent>> {
    load_post(&deps.post_registry, post_id).await?;

    deps.event_store
        .load(post_id)
        .await
        .map_err(BookingError::EventStoreError)
}
