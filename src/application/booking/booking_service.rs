use crate::domain::{
    self, BookingConflict, DomainEvent, PostId, ReservationCancelled, ReservationCommitted,
    commands::{CancelBooking, RequestBooking},
    post::{Post, StatusTransition},
    reservation::Reservation,
};
use crate::ports::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::errors::{BookingError, Result};
use super::exclusion::ExclusionGate;

/// ステータス遷移（compare-and-swap）の最大試行回数（初回 + 再試行1回）
const MAX_TRANSITION_ATTEMPTS: usize = 2;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞いは持たず、純粋な関数に依存関係を渡す。
///
/// 排他ゲートは同じストアを共有するすべての呼び出しで1つでなければならない。
/// `Clone`はゲートを共有する。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub post_registry: Arc<dyn PostRegistry>,
    pub reservation_ledger: Arc<dyn ReservationLedger>,
    pub event_store: Arc<dyn EventStore>,
    pub exclusion_gate: Arc<ExclusionGate>,
}

impl ServiceDependencies {
    pub fn new(
        post_registry: Arc<dyn PostRegistry>,
        reservation_ledger: Arc<dyn ReservationLedger>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            post_registry,
            reservation_ledger,
            event_store,
            exclusion_gate: Arc::new(ExclusionGate::new()),
        }
    }
}

/// レジストリから物件を取得するヘルパー関数
///
/// # エラー
/// - PostRegistryError: 読み込み失敗
/// - PostNotFound: 物件が存在しない
pub(super) async fn load_post(registry: &Arc<dyn PostRegistry>, post_id: PostId) -> Result<Post> {
    registry
        .get(post_id)
        .await
        .map_err(BookingError::PostRegistryError)?
        .ok_or(BookingError::PostNotFound(post_id))
}

async fn load_active_reservations(
    ledger: &Arc<dyn ReservationLedger>,
    post_id: PostId,
) -> Result<Vec<Reservation>> {
    ledger
        .list_active_for_post(post_id)
        .await
        .map_err(BookingError::LedgerError)
}

/// ステータスを compare-and-swap で遷移させるヘルパー関数
///
/// 競合（Conflict）は一時的な衝突として扱い、観測された現在値で
/// `reevaluate` をやり直したうえで最大 `MAX_TRANSITION_ATTEMPTS` 回まで試行する。
/// 上限に達した場合は PostUnavailable として報告する。
///
/// # 戻り値
/// 実際に適用した遷移。再評価の結果、遷移が不要になった場合は `None`。
pub(super) async fn transition_with_retry<F>(
    registry: &Arc<dyn PostRegistry>,
    post: &Post,
    planned: StatusTransition,
    changed_at: DateTime<Utc>,
    reevaluate: F,
) -> Result<Option<StatusTransition>>
where
    F: Fn(&Post) -> std::result::Result<Option<StatusTransition>, BookingConflict>,
{
    let mut transition = planned;
    let mut attempt = 1;

    loop {
        let outcome = registry
            .transition_status(post.post_id, transition.from, transition.to, changed_at)
            .await
            .map_err(BookingError::PostRegistryError)?;

        match outcome {
            TransitionOutcome::Applied => return Ok(Some(transition)),
            TransitionOutcome::NotFound => return Err(BookingError::PostNotFound(post.post_id)),
            TransitionOutcome::Conflict(actual) => {
                tracing::warn!(
                    post_id = %post.post_id,
                    expected = %transition.from,
                    %actual,
                    attempt,
                    "post status changed concurrently"
                );

                if attempt >= MAX_TRANSITION_ATTEMPTS {
                    return Err(BookingError::PostUnavailable {
                        post_id: post.post_id,
                        status: actual,
                    });
                }

                let observed = Post {
                    status: actual,
                    ..post.clone()
                };
                match reevaluate(&observed) {
                    Ok(Some(next)) => transition = next,
                    Ok(None) => return Ok(None),
                    Err(conflict) => return Err(BookingError::from_conflict(post.post_id, conflict)),
                }
                attempt += 1;
            }
        }
    }
}

/// 予約履歴を追記するヘルパー関数
///
/// 正本（レジストリと台帳）は更新済みのため、失敗しても操作自体は取り消さない。
pub(super) async fn record_history(
    event_store: &Arc<dyn EventStore>,
    post_id: PostId,
    events: Vec<DomainEvent>,
) {
    if let Err(e) = event_store.append(post_id, events).await {
        tracing::error!(%post_id, error = %e, "failed to append booking history");
    }
}

/// 物件を予約する
///
/// ビジネスルール：
/// - 物件が存在すること
/// - 入力が物件のカテゴリに対して妥当であること
/// - `Location`以外：物件が Available であること（コミット後 Taken）
/// - `Location`：物件が Available か Reserved で、期間が有効な予約と重ならないこと
///   （コミット後 Reserved）
///
/// # 一貫性保証
///
/// 状態の再読込からコミット（台帳保存 + ステータス遷移）までを物件の排他ゲートの
/// 内側で行う。ステータス遷移が最終的に失敗した場合は保存した予約を破棄するため、
/// 部分的なコミットは観測されない。
///
/// 呼び出し元の期限はゲート取得前にのみ参照する。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 予約コマンド
///
/// # 戻り値
/// 成功時はコミットされた予約
#[tracing::instrument(skip(deps, cmd), fields(post_id = %cmd.post_id))]
pub async fn request_booking(deps: &ServiceDependencies, cmd: RequestBooking) -> Result<Reservation> {
    // 1. 物件の存在確認
    let post = load_post(&deps.post_registry, cmd.post_id).await?;

    // 2. 入力検証（カテゴリに依存する）
    let pending = domain::reservation::prepare_reservation(&post, &cmd)?;
    if pending.period.is_none() && (cmd.date_start.is_some() || cmd.date_end.is_some()) {
        tracing::debug!(category = %post.category, "dropping dates for non-rental post");
    }

    // 3. 排他ゲートを取得（期限はここまで）
    let _guard = deps.exclusion_gate.acquire(post.post_id, cmd.deadline).await?;

    // 4. ゲートの内側で状態を読み直して再検証
    let post = load_post(&deps.post_registry, cmd.post_id).await?;
    let active = load_active_reservations(&deps.reservation_ledger, post.post_id).await?;
    let period = pending.period;
    let planned = domain::post::evaluate_booking(&post, period.as_ref(), &active)
        .map_err(|conflict| BookingError::from_conflict(post.post_id, conflict))?;

    // 5. 台帳に保存
    let committed_at = Utc::now();
    let reservation = deps
        .reservation_ledger
        .insert(pending, committed_at)
        .await
        .map_err(BookingError::LedgerError)?;

    // 6. ステータス遷移（失敗時は保存した予約を破棄）
    let applied = match planned {
        None => None,
        Some(transition) => {
            let result = transition_with_retry(
                &deps.post_registry,
                &post,
                transition,
                committed_at,
                |observed| domain::post::evaluate_booking(observed, period.as_ref(), &active),
            )
            .await;

            match result {
                Ok(applied) => applied,
                Err(e) => {
                    if let Err(discard_err) = deps
                        .reservation_ledger
                        .discard(reservation.reservation_id)
                        .await
                    {
                        tracing::error!(
                            reservation_id = %reservation.reservation_id,
                            error = %discard_err,
                            "failed to discard reservation after status transition failure"
                        );
                        return Err(BookingError::LedgerError(discard_err));
                    }
                    return Err(e);
                }
            }
        }
    };

    // 7. 予約履歴に記録
    let mut events = vec![DomainEvent::ReservationCommitted(ReservationCommitted::from(
        &reservation,
    ))];
    if let Some(transition) = applied {
        events.push(DomainEvent::PostStatusChanged(
            transition.to_event(post.post_id, committed_at),
        ));
    }
    record_history(&deps.event_store, post.post_id, events).await;

    tracing::info!(
        reservation_id = %reservation.reservation_id,
        category = %post.category,
        "reservation committed"
    );

    Ok(reservation)
}

/// 予約を取り消す
///
/// ビジネスルール：
/// - 有効な（取消されていない）予約であること
/// - 他に有効な予約が残らなければ物件を Available に戻す
/// - 戻す際の compare-and-swap が失敗した場合（別の操作が先にステータスを
///   変えていた場合）はステータスをそのままにする
///
/// # 戻り値
/// 取消後の予約
#[tracing::instrument(skip(deps, cmd), fields(reservation_id = %cmd.reservation_id))]
pub async fn cancel_booking(deps: &ServiceDependencies, cmd: CancelBooking) -> Result<Reservation> {
    let reservation_id = cmd.reservation_id;

    // 1. 予約から対象物件を特定
    let existing = deps
        .reservation_ledger
        .get_by_id(reservation_id)
        .await
        .map_err(BookingError::LedgerError)?
        .filter(Reservation::is_active)
        .ok_or(BookingError::ReservationNotFound(reservation_id))?;

    // 2. 排他ゲートを取得
    let _guard = deps.exclusion_gate.acquire(existing.post_id, None).await?;

    // 3. 台帳で取消（並行した取消に負けた場合は見つからない扱い）
    let cancelled_at = cmd.cancelled_at;
    let cancelled = deps
        .reservation_ledger
        .cancel(reservation_id, cancelled_at)
        .await
        .map_err(BookingError::LedgerError)?
        .ok_or(BookingError::ReservationNotFound(reservation_id))?;

    let mut events = vec![DomainEvent::ReservationCancelled(
        ReservationCancelled::from_cancelled(&cancelled, cmd.requested_by.clone()),
    )];

    // 4. 物件ステータスを再評価
    let post = load_post(&deps.post_registry, cancelled.post_id).await?;
    let remaining = load_active_reservations(&deps.reservation_ledger, post.post_id).await?;

    if let Some(transition) = domain::post::status_after_cancellation(&post, &remaining) {
        let outcome = deps
            .post_registry
            .transition_status(post.post_id, transition.from, transition.to, cancelled_at)
            .await
            .map_err(BookingError::PostRegistryError)?;

        match outcome {
            TransitionOutcome::Applied => {
                events.push(DomainEvent::PostStatusChanged(
                    transition.to_event(post.post_id, cancelled_at),
                ));
            }
            TransitionOutcome::Conflict(actual) => {
                tracing::warn!(
                    post_id = %post.post_id,
                    expected = %transition.from,
                    %actual,
                    "post status changed concurrently, leaving it as is"
                );
            }
            TransitionOutcome::NotFound => {
                tracing::warn!(post_id = %post.post_id, "post disappeared during cancellation");
            }
        }
    }

    // 5. 予約履歴に記録
    record_history(&deps.event_store, post.post_id, events).await;

    tracing::info!(post_id = %post.post_id, "reservation cancelled");

    Ok(cancelled)
}
