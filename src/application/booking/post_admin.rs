use crate::domain::{
    self, DomainEvent,
    commands::{RegisterPost, RelistPost, WithdrawPost},
    post::{Post, StatusTransition},
};
use chrono::{DateTime, Utc};

use super::booking_service::{
    ServiceDependencies, load_post, record_history, transition_with_retry,
};
use super::errors::{BookingError, Result};

/// 物件を登録する
///
/// 新しい物件はIDが未公開のため、排他ゲートは不要。
#[tracing::instrument(skip(deps, cmd), fields(category = %cmd.category))]
pub async fn register_post(deps: &ServiceDependencies, cmd: RegisterPost) -> Result<Post> {
    let (post, event) = domain::post::register_post(&cmd.title, cmd.category, cmd.registered_at)?;

    deps.post_registry
        .insert(post.clone())
        .await
        .map_err(BookingError::PostRegistryError)?;

    record_history(
        &deps.event_store,
        post.post_id,
        vec![DomainEvent::PostRegistered(event)],
    )
    .await;

    tracing::info!(post_id = %post.post_id, "post registered");

    Ok(post)
}

/// 物件の掲載を停止する（Available → Unavailable）
///
/// 有効な予約がある物件は停止できない。
#[tracing::instrument(skip(deps, cmd), fields(post_id = %cmd.post_id))]
pub async fn withdraw_post(deps: &ServiceDependencies, cmd: WithdrawPost) -> Result<Post> {
    change_status(deps, cmd.post_id, cmd.withdrawn_at, domain::post::withdraw).await
}

/// 掲載停止中の物件を再掲載する（Unavailable → Available）
#[tracing::instrument(skip(deps, cmd), fields(post_id = %cmd.post_id))]
pub async fn relist_post(deps: &ServiceDependencies, cmd: RelistPost) -> Result<Post> {
    change_status(deps, cmd.post_id, cmd.relisted_at, domain::post::relist).await
}

/// 管理操作によるステータス変更の共通処理
///
/// 予約と同じ排他ゲートの内側で判定と遷移を行う。
async fn change_status(
    deps: &ServiceDependencies,
    post_id: domain::PostId,
    changed_at: DateTime<Utc>,
    decide: fn(&Post) -> std::result::Result<StatusTransition, domain::BookingConflict>,
) -> Result<Post> {
    // 1. 物件の存在確認（ゲートを作る前に）
    load_post(&deps.post_registry, post_id).await?;

    // 2. 排他ゲートを取得し、読み直して判定
    let _guard = deps.exclusion_gate.acquire(post_id, None).await?;
    let post = load_post(&deps.post_registry, post_id).await?;
    let transition =
        decide(&post).map_err(|conflict| BookingError::from_conflict(post_id, conflict))?;

    // 3. ステータス遷移
    let applied = transition_with_retry(&deps.post_registry, &post, transition, changed_at, |p| {
        decide(p).map(Some)
    })
    .await?;

    if let Some(transition) = applied {
        record_history(
            &deps.event_store,
            post_id,
            vec![DomainEvent::PostStatusChanged(
                transition.to_event(post_id, changed_at),
            )],
        )
        .await;

        tracing::info!(from = %transition.from, to = %transition.to, "post status changed");
    }

    load_post(&deps.post_registry, post_id).await
}
