use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BookingConflict, Category, DateRange, MAX_CODE_LEN, MAX_TEXT_LEN, PostId, PostRegistered,
    PostStatus, PostStatusChanged, ValidationError,
    reservation::{Reservation, find_overlap},
    value_objects::check_length,
};

/// Post集約 - 予約可能な1件の掲載物件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    // 識別子
    pub post_id: PostId,

    pub title: String,
    pub category: Category,
    /// 予約調整サービス経由でのみ遷移する
    pub status: PostStatus,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ステータス遷移（compare-and-swap の期待値と新しい値）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: PostStatus,
    pub to: PostStatus,
}

impl StatusTransition {
    pub fn new(from: PostStatus, to: PostStatus) -> Self {
        Self { from, to }
    }

    pub fn to_event(self, post_id: PostId, changed_at: DateTime<Utc>) -> PostStatusChanged {
        PostStatusChanged {
            post_id,
            from: self.from,
            to: self.to,
            changed_at,
        }
    }
}

/// 純粋関数：物件を登録する
///
/// 登録直後のステータスは常に Available。
/// タイトルとカテゴリ名は空でなく、保存できる長さであること。
pub fn register_post(
    title: &str,
    category: Category,
    registered_at: DateTime<Utc>,
) -> Result<(Post, PostRegistered), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingRequiredField("title"));
    }
    check_length("title", title, MAX_TEXT_LEN)?;

    if category.as_str().trim().is_empty() {
        return Err(ValidationError::MissingRequiredField("category"));
    }
    check_length("category", category.as_str(), MAX_CODE_LEN)?;

    let post = Post {
        post_id: PostId::new(),
        title: title.to_string(),
        category,
        status: PostStatus::Available,
        created_at: registered_at,
        updated_at: registered_at,
    };

    let event = PostRegistered {
        post_id: post.post_id,
        title: post.title.clone(),
        category: post.category.clone(),
        registered_at,
    };

    Ok((post, event))
}

/// 予約コミット後に物件が取るべきステータス
///
/// `Location`は有効な予約が1件でもあれば Reserved（日付単位の空きは見ない）。
/// それ以外は一度きりの予約なので Taken。
pub fn booked_status(category: &Category) -> PostStatus {
    if category.requires_date_range() {
        PostStatus::Reserved
    } else {
        PostStatus::Taken
    }
}

/// 純粋関数：予約を受け付けられるか判定する
///
/// ビジネスルール：
/// - `Location`：ステータスが Available か Reserved で、期間が有効な予約と重ならないこと
/// - それ以外：ステータスが Available で、有効な予約が存在しないこと
///
/// 受付可能な場合は必要なステータス遷移を返す（既に Reserved の賃貸物件では遷移なし）。
/// `active`は排他ゲート取得後に読み直した、この物件の有効な予約であること。
pub fn evaluate_booking(
    post: &Post,
    period: Option<&DateRange>,
    active: &[Reservation],
) -> Result<Option<StatusTransition>, BookingConflict> {
    let target = booked_status(&post.category);

    if post.category.requires_date_range() {
        if !matches!(post.status, PostStatus::Available | PostStatus::Reserved) {
            return Err(BookingConflict::PostUnavailable(post.status));
        }

        if let Some(period) = period {
            if let Some(existing) = find_overlap(period, active) {
                return Err(BookingConflict::DateRangeOverlap {
                    existing: existing.reservation_id,
                    range: existing.period.unwrap_or(*period),
                });
            }
        }
    } else if post.status != PostStatus::Available || active.iter().any(|r| r.is_active()) {
        return Err(BookingConflict::PostUnavailable(post.status));
    }

    if post.status == target {
        Ok(None)
    } else {
        Ok(Some(StatusTransition::new(post.status, target)))
    }
}

/// 純粋関数：予約取消後のステータス遷移を決める
///
/// 他に有効な予約が残っていなければ Available に戻す。
/// 掲載停止中（Unavailable）の物件はそのまま。
pub fn status_after_cancellation(
    post: &Post,
    remaining_active: &[Reservation],
) -> Option<StatusTransition> {
    if remaining_active.iter().any(|r| r.is_active()) {
        return None;
    }

    match post.status {
        PostStatus::Reserved | PostStatus::Taken => {
            Some(StatusTransition::new(post.status, PostStatus::Available))
        }
        PostStatus::Available | PostStatus::Unavailable => None,
    }
}

/// 純粋関数：掲載停止
///
/// 有効な予約がある物件（Reserved / Taken）は停止できない。
pub fn withdraw(post: &Post) -> Result<StatusTransition, BookingConflict> {
    match post.status {
        PostStatus::Available => Ok(StatusTransition::new(
            PostStatus::Available,
            PostStatus::Unavailable,
        )),
        other => Err(BookingConflict::PostUnavailable(other)),
    }
}

/// 純粋関数：再掲載
pub fn relist(post: &Post) -> Result<StatusTransition, BookingConflict> {
    match post.status {
        PostStatus::Unavailable => Ok(StatusTransition::new(
            PostStatus::Unavailable,
            PostStatus::Available,
        )),
        other => Err(BookingConflict::PostUnavailable(other)),
    }
}
