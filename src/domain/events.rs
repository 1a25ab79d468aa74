use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CallerId, Category, DateRange, PostId, PostStatus, ReservationId};

/// イベント：物件が登録された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRegistered {
    pub post_id: PostId,
    pub title: String,
    pub category: Category,
    pub registered_at: DateTime<Utc>,
}

/// イベント：予約がコミットされた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCommitted {
    pub reservation_id: ReservationId,
    pub post_id: PostId,
    pub period: Option<DateRange>,
    pub requested_by: Option<CallerId>,
    pub committed_at: DateTime<Utc>,
}

/// イベント：予約が取り消された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCancelled {
    pub reservation_id: ReservationId,
    pub post_id: PostId,
    pub requested_by: Option<CallerId>,
    pub cancelled_at: DateTime<Utc>,
}

/// イベント：物件ステータスが遷移した
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStatusChanged {
    pub post_id: PostId,
    pub from: PostStatus,
    pub to: PostStatus,
    pub changed_at: DateTime<Utc>,
}

/// ドメインイベント統合型（物件ごとの予約履歴）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    PostRegistered(PostRegistered),
    ReservationCommitted(ReservationCommitted),
    ReservationCancelled(ReservationCancelled),
    PostStatusChanged(PostStatusChanged),
}

impl DomainEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::PostRegistered(e) => e.registered_at,
            DomainEvent::ReservationCommitted(e) => e.committed_at,
            DomainEvent::ReservationCancelled(e) => e.cancelled_at,
            DomainEvent::PostStatusChanged(e) => e.changed_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::PostRegistered(_) => "PostRegistered",
            DomainEvent::ReservationCommitted(_) => "ReservationCommitted",
            DomainEvent::ReservationCancelled(_) => "ReservationCancelled",
            DomainEvent::PostStatusChanged(_) => "PostStatusChanged",
        }
    }
}
