use crate::domain::{Category, PostId, PostStatus, post::Post};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[allow(dead_code)]
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// ステータス遷移（compare-and-swap）の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// 現在値が期待値と一致し、遷移した
    Applied,
    /// 別の操作が先にステータスを変えていた（実際の現在値）
    Conflict(PostStatus),
    /// 物件が存在しない
    NotFound,
}

/// 物件レジストリポート
///
/// 予約可能な物件とその現在ステータスの正本。
/// ステータスの変更は `transition_status` の compare-and-swap のみで行う。
#[async_trait]
pub trait PostRegistry: Send + Sync {
    /// 新しい物件を登録する
    async fn insert(&self, post: Post) -> Result<()>;

    /// IDで物件を取得する
    async fn get(&self, post_id: PostId) -> Result<Option<Post>>;

    /// 予約受付中（Available）の物件を一覧する
    ///
    /// カテゴリ指定時はそのカテゴリに絞る。レジストリは現在の状態を
    /// そのまま返すだけで、表示用の絞り込みは呼び出し側の責務。
    async fn list_available(&self, category: Option<&Category>) -> Result<Vec<Post>>;

    /// ステータスを compare-and-swap で遷移させる
    ///
    /// 現在値が `from` と一致する場合のみ `to` に変更する。
    async fn transition_status(
        &self,
        post_id: PostId,
        from: PostStatus,
        to: PostStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<TransitionOutcome>;
}
