use crate::domain::{PostId, events::DomainEvent};
use async_trait::async_trait;

#[allow(dead_code)]
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// イベントストアポート
///
/// 物件ごとの予約履歴を追記専用ログとして保存する。
/// 正本は物件レジストリと予約台帳であり、ここは監査用の履歴。
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 物件のイベントを追加する
    ///
    /// イベントの順序は保持される。
    async fn append(&self, post_id: PostId, events: Vec<DomainEvent>) -> Result<()>;

    /// 物件のすべてのイベントを追加順に読み込む
    async fn load(&self, post_id: PostId) -> Result<Vec<DomainEvent>>;
}
