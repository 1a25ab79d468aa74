use crate::domain::{Category, PostId, PostStatus, post::Post};
use crate::ports::post_registry::{
    PostRegistry as PostRegistryTrait, Result, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

fn parse_status(raw: &str) -> Result<PostStatus> {
    PostStatus::from_str(raw).map_err(invalid_data)
}

/// PostgreSQLの行データをPostに変換する
///
/// カテゴリは自由な文字列として保存されているため変換は失敗しない。
/// ステータスは既知の値以外をエラーとする。
fn map_row_to_post(row: &PgRow) -> Result<Post> {
    let status_str: &str = row.get("status");
    let category: String = row.get("category");

    Ok(Post {
        post_id: PostId::from_uuid(row.get("post_id")),
        title: row.get("title"),
        category: Category::from(category),
        status: parse_status(status_str)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// PostRegistryのPostgreSQL実装
///
/// ステータス遷移は `UPDATE ... WHERE status = $expected` の1文で行うため、
/// 同じデータベースを共有する複数プロセス間でも compare-and-swap として働く。
pub struct PostRegistry {
    pool: PgPool,
}

impl PostRegistry {
    /// PostgreSQLコネクションプールから新しいPostRegistryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRegistryTrait for PostRegistry {
    async fn insert(&self, post: Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                post_id,
                title,
                category,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(post.post_id.value())
        .bind(&post.title)
        .bind(post.category.as_str())
        .bind(post.status.as_str())
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, post_id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT
                post_id,
                title,
                category,
                status,
                created_at,
                updated_at
            FROM posts
            WHERE post_id = $1
            "#,
        )
        .bind(post_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_post).transpose()
    }

    /// 予約受付中の物件を登録順に取得
    ///
    /// カテゴリは大文字小文字を区別せずに比較する。
    async fn list_available(&self, category: Option<&Category>) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            r#"
            SELECT
                post_id,
                title,
                category,
                status,
                created_at,
                updated_at
            FROM posts
            WHERE status = 'available'
              AND ($1::varchar IS NULL OR LOWER(category) = LOWER($1))
            ORDER BY created_at ASC
            "#,
        )
        .bind(category.map(|c| c.as_str().to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_post).collect()
    }

    /// 期待値と一致する場合のみステータスを更新する
    ///
    /// 更新行が0件の場合は現在値を読み直し、競合か不在かを判別する。
    async fn transition_status(
        &self,
        post_id: PostId,
        from: PostStatus,
        to: PostStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = $3, updated_at = $4
            WHERE post_id = $1 AND status = $2
            "#,
        )
        .bind(post_id.value())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(changed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM posts WHERE post_id = $1")
                .bind(post_id.value())
                .fetch_optional(&self.pool)
                .await?;

        match current {
            Some(status) => Ok(TransitionOutcome::Conflict(parse_status(&status)?)),
            None => Ok(TransitionOutcome::NotFound),
        }
    }
}
