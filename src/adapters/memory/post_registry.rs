use crate::domain::{Category, PostId, PostStatus, post::Post};
use crate::ports::post_registry::{
    PostRegistry as PostRegistryTrait, Result, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// PostRegistryのインメモリ実装
///
/// 全物件を単一のMutexで保持する。`transition_status` の compare-and-swap は
/// 他のすべての呼び出しに対してアトミック。
pub struct PostRegistry {
    posts: Mutex<HashMap<PostId, Post>>,
}

impl PostRegistry {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
        }
    }

    /// 既存の物件を投入した状態で生成する
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        Self {
            posts: Mutex::new(posts.into_iter().map(|p| (p.post_id, p)).collect()),
        }
    }
}

impl Default for PostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRegistryTrait for PostRegistry {
    async fn insert(&self, post: Post) -> Result<()> {
        let mut posts = self.posts.lock().map_err(|e| e.to_string())?;
        if posts.contains_key(&post.post_id) {
            return Err(format!("post {} already exists", post.post_id).into());
        }
        posts.insert(post.post_id, post);
        Ok(())
    }

    async fn get(&self, post_id: PostId) -> Result<Option<Post>> {
        let posts = self.posts.lock().map_err(|e| e.to_string())?;
        Ok(posts.get(&post_id).cloned())
    }

    /// 予約受付中の物件を登録順に返す。カテゴリ名は大文字小文字を区別しない。
    async fn list_available(&self, category: Option<&Category>) -> Result<Vec<Post>> {
        let posts = self.posts.lock().map_err(|e| e.to_string())?;
        let mut available: Vec<Post> = posts
            .values()
            .filter(|p| p.status == PostStatus::Available)
            .filter(|p| {
                category.is_none_or(|c| p.category.as_str().eq_ignore_ascii_case(c.as_str()))
            })
            .cloned()
            .collect();
        available.sort_by_key(|p| p.created_at);
        Ok(available)
    }

    async fn transition_status(
        &self,
        post_id: PostId,
        from: PostStatus,
        to: PostStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let mut posts = self.posts.lock().map_err(|e| e.to_string())?;
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        if post.status != from {
            return Ok(TransitionOutcome::Conflict(post.status));
        }

        post.status = to;
        post.updated_at = changed_at;
        Ok(TransitionOutcome::Applied)
    }
}
