use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::PostId;

/// 呼び出し元の期限までに排他ゲートを取得できなかった
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded;

/// 物件ごとの排他ゲート
///
/// 物件IDごとに1つの非同期Mutexを遅延生成する。同じ物件への予約処理は
/// ゲートの内側で直列化され、異なる物件の処理は互いに待たない。
/// 1つの操作が同時に保持するゲートは常に1つだけ。
pub struct ExclusionGate {
    gates: Mutex<HashMap<PostId, Arc<AsyncMutex<()>>>>,
}

/// 取得済みのゲート。ドロップで解放される
#[derive(Debug)]
pub struct PostGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ExclusionGate {
    pub fn new() -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
        }
    }

    fn gate_for(&self, post_id: PostId) -> Arc<AsyncMutex<()>> {
        // マップの操作は1文で完結するため、poisonされても中身は壊れていない
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.entry(post_id).or_default().clone()
    }

    /// 物件のゲートを取得する
    ///
    /// 期限が指定された場合、期限を過ぎていれば待たずに失敗し、
    /// 待機も期限までに制限する。ゲート取得後は期限を一切参照しない。
    pub async fn acquire(
        &self,
        post_id: PostId,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<PostGuard, DeadlineExceeded> {
        let gate = self.gate_for(post_id);

        let guard = match deadline {
            None => gate.lock_owned().await,
            Some(deadline) => {
                let remaining = (deadline - Utc::now())
                    .to_std()
                    .map_err(|_| DeadlineExceeded)?;
                tokio::time::timeout(remaining, gate.lock_owned())
                    .await
                    .map_err(|_| DeadlineExceeded)?
            }
        };

        tracing::debug!(%post_id, "exclusion gate acquired");

        Ok(PostGuard { _guard: guard })
    }
}

impl Default for ExclusionGate {
    fn default() -> Self {
        Self::new()
    }
}
