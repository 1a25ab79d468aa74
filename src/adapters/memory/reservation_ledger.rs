use crate::domain::{
    PostId, ReservationId,
    reservation::{self, PendingReservation, Reservation},
};
use crate::ports::reservation_ledger::{ReservationLedger as ReservationLedgerTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// ReservationLedgerのインメモリ実装
///
/// 予約は挿入順に保持する。一覧の順序は安定する。
pub struct ReservationLedger {
    reservations: Mutex<Vec<Reservation>>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self {
            reservations: Mutex::new(Vec::new()),
        }
    }

    /// 保存済みの予約数（取消済みを含む）
    pub fn len(&self) -> usize {
        self.reservations.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReservationLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationLedgerTrait for ReservationLedger {
    async fn list_active_for_post(&self, post_id: PostId) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.lock().map_err(|e| e.to_string())?;
        Ok(reservations
            .iter()
            .filter(|r| r.post_id == post_id && r.is_active())
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        pending: PendingReservation,
        committed_at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let committed = reservation::commit(pending, ReservationId::new(), committed_at);
        let mut reservations = self.reservations.lock().map_err(|e| e.to_string())?;
        reservations.push(committed.clone());
        Ok(committed)
    }

    async fn cancel(
        &self,
        reservation_id: ReservationId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Reservation>> {
        let mut reservations = self.reservations.lock().map_err(|e| e.to_string())?;
        let Some(stored) = reservations
            .iter_mut()
            .find(|r| r.reservation_id == reservation_id)
        else {
            return Ok(None);
        };

        // 取消済みは「有効な予約なし」として扱う
        match reservation::cancel(stored, cancelled_at) {
            Ok(cancelled) => {
                *stored = cancelled.clone();
                Ok(Some(cancelled))
            }
            Err(_) => Ok(None),
        }
    }

    async fn discard(&self, reservation_id: ReservationId) -> Result<()> {
        let mut reservations = self.reservations.lock().map_err(|e| e.to_string())?;
        reservations.retain(|r| r.reservation_id != reservation_id);
        Ok(())
    }

    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        let reservations = self.reservations.lock().map_err(|e| e.to_string())?;
        Ok(reservations
            .iter()
            .find(|r| r.reservation_id == reservation_id)
            .cloned())
    }
}
