use crate::domain::{
    CallerId, Cin, CustomerName, DateRange, PostId, Price, ReservationId, ReservationState,
    reservation::{self, PendingReservation, Reservation},
};
use crate::ports::reservation_ledger::{ReservationLedger as ReservationLedgerTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

const RESERVATION_COLUMNS: &str = r#"
    reservation_id,
    post_id,
    customer_name,
    cin,
    price,
    date_start,
    date_end,
    state,
    requested_by,
    created_at,
    updated_at,
    cancelled_at
"#;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// PostgreSQLの行データをReservationに変換する
///
/// 保存時に検証済みの値を、値オブジェクトのコンストラクタを通して復元する。
/// 期間は開始日・終了日の両方がある場合のみ存在する。
fn map_row_to_reservation(row: &PgRow) -> Result<Reservation> {
    let customer_name: &str = row.get("customer_name");
    let cin: &str = row.get("cin");
    let price: f64 = row.get("price");
    let date_start: Option<NaiveDate> = row.get("date_start");
    let date_end: Option<NaiveDate> = row.get("date_end");
    let state_str: &str = row.get("state");
    let requested_by: Option<String> = row.get("requested_by");

    let period = match (date_start, date_end) {
        (Some(start), Some(end)) => Some(
            DateRange::new(start, end).map_err(|e| invalid_data(format!("{:?}", e)))?,
        ),
        (None, None) => None,
        _ => {
            return Err(invalid_data(
                "reservation has only one of date_start/date_end".to_string(),
            ));
        }
    };

    Ok(Reservation {
        reservation_id: ReservationId::from_uuid(row.get("reservation_id")),
        post_id: PostId::from_uuid(row.get("post_id")),
        customer_name: CustomerName::parse(customer_name)
            .map_err(|e| invalid_data(format!("{:?}", e)))?,
        cin: Cin::parse(cin).map_err(|e| invalid_data(format!("{:?}", e)))?,
        price: Price::new(price).map_err(|e| invalid_data(format!("{:?}", e)))?,
        period,
        state: ReservationState::from_str(state_str).map_err(invalid_data)?,
        requested_by: requested_by.map(CallerId::new),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        cancelled_at: row.get("cancelled_at"),
    })
}

/// ReservationLedgerのPostgreSQL実装
pub struct ReservationLedger {
    pool: PgPool,
}

impl ReservationLedger {
    /// PostgreSQLコネクションプールから新しいReservationLedgerを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationLedgerTrait for ReservationLedger {
    /// 物件の有効な予約を開始日順に取得
    ///
    /// (post_id, state)の部分インデックスを使用する。
    async fn list_active_for_post(&self, post_id: PostId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE post_id = $1 AND state <> 'cancelled'
            ORDER BY date_start ASC NULLS FIRST, created_at ASC
            "#
        ))
        .bind(post_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_reservation).collect()
    }

    async fn insert(
        &self,
        pending: PendingReservation,
        committed_at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let committed = reservation::commit(pending, ReservationId::new(), committed_at);

        sqlx::query(
            r#"
            INSERT INTO reservations (
                reservation_id,
                post_id,
                customer_name,
                cin,
                price,
                date_start,
                date_end,
                state,
                requested_by,
                created_at,
                updated_at,
                cancelled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(committed.reservation_id.value())
        .bind(committed.post_id.value())
        .bind(committed.customer_name.as_str())
        .bind(committed.cin.as_str())
        .bind(committed.price.value())
        .bind(committed.period.map(|p| p.start()))
        .bind(committed.period.map(|p| p.end()))
        .bind(committed.state.as_str())
        .bind(committed.requested_by.as_ref().map(|c| c.as_str()))
        .bind(committed.created_at)
        .bind(committed.updated_at)
        .bind(committed.cancelled_at)
        .execute(&self.pool)
        .await?;

        Ok(committed)
    }

    /// 有効な予約のみを取り消す
    ///
    /// 条件付きUPDATEのため、同じ予約への並行した取消はどちらか一方だけが成功する。
    async fn cancel(
        &self,
        reservation_id: ReservationId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE reservations
            SET state = 'cancelled', cancelled_at = $2, updated_at = $2
            WHERE reservation_id = $1 AND state <> 'cancelled'
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(reservation_id.value())
        .bind(cancelled_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_reservation).transpose()
    }

    async fn discard(&self, reservation_id: ReservationId) -> Result<()> {
        sqlx::query("DELETE FROM reservations WHERE reservation_id = $1")
            .bind(reservation_id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE reservation_id = $1
            "#
        ))
        .bind(reservation_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_reservation).transpose()
    }
}
