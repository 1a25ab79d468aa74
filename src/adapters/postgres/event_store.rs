use crate::domain::{PostId, events::DomainEvent};
use crate::ports::event_store::{EventStore as EventStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// Aggregate type recorded for every booking history entry
const AGGREGATE_TYPE: &str = "Post";

/// PostgreSQL implementation of EventStore
///
/// Keeps the booking history of each post as an append-only log.
/// Events are serialized as JSONB.
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    /// Create a new EventStore with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStoreTrait for EventStore {
    /// Append events to a post's history
    ///
    /// All events of one call are stored atomically within a transaction,
    /// numbered after the post's current version. The unique
    /// (aggregate_id, aggregate_version) constraint rejects a concurrent
    /// writer that read the same version.
    async fn append(&self, post_id: PostId, events: Vec<DomainEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        // COALESCE handles NULL when the post has no history yet
        let current_version: i32 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(aggregate_version), 0)
            FROM events
            WHERE aggregate_id = $1
            "#,
        )
        .bind(post_id.value())
        .fetch_one(&mut *tx)
        .await?;

        let mut versions = Vec::with_capacity(events.len());
        let mut event_types = Vec::with_capacity(events.len());
        let mut event_data_list = Vec::with_capacity(events.len());
        let mut occurred_at_list = Vec::with_capacity(events.len());

        for (i, event) in events.iter().enumerate() {
            versions.push(current_version + (i as i32) + 1);
            event_types.push(event.event_type());
            event_data_list.push(serde_json::to_value(event)?);
            occurred_at_list.push(event.occurred_at());
        }

        let aggregate_types = vec![AGGREGATE_TYPE; events.len()];

        sqlx::query(
            r#"
            INSERT INTO events (
                aggregate_id,
                aggregate_version,
                aggregate_type,
                event_type,
                event_data,
                occurred_at
            )
            SELECT $1, * FROM UNNEST($2::int[], $3::varchar[], $4::varchar[], $5::jsonb[], $6::timestamptz[])
            "#,
        )
        .bind(post_id.value())
        .bind(&versions)
        .bind(&aggregate_types)
        .bind(&event_types)
        .bind(&event_data_list)
        .bind(&occurred_at_list)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Load a post's history in the order it was appended
    async fn load(&self, post_id: PostId) -> Result<Vec<DomainEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT event_data
            FROM events
            WHERE aggregate_id = $1
            ORDER BY aggregate_version ASC
            "#,
        )
        .bind(post_id.value())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_data: serde_json::Value = row.get("event_data");
            let event: DomainEvent = serde_json::from_value(event_data)?;
            events.push(event);
        }

        Ok(events)
    }
}
