//! PostgreSQLアダプターのテスト
//!
//! DATABASE_URL のデータベースを使う。`cargo test -- --ignored` で実行する。

mod common;

use chrono::{DateTime, Utc};
use rusty_booking_ddd::adapters::postgres::{
    PostgresEventStore, PostgresPostRegistry, PostgresReservationLedger,
};
use rusty_booking_ddd::application::booking::{
    BookingError, ServiceDependencies, cancel_booking, post_history, request_booking,
};
use rusty_booking_ddd::domain::commands::{CancelBooking, RequestBooking};
use rusty_booking_ddd::domain::events::DomainEvent;
use rusty_booking_ddd::domain::post::{Post, register_post};
use rusty_booking_ddd::domain::reservation::PendingReservation;
use rusty_booking_ddd::domain::value_objects::*;
use rusty_booking_ddd::ports::*;
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;

/// PostgreSQLの時刻精度（マイクロ秒）に合わせて丸める
///
/// PostgreSQL TIMESTAMPTZはマイクロ秒精度（6桁）だが、
/// RustのDateTime<Utc>はナノ秒精度（9桁）を持つ。
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    let micros = dt.timestamp_micros();
    DateTime::from_timestamp_micros(micros).expect("Invalid timestamp")
}

/// データベースのクリーンアップ
///
/// テストの独立性を保つため、各テスト前にすべてのデータを削除します。
async fn cleanup_database(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE reservations, posts, events CASCADE")
        .execute(pool)
        .await
        .expect("Failed to truncate tables");
}

async fn setup() -> (PgPool, ServiceDependencies) {
    let pool = common::create_test_pool().await;
    cleanup_database(&pool).await;

    let deps = ServiceDependencies::new(
        Arc::new(PostgresPostRegistry::new(pool.clone())),
        Arc::new(PostgresReservationLedger::new(pool.clone())),
        Arc::new(PostgresEventStore::new(pool.clone())),
    );
    (pool, deps)
}

fn new_post(title: &str, category: Category) -> Post {
    let (mut post, _) = register_post(title, category, Utc::now()).unwrap();
    post.created_at = truncate_to_micros(post.created_at);
    post.updated_at = post.created_at;
    post
}

fn pending(post_id: PostId, period: Option<DateRange>) -> PendingReservation {
    PendingReservation {
        post_id,
        customer_name: CustomerName::parse("Mehdi Lahlou").unwrap(),
        cin: Cin::parse("GH776655").unwrap(),
        price: Price::new(540.5).unwrap(),
        period,
        requested_by: Some(CallerId::new("back-office")),
        requested_at: Utc::now(),
    }
}

fn booking(post_id: PostId) -> RequestBooking {
    RequestBooking {
        post_id,
        full_name: "Mehdi Lahlou".to_string(),
        cin: "GH776655".to_string(),
        price: Some(540.5),
        date_start: None,
        date_end: None,
        requested_by: None,
        requested_at: Utc::now(),
        deadline: None,
    }
}

// ============================================================================
// PostRegistry
// ============================================================================

#[tokio::test]
#[ignore]
#[serial]
async fn test_post_registry_insert_and_get() {
    let (pool, _) = setup().await;
    let registry = PostgresPostRegistry::new(pool);

    let post = new_post("Riad Oudayas", Category::Location);
    registry.insert(post.clone()).await.unwrap();

    let loaded = registry.get(post.post_id).await.unwrap();
    assert_eq!(loaded, Some(post));
    assert_eq!(registry.get(PostId::new()).await.unwrap(), None);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_post_registry_transition_status_cas() {
    let (pool, _) = setup().await;
    let registry = PostgresPostRegistry::new(pool);

    let post = new_post("Appartement Hassan", Category::Vente);
    registry.insert(post.clone()).await.unwrap();

    let applied = registry
        .transition_status(post.post_id, PostStatus::Available, PostStatus::Taken, Utc::now())
        .await
        .unwrap();
    assert_eq!(applied, TransitionOutcome::Applied);

    let stale = registry
        .transition_status(post.post_id, PostStatus::Available, PostStatus::Taken, Utc::now())
        .await
        .unwrap();
    assert_eq!(stale, TransitionOutcome::Conflict(PostStatus::Taken));

    let missing = registry
        .transition_status(PostId::new(), PostStatus::Available, PostStatus::Taken, Utc::now())
        .await
        .unwrap();
    assert_eq!(missing, TransitionOutcome::NotFound);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_post_registry_list_available() {
    let (pool, _) = setup().await;
    let registry = PostgresPostRegistry::new(pool);

    let rental = new_post("Villa Cabo Negro", Category::Location);
    let sale = new_post("Lot Tamesna", Category::Vente);
    registry.insert(rental.clone()).await.unwrap();
    registry.insert(sale.clone()).await.unwrap();
    registry
        .transition_status(sale.post_id, PostStatus::Available, PostStatus::Taken, Utc::now())
        .await
        .unwrap();

    let all = registry.list_available(None).await.unwrap();
    assert_eq!(all, vec![rental.clone()]);

    let rentals = registry
        .list_available(Some(&Category::Location))
        .await
        .unwrap();
    assert_eq!(rentals, vec![rental]);

    let sales = registry.list_available(Some(&Category::Vente)).await.unwrap();
    assert!(sales.is_empty());
}

// ============================================================================
// ReservationLedger
// ============================================================================

#[tokio::test]
#[ignore]
#[serial]
async fn test_ledger_insert_cancel_discard() {
    let (pool, _) = setup().await;
    let registry = PostgresPostRegistry::new(pool.clone());
    let ledger = PostgresReservationLedger::new(pool);

    let post = new_post("Riad Larache", Category::Location);
    registry.insert(post.clone()).await.unwrap();

    let period = DateRange::new("2024-06-01".parse().unwrap(), "2024-06-10".parse().unwrap())
        .unwrap();
    let committed_at = truncate_to_micros(Utc::now());
    let stored = ledger
        .insert(pending(post.post_id, Some(period)), committed_at)
        .await
        .unwrap();
    assert_eq!(stored.state, ReservationState::Committed);

    let loaded = ledger.get_by_id(stored.reservation_id).await.unwrap();
    assert_eq!(loaded, Some(stored.clone()));
    assert_eq!(
        ledger.list_active_for_post(post.post_id).await.unwrap(),
        vec![stored.clone()]
    );

    let cancelled_at = truncate_to_micros(Utc::now());
    let cancelled = ledger
        .cancel(stored.reservation_id, cancelled_at)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.state, ReservationState::Cancelled);
    assert_eq!(cancelled.cancelled_at, Some(cancelled_at));
    assert_eq!(cancelled.period, Some(period));

    assert!(
        ledger
            .cancel(stored.reservation_id, Utc::now())
            .await
            .unwrap()
            .is_none()
    );
    assert!(ledger.list_active_for_post(post.post_id).await.unwrap().is_empty());

    let other = ledger
        .insert(pending(post.post_id, None), committed_at)
        .await
        .unwrap();
    ledger.discard(other.reservation_id).await.unwrap();
    assert_eq!(ledger.get_by_id(other.reservation_id).await.unwrap(), None);
}

// ============================================================================
// EventStore
// ============================================================================

#[tokio::test]
#[ignore]
#[serial]
async fn test_event_store_keeps_order_across_appends() {
    let (pool, _) = setup().await;
    let event_store = PostgresEventStore::new(pool);

    let post = new_post("Studio Saïss", Category::Vente);
    let (_, registered) = register_post(&post.title, post.category.clone(), Utc::now()).unwrap();
    let first = DomainEvent::PostRegistered(registered);
    let second = DomainEvent::PostStatusChanged(rusty_booking_ddd::domain::PostStatusChanged {
        post_id: post.post_id,
        from: PostStatus::Available,
        to: PostStatus::Taken,
        changed_at: Utc::now(),
    });

    event_store
        .append(post.post_id, vec![first.clone()])
        .await
        .unwrap();
    event_store
        .append(post.post_id, vec![second.clone()])
        .await
        .unwrap();
    event_store.append(post.post_id, vec![]).await.unwrap();

    let loaded = event_store.load(post.post_id).await.unwrap();
    assert_eq!(loaded, vec![first, second]);
    assert!(event_store.load(PostId::new()).await.unwrap().is_empty());
}

// ============================================================================
// コーディネーター + PostgreSQL
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn test_coordinator_on_postgres() {
    let (_pool, deps) = setup().await;
    let post = common::seed_post(&deps, "Maison Asilah", Category::Vente).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let deps = deps.clone();
            let cmd = booking(post.post_id);
            tokio::spawn(async move { request_booking(&deps, cmd).await })
        })
        .collect();

    let mut committed = Vec::new();
    for joined in futures::future::join_all(handles).await {
        match joined.expect("booking task panicked") {
            Ok(reservation) => committed.push(reservation),
            Err(BookingError::PostUnavailable { .. }) => {}
            Err(other) => panic!("unexpected rejection: {:?}", other),
        }
    }
    assert_eq!(committed.len(), 1);

    cancel_booking(
        &deps,
        CancelBooking {
            reservation_id: committed[0].reservation_id,
            cancelled_at: Utc::now(),
            requested_by: None,
        },
    )
    .await
    .unwrap();

    let post = deps.post_registry.get(post.post_id).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Available);

    let history = post_history(&deps, post.post_id).await.unwrap();
    assert_eq!(history.len(), 5);
}
