pub mod event_store;
pub mod post_registry;
pub mod reservation_ledger;

// パブリックに型を再エクスポート
pub use event_store::EventStore as PostgresEventStore;
pub use post_registry::PostRegistry as PostgresPostRegistry;
pub use reservation_ledger::ReservationLedger as PostgresReservationLedger;
