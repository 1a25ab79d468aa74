//! プロセス内で完結するアダプター
//!
//! DATABASE_URL 未設定時と、サービス層のテストで使う。

pub mod event_store;
pub mod post_registry;
pub mod reservation_ledger;

pub use event_store::EventStore;
pub use post_registry::PostRegistry;
pub use reservation_ledger::ReservationLedger;
