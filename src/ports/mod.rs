pub mod event_store;
pub mod post_registry;
pub mod reservation_ledger;

pub use event_store::EventStore;
pub use post_registry::{PostRegistry, TransitionOutcome};
pub use reservation_ledger::ReservationLedger;
