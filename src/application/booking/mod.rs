mod booking_service;
mod errors;
mod exclusion;
mod post_admin;
mod queries;

pub use booking_service::{ServiceDependencies, cancel_booking, request_booking};
pub use errors::{BookingError, Result};
pub use exclusion::{DeadlineExceeded, ExclusionGate, PostGuard};
pub use post_admin::{register_post, relist_post, withdraw_post};
pub use queries::{
    get_post, get_reservation, list_active_reservations, list_available_posts, post_history,
};
