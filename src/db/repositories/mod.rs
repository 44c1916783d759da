pub mod activity;
pub mod notifications;

pub use notifications::MAX_NOTIFICATIONS;
