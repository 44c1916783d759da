pub mod activity;
pub mod notification;

pub use activity::{ActivityEntry, ActivityKind};
pub use notification::{Notification, NotificationDraft, NotificationKind, Priority};
