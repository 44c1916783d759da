pub mod ambient;
pub mod center;
pub mod trigger;

pub use ambient::AmbientAlerts;
pub use center::NotificationCenter;
pub use trigger::evaluate;
