//! Schema entities and their cross-index invariants (spec §3).

pub mod day_train;
pub mod order;
pub mod station;
pub mod train;
pub mod user;

pub use day_train::DayTrain;
pub use order::{Order, OrderStatus};
pub use station::Station;
pub use train::Train;
pub use user::User;
