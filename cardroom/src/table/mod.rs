//! Table layer: one owning actor task per table, the snapshot broadcaster,
//! and the manager that spawns and tracks actors.

pub mod actor;
pub mod broadcast;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use broadcast::Broadcaster;
pub use config::TableConfig;
pub use manager::TableManager;
pub use messages::{Broadcast, TableCommand};
