mod store;

pub use store::{LogStore, NewDeviceLog, PgLogStore};

#[cfg(test)]
pub use store::MockLogStore;
