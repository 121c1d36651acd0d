mod service;
mod store;

pub use service::{LocationService, MAX_RADIUS_METERS};
pub use store::{LocationInput, LocationStore, PgLocationStore};

#[cfg(test)]
pub use store::MockLocationStore;
