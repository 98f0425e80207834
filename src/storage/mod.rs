// Storage module - PERSISTENCE
// Durable JSON state files under one data directory

mod store;

pub use store::{Store, StoreError};
