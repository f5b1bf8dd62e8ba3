pub mod error;
pub mod memory;
pub mod model;
pub mod redb_store;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use model::{ChangeEvent, ChangeType, EnforcementEvent, EnforcementFilter, Observation};
pub use redb_store::RedbStore;
pub use store::Store;
