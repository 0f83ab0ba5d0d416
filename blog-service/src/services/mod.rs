pub mod couchdb;
pub mod memory;
pub mod metrics;
pub mod store;

pub use couchdb::CouchDb;
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics, record_store_operation};
pub use store::{PostStore, StoreError, WriteResult};
