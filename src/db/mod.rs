pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod queries;
pub mod repository;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use repository::{Store, StoreHandle};
