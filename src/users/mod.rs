//! User records, their storage and the directory operations on top.

pub mod memory;
pub mod models;
pub mod repo;
pub mod service;
pub mod store;

pub use memory::MemoryUserStore;
pub use models::{Credentials, UserRecord, UserResponse};
pub use repo::PgUserStore;
pub use service::{DirectoryError, UserDirectory};
pub use store::{StoreError, UserStore};
