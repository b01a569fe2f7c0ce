pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use config::StoreConfig;
pub use db::{Store, cleanup_db, setup_db};
pub use error::{Result, StoreError};
