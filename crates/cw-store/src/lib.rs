pub mod error;
pub mod schema;
pub mod stats;
pub mod store;

pub use error::{Result, StoreError};
pub use stats::{DEFAULT_STATS_PATH, STATS_PATH_ENV, stats_path};
pub use store::{Person, Store};
