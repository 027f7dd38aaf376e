pub mod error;
pub mod two_level;
pub mod types;

pub use error::{CacheError, Result};
pub use two_level::{CacheBuilder, TwoLevelCache};
pub use types::{CacheStats, Removal, RemovalCause};
