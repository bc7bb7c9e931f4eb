mod reset_store_redis;
mod session_store_redis;

pub use reset_store_redis::*;
pub use session_store_redis::*;
