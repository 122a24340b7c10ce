pub mod file_slot;
pub mod memory;
pub mod redis;

pub use file_slot::FileSlot;
pub use memory::{MemoryListBackend, MemorySlot};
pub use self::redis::create_redis_client;
pub use self::redis::RedisListBackend;
