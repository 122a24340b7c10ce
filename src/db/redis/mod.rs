pub mod list;

pub use list::create_redis_client;
pub use list::RedisListBackend;
