use redis::{aio::MultiplexedConnection, Client};
use tracing::info;

/// Shared multiplexed connection; clones are cheap handles onto the same socket.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn connect(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        info!("redis connected");
        Ok(RedisClient { conn })
    }
}
