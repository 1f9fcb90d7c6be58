//! Redis-backed backends
//!
//! One Redis deployment provides all three capabilities for cluster mode:
//!
//! - claim ledger: `SET key value NX [PX lease]` — the conditional write
//! - event bus: Redis pub/sub
//! - game store: hash commands plus `RPUSH`/`BLPOP`
//!
//! Regular commands share a multiplexed connection. `BLPOP` runs on a
//! persistent dedicated connection and pub/sub on its own connections: a
//! blocking command parked on the shared pipeline would stall every other
//! caller behind it.

use crate::backend::{ClaimLedger, EventBus, GameStore};
use crate::error::{CoordError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Shared-Redis implementation of the backend capabilities.
#[derive(Clone)]
pub struct RedisBackend {
    client: redis::Client,
    conn: MultiplexedConnection,
    // Persistent dedicated connection for blocking pops. BLPOP parked on
    // the shared pipeline would stall every other caller behind it.
    blocking: Arc<Mutex<MultiplexedConnection>>,
    claim_lease: Option<Duration>,
}

impl RedisBackend {
    /// Connect to Redis, e.g. `redis://127.0.0.1:6379`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| CoordError::Store(e.to_string()))?;
        let conn = client.get_multiplexed_async_connection().await?;
        let blocking = client.get_multiplexed_async_connection().await?;
        debug!(url, "connected to redis");
        Ok(Self {
            client,
            conn,
            blocking: Arc::new(Mutex::new(blocking)),
            claim_lease: None,
        })
    }

    /// Bound every claim record with a lease; after expiry the card becomes
    /// claimable again. Off by default — claims are permanent.
    pub fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = Some(lease);
        self
    }
}

#[async_trait]
impl ClaimLedger for RedisBackend {
    async fn create_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(lease) = self.claim_lease {
            cmd.arg("PX").arg(lease.as_millis() as u64);
        }

        // SET NX replies OK when the key was created, Nil when it existed.
        let reply: Option<String> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| CoordError::Ledger(e.to_string()))?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl EventBus for RedisBackend {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _receivers: i64 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| CoordError::Bus(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| CoordError::Bus(e.to_string()))?;
        pubsub
            .subscribe(topic)
            .await
            .map_err(|e| CoordError::Bus(e.to_string()))?;

        let (tx, rx) = mpsc::channel(256);
        let topic = topic.to_string();
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(topic = %topic, error = %e, "undecodable bus payload");
                        continue;
                    }
                };
                if tx.send(payload).await.is_err() {
                    break;
                }
            }
            debug!(topic = %topic, "redis subscription ended");
        });

        Ok(rx)
    }
}

#[async_trait]
impl GameStore for RedisBackend {
    async fn hash_get(&self, collection: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(collection, field).await?)
    }

    async fn hash_set(&self, collection: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(collection, field, value).await?;
        Ok(())
    }

    async fn queue_push(&self, queue: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _len: i64 = conn.rpush(queue, payload).await?;
        Ok(())
    }

    async fn queue_pop(&self, queue: &str) -> Result<String> {
        // BLPOP with timeout 0 blocks server-side; poppers in this process
        // take turns on the dedicated connection.
        let mut conn = self.blocking.lock().await;
        loop {
            let reply: Option<(String, String)> = conn.blpop(queue, 0.0).await?;
            if let Some((_, payload)) = reply {
                return Ok(payload);
            }
        }
    }
}
