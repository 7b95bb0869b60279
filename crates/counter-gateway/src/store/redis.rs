//! Redis adapter speaking RESP2 over TCP.
//!
//! - `INCR <key>` is the only command on the request path.
//! - Each round-trip, including the dial, is bounded by `timeout`.
//! - A connection goes back to the idle pool only after a complete reply,
//!   so a cancelled or failed call never leaves unread bytes on a pooled
//!   connection. No retries.
//! - At most `max_open` connections exist at once, idle ones included.
//!   Each connection owns a semaphore permit; callers past the cap wait for
//!   a connection to come back or be dropped, inside the same timeout.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};

use counter_core::protocol::resp::{self, Frame};
use counter_core::StoreError;

use super::{check_key, IncrementStore};

pub struct RedisStore {
    addr: String,
    timeout: Duration,
    max_idle: usize,
    max_open: usize,
    idle: Mutex<Vec<Connection>>,
    open: Arc<Semaphore>,
    returned: Notify,
}

impl RedisStore {
    /// `max_idle` is clamped to `max_open`, and `max_open` to at least 1.
    pub fn new(addr: impl Into<String>, timeout: Duration, max_idle: usize, max_open: usize) -> Self {
        let max_open = max_open.max(1);
        Self {
            addr: addr.into(),
            timeout,
            max_idle: max_idle.min(max_open),
            max_open,
            idle: Mutex::new(Vec::new()),
            open: Arc::new(Semaphore::new(max_open)),
            returned: Notify::new(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Connections currently parked in the idle pool.
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Connections alive right now, busy or idle.
    pub fn open_connections(&self) -> usize {
        self.max_open - self.open.available_permits()
    }

    async fn round_trip(&self, args: &[&[u8]]) -> Result<Frame, StoreError> {
        let call = async {
            let mut conn = self.checkout().await?;
            let frame = conn.call(args).await?;
            self.checkin(conn);
            Ok::<_, StoreError>(frame)
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn checkout(&self) -> Result<Connection, StoreError> {
        loop {
            let pooled = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
            if let Some(conn) = pooled {
                return Ok(conn);
            }

            tokio::select! {
                permit = self.open.clone().acquire_owned() => {
                    let permit = permit.map_err(|_| {
                        StoreError::Io(io::Error::other("connection limit closed"))
                    })?;
                    return Connection::dial(&self.addr, permit).await;
                }
                // a connection went back to the pool; retry the pop
                _ = self.returned.notified() => {}
            }
        }
    }

    fn checkin(&self, conn: Connection) {
        {
            let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
            if idle.len() < self.max_idle {
                idle.push(conn);
            }
        }
        self.returned.notify_one();
    }
}

#[async_trait]
impl IncrementStore for RedisStore {
    async fn atomic_increment(&self, key: &str) -> Result<i64, StoreError> {
        check_key(key)?;

        match self.round_trip(&[b"INCR", key.as_bytes()]).await? {
            Frame::Integer(n) => Ok(n),
            Frame::Error(msg) => Err(StoreError::Reply(msg)),
            other => Err(StoreError::Protocol(format!("unexpected INCR reply: {other:?}"))),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self.round_trip(&[b"PING"]).await? {
            Frame::Simple(s) if s == "PONG" => Ok(()),
            Frame::Error(msg) => Err(StoreError::Reply(msg)),
            other => Err(StoreError::Protocol(format!("unexpected PING reply: {other:?}"))),
        }
    }
}

struct Connection {
    stream: TcpStream,
    buf: BytesMut,
    _slot: OwnedSemaphorePermit,
}

impl Connection {
    async fn dial(addr: &str, slot: OwnedSemaphorePermit) -> Result<Self, StoreError> {
        let stream = TcpStream::connect(addr).await.map_err(|source| StoreError::Connect {
            addr: addr.to_owned(),
            source,
        })?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(64),
            _slot: slot,
        })
    }

    async fn call(&mut self, args: &[&[u8]]) -> Result<Frame, StoreError> {
        let mut out = BytesMut::new();
        resp::encode_command(args, &mut out);
        self.stream.write_all(&out).await?;

        loop {
            if let Some(frame) = resp::decode(&mut self.buf)? {
                return Ok(frame);
            }
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "store closed the connection",
                )));
            }
        }
    }
}
