//! Shared test helpers.
//!
//! - `FakeRedis`: in-process RESP store answering `INCR` and `PING` with the
//!   crate's own codec, atomically per key.
//! - `capture_logs`: routes `tracing` output of the current thread into a
//!   buffer so tests can assert on emitted events.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use counter_core::protocol::resp::{decode, encode_frame, Frame};

#[derive(Default)]
pub struct FakeRedis {
    counters: DashMap<Vec<u8>, i64>,
    connections: AtomicUsize,
    /// Reply to every command with an error.
    broken: AtomicBool,
    /// Read commands but never reply.
    silent: AtomicBool,
}

impl FakeRedis {
    pub fn set(&self, key: &str, value: i64) {
        self.counters.insert(key.as_bytes().to_vec(), value);
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.counters.get(key.as_bytes()).map(|v| *v)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn set_broken(&self, on: bool) {
        self.broken.store(on, Ordering::SeqCst);
    }

    pub fn set_silent(&self, on: bool) {
        self.silent.store(on, Ordering::SeqCst);
    }

    fn execute(&self, frame: Frame) -> Frame {
        if self.broken.load(Ordering::SeqCst) {
            return Frame::Error("LOADING store is loading the dataset in memory".into());
        }

        let Frame::Array(args) = frame else {
            return Frame::Error("ERR protocol error".into());
        };
        let args: Vec<Bytes> = args
            .into_iter()
            .filter_map(|a| match a {
                Frame::Bulk(b) => Some(b),
                _ => None,
            })
            .collect();

        match args.as_slice() {
            [cmd] if cmd.eq_ignore_ascii_case(b"PING") => Frame::Simple("PONG".into()),
            [cmd, key] if cmd.eq_ignore_ascii_case(b"INCR") => {
                let mut slot = self.counters.entry(key.to_vec()).or_insert(0);
                match slot.checked_add(1) {
                    Some(next) => {
                        *slot = next;
                        Frame::Integer(next)
                    }
                    None => Frame::Error("ERR increment or decrement would overflow".into()),
                }
            }
            _ => Frame::Error("ERR unknown command".into()),
        }
    }
}

/// Start a fake store on an ephemeral local port.
pub async fn spawn_fake_redis() -> (SocketAddr, Arc<FakeRedis>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let fake = Arc::new(FakeRedis::default());

    let state = Arc::clone(&fake);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            state.connections.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(handle(stream, Arc::clone(&state)));
        }
    });

    (addr, fake)
}

async fn handle(mut stream: TcpStream, state: Arc<FakeRedis>) {
    let mut buf = BytesMut::new();
    loop {
        while let Ok(Some(frame)) = decode(&mut buf) {
            if state.silent.load(Ordering::SeqCst) {
                continue;
            }
            let mut out = BytesMut::new();
            encode_frame(&state.execute(frame), &mut out);
            if stream.write_all(&out).await.is_err() {
                return;
            }
        }
        match stream.read_buf(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Formatted log lines, shared between the subscriber and the test.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Poll until `needle` shows up or `within` elapses.
    pub async fn wait_for(&self, needle: &str, within: std::time::Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.text().contains(needle) {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.text().contains(needle)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture DEBUG and above on this thread until the guard drops. Pair with a
/// current-thread runtime so spawned tasks log into the same buffer.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
