//! Accept loop: one task per connection, HTTP/1 via hyper.
//!
//! `axum::serve` has no header-read timeout knob, so connections are driven
//! by hyper's builder directly.
//!
//! Accept errors fall in three groups:
//! - a peer that vanished before handoff: skipped,
//! - resource exhaustion (file descriptors, buffers, memory): logged, the
//!   loop backs off and keeps accepting,
//! - anything else: the listener is broken, `serve` returns the error.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;

use counter_core::error::{report, CounterError};

/// Pause after a resource-exhaustion accept error.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Serve until the listener fails.
pub async fn serve(listener: TcpListener, app: Router, read_header_timeout: Duration) -> io::Result<()> {
    serve_with_shutdown(listener, app, read_header_timeout, std::future::pending()).await
}

/// Serve until the listener fails or `shutdown` resolves. In-flight
/// connections are left to finish on their own tasks.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: Router,
    read_header_timeout: Duration,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let (tcp, peer) = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            accepted = accept_with_backoff(|| listener.accept(), ACCEPT_BACKOFF) => accepted?,
        };

        let io = TokioIo::new(tcp);
        let service = TowerToHyperService::new(app.clone());
        let conn = http1::Builder::new()
            .timer(TokioTimer::new())
            .header_read_timeout(read_header_timeout)
            .serve_connection(io, service);

        tokio::spawn(async move {
            if let Err(err) = conn.await {
                log_connection_error(peer, err);
            }
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptError {
    Connection,
    Resource,
    Fatal,
}

fn classify_accept_error(err: &io::Error) -> AcceptError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => AcceptError::Connection,
        io::ErrorKind::OutOfMemory => AcceptError::Resource,
        _ if is_resource_exhausted(err) => AcceptError::Resource,
        _ => AcceptError::Fatal,
    }
}

#[cfg(unix)]
fn is_resource_exhausted(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
    )
}

#[cfg(not(unix))]
fn is_resource_exhausted(_err: &io::Error) -> bool {
    false
}

/// Next accepted item; only fatal errors come back out.
async fn accept_with_backoff<T, A, Fut>(mut accept: A, backoff: Duration) -> io::Result<T>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        let err = match accept().await {
            Ok(v) => return Ok(v),
            Err(err) => err,
        };

        match classify_accept_error(&err) {
            AcceptError::Connection => {
                tracing::debug!(error = %err, "accept: connection dropped before handoff");
            }
            AcceptError::Resource => {
                tracing::warn!(error = %err, backoff_ms = backoff.as_millis() as u64, "accept: out of resources");
                tokio::time::sleep(backoff).await;
            }
            AcceptError::Fatal => return Err(err),
        }
    }
}

/// Malformed requests, slow headers and hang-ups are the client's doing.
fn client_caused(err: &hyper::Error) -> bool {
    err.is_timeout()
        || err.is_incomplete_message()
        || err.is_parse()
        || err.is_parse_status()
        || err.is_parse_too_large()
        || err.is_canceled()
}

fn log_connection_error(peer: SocketAddr, err: hyper::Error) {
    if client_caused(&err) {
        tracing::debug!(%peer, error = %err, "connection closed");
    } else {
        log_write_failure(peer, Box::new(err));
    }
}

fn log_write_failure(peer: SocketAddr, err: Box<dyn StdError + Send + Sync>) {
    let err = CounterError::TransportWrite(err);
    tracing::error!(%peer, error = %report(&err), "connection failed");
}
