//! Sampling responder: answers every TCP connection with the same response
//!
//! Each accepted connection runs in its own task. The request is read only to
//! find out when the client has finished sending its head; its content never
//! affects what is written back.

use crate::config::ResponderConfig;
use crate::error::{ResponderError, Result};
use crate::metrics::{self, ResponseOutcome};
use crate::response::RenderedResponse;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause after a failed accept (e.g. EMFILE) before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Upper bound on discarding unread request bytes after the response is sent.
const MAX_DRAIN_TIME: Duration = Duration::from_secs(1);

/// Stand-in deadline when a configured timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Per-connection limits, copied into every connection task
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub max_request_bytes: usize,
}

impl From<&ResponderConfig> for ConnectionSettings {
    fn from(config: &ResponderConfig) -> Self {
        Self {
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            max_request_bytes: config.max_request_bytes,
        }
    }
}

/// How reading the request ended
#[derive(Debug)]
pub enum ReadOutcome {
    /// Saw the blank line that ends the request head
    HeadComplete(usize),
    /// Client closed its side (possibly without sending anything)
    Eof(usize),
    /// Hit `max_request_bytes` before the head ended
    Capped(usize),
    TimedOut(usize),
    Failed(std::io::Error),
}

impl ReadOutcome {
    /// Whether the client may still be sending, so unread input should be drained
    fn peer_still_open(&self) -> bool {
        matches!(
            self,
            ReadOutcome::HeadComplete(_) | ReadOutcome::Capped(_) | ReadOutcome::TimedOut(_)
        )
    }
}

/// Bind the responder socket. Failure here is fatal for the process.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ResponderError::Bind { addr, source })
}

/// Accept connections until `shutdown` is cancelled, spawning one task per
/// connection. The listening socket is closed on return; in-flight
/// connection tasks keep running on the runtime.
pub async fn serve(
    listener: TcpListener,
    response: RenderedResponse,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) {
    match listener.local_addr() {
        Ok(addr) => info!("Sampling responder listening on {}", addr),
        Err(_) => info!("Sampling responder listening"),
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, closing listener");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    metrics::CONNECTIONS_TOTAL.inc();
                    let response = response.bytes();
                    tokio::spawn(handle_connection(stream, peer, response, settings));
                }
                Err(e) => {
                    metrics::ACCEPT_ERRORS.inc();
                    warn!("accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Serve a single accepted connection. Errors stay local to this connection.
pub async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    response: Bytes,
    settings: ConnectionSettings,
) {
    let started = std::time::Instant::now();
    metrics::ACTIVE_CONNECTIONS.inc();

    let _ = stream.set_nodelay(true);
    let outcome = respond(&mut stream, &response, settings).await;
    metrics::record_response(outcome);
    debug!(
        peer = %peer,
        outcome = outcome.as_label(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "connection closed"
    );

    metrics::ACTIVE_CONNECTIONS.dec();
    metrics::CONNECTION_DURATION.observe(started.elapsed().as_secs_f64());
}

/// Read the request head (bounded), write `response`, close the write half,
/// then drain whatever the client is still sending.
pub async fn respond<S>(stream: &mut S, response: &[u8], settings: ConnectionSettings) -> ResponseOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let read = read_request_head(stream, settings).await;
    debug!(read = ?read, "request read finished");

    let written = timeout(settings.write_timeout, write_response(stream, response)).await;

    let outcome = match written {
        Ok(Ok(())) => ResponseOutcome::Ok,
        Ok(Err(e)) => {
            debug!("write failed: {}", e);
            return ResponseOutcome::WriteError;
        }
        Err(_) => {
            debug!("write timed out after {:?}", settings.write_timeout);
            return ResponseOutcome::WriteTimeout;
        }
    };

    if read.peer_still_open() {
        drain(stream, settings.read_timeout.min(MAX_DRAIN_TIME)).await;
    }
    outcome
}

/// Write the whole response and close the write half.
pub async fn write_response<S>(stream: &mut S, response: &[u8]) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(response).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read until the end of the request head, EOF, the size cap, or the timeout.
pub async fn read_request_head<S>(stream: &mut S, settings: ConnectionSettings) -> ReadOutcome
where
    S: AsyncRead + Unpin,
{
    let deadline = deadline_after(settings.read_timeout);
    let mut buf = vec![0u8; settings.max_request_bytes];
    let mut filled = 0;

    loop {
        if filled >= buf.len() {
            return ReadOutcome::Capped(filled);
        }
        match timeout_at(deadline, stream.read(&mut buf[filled..])).await {
            Err(_) => return ReadOutcome::TimedOut(filled),
            Ok(Err(e)) => return ReadOutcome::Failed(e),
            Ok(Ok(0)) => return ReadOutcome::Eof(filled),
            Ok(Ok(n)) => {
                let searched_to = filled;
                filled += n;
                if head_complete(&buf[..filled], searched_to) {
                    return ReadOutcome::HeadComplete(filled);
                }
            }
        }
    }
}

/// `now + limit`, saturating to a far-future instant when that overflows
fn deadline_after(limit: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(limit).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Whether `buf` holds a blank line ending the head, looking only at bytes
/// that could form one given `searched_to` bytes were already checked.
fn head_complete(buf: &[u8], searched_to: usize) -> bool {
    let start = searched_to.saturating_sub(3);
    let window = &buf[start..];
    window.windows(4).any(|w| w == b"\r\n\r\n") || window.windows(2).any(|w| w == b"\n\n")
}

/// Discard inbound bytes until EOF or `limit`, so closing the socket does not
/// reset the connection before the client has read the response.
async fn drain<S>(stream: &mut S, limit: Duration)
where
    S: AsyncRead + Unpin,
{
    let deadline = deadline_after(limit);
    let mut scratch = [0u8; 1024];
    while let Ok(Ok(n)) = timeout_at(deadline, stream.read(&mut scratch)).await {
        if n == 0 {
            break;
        }
    }
}
