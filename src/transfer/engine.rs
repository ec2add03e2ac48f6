//! Streaming HTTP transfer engine
//!
//! Moves one remote payload into one local file: streaming GET, chunk loop
//! with stall detection, completeness check against the expected size, and
//! restart-from-zero retries governed by [`RetryPolicy`]. Progress is
//! reported over an event channel; the engine itself never prints.

use futures::StreamExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::TransferError;
use super::events::{ProgressTick, TransferEvent};
use super::retry::RetryPolicy;

/// Default stall window: abort the attempt after this long with no bytes
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-transfer configuration
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Expected payload size from the catalog, 0 when unknown
    pub expected_bytes: u64,
    /// Abort the attempt when no chunk arrives within this window
    pub stall_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            expected_bytes: 0,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, Copy)]
pub struct TransferSummary {
    pub bytes_downloaded: u64,
    pub elapsed: Duration,
    /// How many attempts were needed
    pub attempts: u8,
}

/// Streaming downloader for a single payload at a time
pub struct TransferEngine {
    http: reqwest::Client,
}

impl TransferEngine {
    pub fn new() -> Result<Self, TransferError> {
        let http = reqwest::Client::builder()
            .user_agent("cadenza/0.1.0")
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(TransferError::Transport)?;
        Ok(Self { http })
    }

    /// Download `url` into `dest`, retrying transient failures
    ///
    /// On success the destination file holds exactly the bytes received.
    /// On failure a partial file may remain; every failure is reported to
    /// the caller, never swallowed. Each attempt truncates the destination
    /// and restarts from byte zero.
    pub async fn transfer(
        &self,
        url: &str,
        dest: &Path,
        options: &TransferOptions,
        events: &mpsc::Sender<TransferEvent>,
    ) -> Result<TransferSummary, TransferError> {
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let started = Instant::now();
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let _ = events
                .send(TransferEvent::Started {
                    file_name: file_name.clone(),
                    total_bytes: options.expected_bytes,
                    attempt,
                })
                .await;

            match self.attempt(url, dest, options, events).await {
                Ok(bytes_downloaded) => {
                    let elapsed = started.elapsed();
                    let _ = events
                        .send(TransferEvent::Completed {
                            bytes_downloaded,
                            elapsed,
                        })
                        .await;
                    if attempt > 1 {
                        debug!("Transfer succeeded on attempt {attempt}: {file_name}");
                    }
                    return Ok(TransferSummary {
                        bytes_downloaded,
                        elapsed,
                        attempts: attempt,
                    });
                }
                Err(e) if options.retry.should_retry(&e, attempt) => {
                    warn!("Attempt {attempt} failed ({e}), retrying: {file_name}");
                    let _ = events
                        .send(TransferEvent::AttemptFailed {
                            attempt,
                            reason: e.to_string(),
                        })
                        .await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt: request, stream, write, verify
    async fn attempt(
        &self,
        url: &str,
        dest: &Path,
        options: &TransferOptions,
        events: &mpsc::Sender<TransferEvent>,
    ) -> Result<u64, TransferError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(TransferError::Transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransferError::Http(status));
        }

        // Catalog-declared size wins; fall back to the response header
        let total = if options.expected_bytes > 0 {
            options.expected_bytes
        } else {
            response.content_length().unwrap_or(0)
        };

        // Truncates any partial data from a previous attempt
        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();

        let start = Instant::now();
        let mut downloaded: u64 = 0;

        loop {
            let chunk = match timeout(options.stall_timeout, stream.next()).await {
                Err(_) => return Err(TransferError::Stalled(options.stall_timeout)),
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(TransferError::Transport(e)),
                Ok(Some(Ok(chunk))) => chunk,
            };

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            let elapsed = start.elapsed();
            let throughput = if elapsed.as_secs_f64() > 0.0 {
                downloaded as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            };
            let eta = (total > downloaded && throughput > 0.0)
                .then(|| Duration::from_secs_f64((total - downloaded) as f64 / throughput));

            // One tick per chunk; drop ticks rather than throttle the
            // transfer when the consumer lags
            let _ = events.try_send(TransferEvent::Progress(ProgressTick {
                bytes_downloaded: downloaded,
                bytes_total: total,
                elapsed,
                throughput,
                eta,
            }));
        }

        file.flush().await?;

        if total > 0 && downloaded < total {
            return Err(TransferError::Incomplete {
                received: downloaded,
                expected: total,
            });
        }

        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    /// Scripted per-connection behavior for the fault-injection server
    #[derive(Clone)]
    enum Responder {
        /// Full response with the given status line and body
        Body {
            status: &'static str,
            body: Vec<u8>,
        },
        /// Send headers plus a prefix of the body, then go silent
        Hang { prefix: Vec<u8> },
        /// Accept and immediately close the connection
        Refuse,
    }

    /// Serve scripted responses; the last responder repeats for any
    /// further connections. Returns the URL and a connection counter.
    async fn spawn_server(responders: Vec<Responder>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_srv = hits.clone();

        tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let responder = responders[served.min(responders.len() - 1)].clone();
                served += 1;
                hits_srv.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(respond(socket, responder));
            }
        });

        (format!("http://{addr}/payload"), hits)
    }

    async fn respond(mut socket: TcpStream, responder: Responder) {
        // Drain the request head before answering
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;

        match responder {
            Responder::Body { status, body } => {
                let head = format!(
                    "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
            Responder::Hang { prefix } => {
                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    prefix.len() + 4096
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&prefix).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Responder::Refuse => drop(socket),
        }
    }

    fn collector() -> (
        mpsc::Sender<TransferEvent>,
        tokio::task::JoinHandle<Vec<TransferEvent>>,
    ) {
        let (tx, mut rx) = mpsc::channel(256);
        let handle = tokio::spawn(async move {
            let mut events = Vec::new();
            while let Some(ev) = rx.recv().await {
                events.push(ev);
            }
            events
        });
        (tx, handle)
    }

    #[tokio::test]
    async fn test_success_writes_exact_byte_count() {
        let body = vec![0xAB; 70_000];
        let (url, hits) = spawn_server(vec![Responder::Body {
            status: "200 OK",
            body: body.clone(),
        }])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("track.mp3");
        let engine = TransferEngine::new().unwrap();
        let (tx, events) = collector();

        let summary = engine
            .transfer(&url, &dest, &TransferOptions::default(), &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(summary.bytes_downloaded, 70_000);
        assert_eq!(summary.attempts, 1);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 70_000);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let events = events.await.unwrap();
        assert!(matches!(events.first(), Some(TransferEvent::Started { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, TransferEvent::Progress(_))));
        assert!(matches!(
            events.last(),
            Some(TransferEvent::Completed { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_404_fails_after_single_attempt() {
        let (url, hits) = spawn_server(vec![Responder::Body {
            status: "404 Not Found",
            body: Vec::new(),
        }])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("track.mp3");
        let engine = TransferEngine::new().unwrap();
        let (tx, _events) = collector();

        let err = engine
            .transfer(&url, &dest, &TransferOptions::default(), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Http(s) if s.as_u16() == 404));
        assert_eq!(hits.load(Ordering::SeqCst), 1, "404 must not be retried");
    }

    #[tokio::test]
    async fn test_stall_exhausts_all_attempts() {
        let (url, hits) = spawn_server(vec![Responder::Hang {
            prefix: vec![0u8; 1024],
        }])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("track.mp3");
        let engine = TransferEngine::new().unwrap();
        let (tx, _events) = collector();

        let options = TransferOptions {
            stall_timeout: Duration::from_millis(150),
            retry: RetryPolicy::new(2),
            ..TransferOptions::default()
        };
        let err = engine.transfer(&url, &dest, &options, &tx).await.unwrap_err();

        assert!(matches!(err, TransferError::Stalled(_)));
        assert_eq!(
            hits.load(Ordering::SeqCst),
            3,
            "initial attempt + 2 retries"
        );
    }

    #[tokio::test]
    async fn test_transport_error_retried_then_succeeds() {
        let body = vec![7u8; 2048];
        let (url, hits) = spawn_server(vec![
            Responder::Refuse,
            Responder::Body {
                status: "200 OK",
                body: body.clone(),
            },
        ])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("track.mp3");
        let engine = TransferEngine::new().unwrap();
        let (tx, events) = collector();

        let summary = engine
            .transfer(&url, &dest, &TransferOptions::default(), &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(summary.attempts, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read(&dest).unwrap(), body);

        let events = events.await.unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, TransferEvent::AttemptFailed { attempt: 1, .. })));
    }

    #[tokio::test]
    async fn test_short_body_reported_incomplete() {
        // Server answers cleanly with 50 bytes while the catalog declared 100
        let (url, hits) = spawn_server(vec![Responder::Body {
            status: "200 OK",
            body: vec![1u8; 50],
        }])
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("track.mp3");
        let engine = TransferEngine::new().unwrap();
        let (tx, _events) = collector();

        let options = TransferOptions {
            expected_bytes: 100,
            retry: RetryPolicy::new(1),
            ..TransferOptions::default()
        };
        let err = engine.transfer(&url, &dest, &options, &tx).await.unwrap_err();

        assert!(matches!(
            err,
            TransferError::Incomplete {
                received: 50,
                expected: 100
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2, "short body is retried");
    }
}
