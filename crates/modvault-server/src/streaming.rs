//! Streaming bodies between the async front end and the blocking store.
//!
//! Stored artifacts are read on the blocking pool and forwarded in chunks,
//! so a handle stays open only while its response body is being sent.
//! Upload bodies go the other way: the ingester reads them as a plain
//! `Read` while chunks are still arriving.

use std::io::{self, Read};

use axum::body::{Body, Bytes};
use modvault_store::Artifact;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the reader thread and the connection.
const CHANNEL_DEPTH: usize = 4;

/// Stream an artifact as a response body.
///
/// The artifact is dropped after its last chunk is handed over, or as soon
/// as the receiving side goes away.
pub fn artifact_body(artifact: Artifact) -> Body {
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || forward_chunks(artifact, &tx));
    Body::from_stream(ReceiverStream::new(rx))
}

fn forward_chunks(mut artifact: Artifact, tx: &mpsc::Sender<io::Result<Bytes>>) {
    loop {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let chunk = match artifact.reader.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => {
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "failed reading stored artifact mid-response");
                Err(e)
            }
        };
        let failed = chunk.is_err();
        if tx.blocking_send(chunk).is_err() {
            debug!("response dropped before artifact was fully sent");
            return;
        }
        if failed {
            return;
        }
    }
}

/// Expose a request body as a blocking reader.
///
/// Must be called from within the runtime; the reader itself is meant for
/// the blocking pool.
pub fn body_reader(body: Body) -> impl Read + Send + 'static {
    let chunks = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(io::Error::other));
    SyncIoBridge::new(StreamReader::new(Box::pin(chunks)))
}

/// A reader that fails once its source yields more than `limit` bytes.
#[derive(Debug)]
pub struct LimitedReader<R> {
    inner: R,
    remaining: u64,
    exceeded: bool,
}

impl<R: Read> LimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        LimitedReader {
            inner,
            remaining: limit,
            exceeded: false,
        }
    }

    /// Whether reading stopped because the limit was passed.
    pub fn exceeded(&self) -> bool {
        self.exceeded
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            // One more byte tells a body of exactly `limit` bytes from a larger one.
            let mut extra = [0u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => {
                    self.exceeded = true;
                    Err(io::Error::other("upload exceeds size limit"))
                }
            };
        }
        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
