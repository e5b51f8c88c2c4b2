//! Bounded-memory streaming of a byte range from disk.
//!
//! A [`StreamSession`] owns one open file handle positioned at the start of
//! its range and hands out chunks of at most `chunk_size` bytes. Chunks are
//! only read when the consumer asks for the next one, so a slow client slows
//! disk reads instead of growing a buffer. Dropping the session closes the
//! file, which is how client disconnects and idle timeouts release it.

use std::error::Error as StdError;
use std::io::{self, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use futures::{stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use cs_core::{ByteRange, MediaIdentifier, MediaLocation};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a connection ended with an error once responses were being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The client went away. Not a server fault.
    #[error("client disconnected ({0:?})")]
    Disconnected(io::ErrorKind),
    /// Our own response body failed, e.g. the file could not be read.
    #[error("response body failed ({0:?})")]
    Body(Option<io::ErrorKind>),
    /// The socket failed for a reason other than the peer leaving.
    #[error("connection I/O error ({0:?})")]
    Io(io::ErrorKind),
    /// Anything without an I/O cause, such as a malformed request.
    #[error("protocol error")]
    Protocol,
}

impl TransportError {
    /// Classify the error a hyper connection ended with.
    pub fn classify(err: &hyper::Error) -> Self {
        if err.is_incomplete_message() {
            return TransportError::Disconnected(io::ErrorKind::UnexpectedEof);
        }
        Self::from_chain(err, err.is_user())
    }

    /// Classify from the source chain. `from_body` is set when the error
    /// came out of our response body rather than the socket.
    fn from_chain(err: &(dyn StdError + 'static), from_body: bool) -> Self {
        let io = io_cause(err);
        if from_body {
            return TransportError::Body(io.map(io::Error::kind));
        }
        match io {
            Some(e) if is_disconnect(e) => TransportError::Disconnected(e.kind()),
            Some(e) => TransportError::Io(e.kind()),
            None => TransportError::Protocol,
        }
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Disconnected(_))
    }
}

/// First `io::Error` in the source chain of `err`, including `err` itself.
fn io_cause<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a io::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<io::Error>() {
            return Some(io);
        }
        current = e.source();
    }
    None
}

/// Whether an I/O error means the peer closed the connection.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::WriteZero
    )
}

// ---------------------------------------------------------------------------
// Active stream gauge
// ---------------------------------------------------------------------------

/// Count of sessions currently holding a file handle.
#[derive(Debug, Clone, Default)]
pub struct ActiveStreams(Arc<AtomicUsize>);

impl ActiveStreams {
    pub fn current(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ActiveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        ActiveGuard(self.0.clone())
    }
}

#[derive(Debug)]
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// StreamSession
// ---------------------------------------------------------------------------

/// Live transfer of one byte range of one file to one client.
#[derive(Debug)]
pub struct StreamSession {
    identifier: MediaIdentifier,
    range: ByteRange,
    chunks: ReaderStream<Take<File>>,
    delivered: u64,
    _active: ActiveGuard,
}

impl StreamSession {
    /// Open the file and seek to `range.start()`.
    pub async fn open(
        location: &MediaLocation,
        range: ByteRange,
        chunk_size: usize,
        active: &ActiveStreams,
    ) -> io::Result<Self> {
        let mut file = File::open(location.path()).await?;
        file.seek(SeekFrom::Start(range.start())).await?;

        // Take caps reads at the range; the capacity caps each chunk.
        let limited = file.take(range.len());
        Ok(Self {
            identifier: location.identifier().clone(),
            range,
            chunks: ReaderStream::with_capacity(limited, chunk_size.max(1)),
            delivered: 0,
            _active: active.enter(),
        })
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    /// Bytes handed to the consumer so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    fn remaining(&self) -> u64 {
        self.range.len() - self.delivered
    }

    /// Read the next chunk, or `None` once the whole range was delivered.
    ///
    /// A file that ends before the planned range is an `UnexpectedEof`
    /// error, since the promised `Content-Length` can no longer be met.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        match self.chunks.next().await {
            Some(Ok(chunk)) => {
                self.delivered += chunk.len() as u64;
                Ok(Some(chunk))
            }
            Some(Err(e)) => Err(e),
            None if self.remaining() > 0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} shrank: {} of {} bytes read",
                    self.identifier,
                    self.delivered,
                    self.range.len()
                ),
            )),
            None => Ok(None),
        }
    }

    /// Turn the session into a pull-driven HTTP body.
    ///
    /// hyper polls for the next chunk only after the previous one was
    /// written, which gives backpressure. A read error ends the body early
    /// and hyper aborts the connection.
    pub fn into_body(self) -> Body {
        let chunks = stream::unfold(Some(self), |state| async move {
            let mut session = state?;
            match session.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok::<Bytes, io::Error>(chunk), Some(session))),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(
                        identifier = %session.identifier,
                        range = %session.range,
                        error = %e,
                        "Stream read failed after headers were sent"
                    );
                    Some((Err(e), None))
                }
            }
        });
        Body::from_stream(chunks)
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.remaining() > 0 {
            tracing::debug!(
                identifier = %self.identifier,
                range = %self.range,
                delivered = self.delivered,
                "Stream ended early (client gone or I/O error)"
            );
        } else {
            tracing::trace!(
                identifier = %self.identifier,
                range = %self.range,
                "Stream complete"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use http_body_util::BodyExt;
    use std::path::Path;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn location(dir: &Path, data: &[u8]) -> MediaLocation {
        let path = dir.join("cam1.mp4");
        std::fs::write(&path, data).unwrap();
        let id = MediaIdentifier::parse("cam1.mp4", &["mp4".to_string()]).unwrap();
        MediaLocation::new(id, path, data.len() as u64)
    }

    async fn drain(session: &mut StreamSession) -> io::Result<Vec<Bytes>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = session.next_chunk().await? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    #[tokio::test]
    async fn reads_exact_slice() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(10_000);
        let loc = location(dir.path(), &data);
        let range = ByteRange::new(1234, 5678, 10_000).unwrap();
        let active = ActiveStreams::default();

        let mut session = StreamSession::open(&loc, range, 1000, &active).await.unwrap();
        let out: Vec<u8> = drain(&mut session).await.unwrap().concat();

        assert_eq!(out, &data[1234..=5678]);
        assert_eq!(session.delivered(), range.len());
        drop(session);
        assert_eq!(active.current(), 0);
    }

    #[tokio::test]
    async fn chunks_never_exceed_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(4096 * 3 + 17);
        let loc = location(dir.path(), &data);
        let range = ByteRange::full(data.len() as u64).unwrap();
        let active = ActiveStreams::default();

        let mut session = StreamSession::open(&loc, range, 4096, &active).await.unwrap();
        let chunks = drain(&mut session).await.unwrap();
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 4096));
        assert_eq!(chunks.concat(), data);
        assert_eq!(session.delivered(), data.len() as u64);
    }

    #[tokio::test]
    async fn body_streams_range() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(3000);
        let loc = location(dir.path(), &data);
        let range = ByteRange::new(2000, 2999, 3000).unwrap();
        let active = ActiveStreams::default();

        let body = StreamSession::open(&loc, range, 256, &active)
            .await
            .unwrap()
            .into_body();
        assert_eq!(active.current(), 1);

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), &data[2000..]);
        assert_eq!(active.current(), 0);
    }

    #[tokio::test]
    async fn dropping_body_mid_stream_releases_handle() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(100_000);
        let loc = location(dir.path(), &data);
        let range = ByteRange::full(100_000).unwrap();
        let active = ActiveStreams::default();

        let body = StreamSession::open(&loc, range, 1024, &active)
            .await
            .unwrap()
            .into_body();
        let mut frames = body.into_data_stream();
        let first = frames.next().await.unwrap().unwrap();
        assert!(!first.is_empty() && first.len() <= 1024);
        assert_eq!(active.current(), 1);

        drop(frames);
        assert_eq!(active.current(), 0);
    }

    #[tokio::test]
    async fn truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(1000);
        let loc = location(dir.path(), &data);
        // Plan against the full size, then shrink the file.
        let range = ByteRange::full(1000).unwrap();
        std::fs::write(loc.path(), &data[..600]).unwrap();
        let active = ActiveStreams::default();

        let mut session = StreamSession::open(&loc, range, 256, &active).await.unwrap();
        assert_matches!(
            drain(&mut session).await,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof
        );
        assert_eq!(session.delivered(), 600);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("socket write failed")]
    struct WriteFailed(#[source] io::Error);

    #[test]
    fn peer_hang_up_is_a_disconnect() {
        let err = WriteFailed(io::ErrorKind::BrokenPipe.into());
        let kind = TransportError::from_chain(&err, false);
        assert_eq!(kind, TransportError::Disconnected(io::ErrorKind::BrokenPipe));
        assert!(kind.is_disconnect());

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(TransportError::from_chain(&reset, false).is_disconnect());
    }

    #[test]
    fn other_socket_failures_are_io_errors() {
        let err = WriteFailed(io::ErrorKind::PermissionDenied.into());
        assert_eq!(
            TransportError::from_chain(&err, false),
            TransportError::Io(io::ErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn body_failures_are_not_disconnects() {
        // Body errors reach hyper wrapped in axum::Error.
        let err = axum::Error::new(io::Error::new(io::ErrorKind::UnexpectedEof, "shrank"));
        let kind = TransportError::from_chain(&err, true);
        assert_eq!(kind, TransportError::Body(Some(io::ErrorKind::UnexpectedEof)));
        assert!(!kind.is_disconnect());
    }

    #[test]
    fn errors_without_io_cause_are_protocol_errors() {
        let err = axum::Error::new("bad request line");
        assert_eq!(
            TransportError::from_chain(&err, false),
            TransportError::Protocol
        );
    }

    #[test]
    fn disconnect_kinds() {
        assert!(is_disconnect(&io::ErrorKind::BrokenPipe.into()));
        assert!(is_disconnect(&io::ErrorKind::ConnectionReset.into()));
        assert!(!is_disconnect(&io::ErrorKind::UnexpectedEof.into()));
        assert!(!is_disconnect(&io::ErrorKind::PermissionDenied.into()));
    }
}
