//! Draining response bodies so the connection can be reused.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Upper bound on the bytes read before closing. Roughly a typical TCP
/// buffer.
pub const DRAIN_LIMIT: usize = 256 << 10;

/// A body that can be read chunk by chunk and then closed.
#[async_trait]
pub trait DrainBody: Send {
    /// Read the next chunk; `None` at the end of the body.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;

    /// Release the body.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[async_trait]
impl DrainBody for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunk().await?)
    }

    async fn close(self) -> Result<()> {
        drop(self);
        Ok(())
    }
}

/// Read up to [`DRAIN_LIMIT`] bytes from `body` and then close it.
///
/// A read error is returned, but `close` is still called. Otherwise the
/// result of `close` is returned. A missing body is a no-op.
pub async fn drain_close<B: DrainBody>(body: Option<B>) -> Result<()> {
    let Some(mut body) = body else {
        return Ok(());
    };

    let mut read = 0usize;
    let drained = loop {
        if read >= DRAIN_LIMIT {
            break Ok(());
        }
        match body.next_chunk().await {
            Ok(Some(chunk)) => read += chunk.len(),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    match drained {
        Ok(()) => body.close().await,
        Err(e) => {
            if let Err(close_err) = body.close().await {
                tracing::debug!(error = %close_err, "Close after failed drain also failed");
            }
            Err(e)
        }
    }
}
