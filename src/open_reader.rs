use crate::source::ByteSource;
use std::{
    io::Read,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};

/// Proxy that forwards every read-family operation to the wrapped source but
/// turns `close` into a no-op, so a per-chunk view can be closed or dropped
/// without tearing down the shared connection behind it.
pub struct OpenReader<S> {
    inner: S,
}

impl<S> OpenReader<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read> Read for OpenReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<S: ByteSource> ByteSource for OpenReader<S> {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        self.inner.read_byte()
    }

    fn skip(&mut self, n: u64) -> std::io::Result<u64> {
        self.inner.skip(n)
    }

    fn mark(&mut self, read_limit: usize) {
        self.inner.mark(read_limit)
    }

    fn reset(&mut self) -> std::io::Result<()> {
        self.inner.reset()
    }

    fn mark_supported(&self) -> bool {
        self.inner.mark_supported()
    }

    fn available(&self) -> u64 {
        self.inner.available()
    }

    fn close(&mut self) -> std::io::Result<()> {
        tracing::debug!("ignoring close of shared source");

        Ok(())
    }
}

pub struct AsyncOpenReader<R: AsyncRead + Unpin> {
    inner: R,
}

impl<R: AsyncRead + Unpin> AsyncOpenReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for AsyncOpenReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}
