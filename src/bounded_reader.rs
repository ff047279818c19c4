use crate::source::ByteSource;
use std::{
    io::Read,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};

/// View of at most `limit` bytes from the wrapped source. Once the budget is
/// consumed every read reports end of data, no matter how much the source
/// still holds; a fresh view over the same source picks up where this one
/// stopped. Closing or dropping the view never closes the source.
///
/// Requests are clamped before delegation, so the source is never asked for
/// more than the view's remaining budget. The budget shrinks only by the
/// byte counts the source actually reports, short reads included.
pub struct BoundedReader<S> {
    inner: S,
    remaining: u64,
    mark: Option<u64>,
}

impl<S> BoundedReader<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            mark: None,
        }
    }

    /// Bytes still readable through this view.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read> Read for BoundedReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if crate::unlikely(self.remaining == 0) {
            return Ok(0);
        }

        let to_read = std::cmp::min(buf.len() as u64, self.remaining) as usize;
        let bytes_read = self.inner.read(&mut buf[..to_read])?;
        self.remaining -= bytes_read as u64;

        Ok(bytes_read)
    }
}

impl<S: ByteSource> ByteSource for BoundedReader<S> {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        if crate::unlikely(self.remaining == 0) {
            return Ok(None);
        }

        let byte = self.inner.read_byte()?;
        if crate::likely(byte.is_some()) {
            self.remaining -= 1;
        }

        Ok(byte)
    }

    fn skip(&mut self, n: u64) -> std::io::Result<u64> {
        let skipped = self.inner.skip(std::cmp::min(n, self.remaining))?;
        self.remaining -= skipped;

        Ok(skipped)
    }

    // marking is allowed even when the source cannot reset; the failure
    // surfaces on reset
    fn mark(&mut self, read_limit: usize) {
        self.inner.mark(read_limit);
        self.mark = Some(self.remaining);
    }

    fn reset(&mut self) -> std::io::Result<()> {
        if !self.inner.mark_supported() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "mark/reset not supported",
            ));
        }

        let mark = self
            .mark
            .ok_or_else(|| std::io::Error::other("mark not set"))?;

        self.inner.reset()?;
        self.remaining = mark;

        Ok(())
    }

    fn mark_supported(&self) -> bool {
        self.inner.mark_supported()
    }

    fn available(&self) -> u64 {
        std::cmp::min(self.inner.available(), self.remaining)
    }

    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub struct AsyncBoundedReader<R: AsyncRead + Unpin> {
    inner: R,
    remaining: u64,
}

impl<R: AsyncRead + Unpin> AsyncBoundedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for AsyncBoundedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if crate::unlikely(self.remaining == 0) {
            return Poll::Ready(Ok(()));
        }

        let to_read = std::cmp::min(buf.remaining() as u64, self.remaining) as usize;
        let init = buf.initialize_unfilled_to(to_read);
        let mut bounded_buf = ReadBuf::new(init);

        match Pin::new(&mut self.inner).poll_read(cx, &mut bounded_buf) {
            Poll::Ready(Ok(())) => {
                let bytes_read = bounded_buf.filled().len();
                buf.advance(bytes_read);
                self.remaining -= bytes_read as u64;

                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemorySource, ReaderSource};
    use tokio::io::AsyncReadExt;

    #[test]
    fn yields_at_most_the_limit() {
        let mut source = MemorySource::new([1u8, 2, 3, 4, 5, 6, 7, 8]);

        let mut view = BoundedReader::new(&mut source, 5);
        let mut out = Vec::new();
        view.read_to_end(&mut out).unwrap();

        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert!(view.is_exhausted());
    }

    #[test]
    fn yields_everything_when_source_is_shorter() {
        let mut source = MemorySource::new([1u8, 2, 3]);

        let mut view = BoundedReader::new(&mut source, 10);
        let mut out = Vec::new();
        view.read_to_end(&mut out).unwrap();

        assert_eq!(out, [1, 2, 3]);
        assert_eq!(view.remaining(), 7);
    }

    #[test]
    fn exhausted_view_does_not_touch_the_source() {
        let mut source = MemorySource::new([1u8, 2, 3, 4]);

        let mut view = BoundedReader::new(&mut source, 2);
        let mut out = [0; 4];
        assert_eq!(view.read(&mut out).unwrap(), 2);

        assert_eq!(view.read(&mut out).unwrap(), 0);
        assert_eq!(view.read_byte().unwrap(), None);
        drop(view);

        assert_eq!(source.position(), 2);
    }

    #[test]
    fn skip_clamps_to_remaining() {
        let mut source = MemorySource::new([1u8, 2, 3, 4, 5, 6, 7, 8]);

        let mut view = BoundedReader::new(&mut source, 3);
        assert_eq!(view.skip(100).unwrap(), 3);
        assert!(view.is_exhausted());
        drop(view);

        assert_eq!(source.position(), 3);
    }

    #[test]
    fn skip_reports_short_skips() {
        let mut source = MemorySource::new([1u8, 2]);

        let mut view = BoundedReader::new(&mut source, 5);
        assert_eq!(view.skip(4).unwrap(), 2);
        assert_eq!(view.remaining(), 3);
    }

    #[test]
    fn mark_and_reset_restore_the_budget() {
        let mut source = MemorySource::new([1u8, 2, 3, 4, 5, 6]);
        let mut view = BoundedReader::new(&mut source, 5);

        assert_eq!(view.read_byte().unwrap(), Some(1));
        view.mark(4);
        let budget = view.remaining();

        assert_eq!(view.read_byte().unwrap(), Some(2));
        assert_eq!(view.read_byte().unwrap(), Some(3));

        view.reset().unwrap();
        assert_eq!(view.remaining(), budget);
        assert_eq!(view.read_byte().unwrap(), Some(2));
        assert_eq!(view.read_byte().unwrap(), Some(3));
    }

    #[test]
    fn reset_without_mark_fails() {
        let mut source = MemorySource::new([1u8, 2, 3]);
        let mut view = BoundedReader::new(&mut source, 2);

        let err = view.reset().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn reset_over_unmarkable_source_fails() {
        let mut source = ReaderSource::new(&[1u8, 2, 3][..]);
        let mut view = BoundedReader::new(&mut source, 2);

        view.mark(2);

        let err = view.reset().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }

    #[test]
    fn available_is_clamped_both_ways() {
        let mut source = MemorySource::new([1u8, 2, 3, 4, 5, 6, 7, 8]);

        let view = BoundedReader::new(&mut source, 3);
        assert_eq!(view.available(), 3);
        drop(view);

        let mut short = MemorySource::new([1u8, 2]);
        let view = BoundedReader::new(&mut short, 100);
        assert_eq!(view.available(), 2);
    }

    #[test]
    fn close_leaves_the_source_open() {
        let mut source = MemorySource::new([1u8, 2, 3, 4]);

        let mut view = BoundedReader::new(&mut source, 2);
        assert_eq!(view.read_byte().unwrap(), Some(1));
        view.close().unwrap();
        drop(view);

        assert!(!source.is_closed());
        assert_eq!(source.read_byte().unwrap(), Some(2));
    }

    #[test]
    fn consecutive_views_walk_the_source() {
        let mut source = MemorySource::new([1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let mut first = BoundedReader::new(&mut source, 4);
        let mut out = Vec::new();
        first.read_to_end(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(first.read_byte().unwrap(), None);
        drop(first);

        let mut second = BoundedReader::new(&mut source, 3);
        let mut out = Vec::new();
        second.read_to_end(&mut out).unwrap();
        assert_eq!(out, [5, 6, 7]);
    }

    #[test]
    fn zero_limit_view_is_empty() {
        let mut source = MemorySource::new([1u8, 2, 3]);

        let mut view = BoundedReader::new(&mut source, 0);
        assert!(view.is_exhausted());
        assert_eq!(view.read_byte().unwrap(), None);
        drop(view);

        assert_eq!(source.position(), 0);
    }

    #[tokio::test]
    async fn async_view_stops_at_the_limit() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];

        let mut view = AsyncBoundedReader::new(&data[..], 5);
        let mut out = Vec::new();
        view.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert_eq!(view.remaining(), 0);
    }

    #[tokio::test]
    async fn async_view_yields_short_sources_whole() {
        let data = [9u8, 9];

        let mut view = AsyncBoundedReader::new(&data[..], 6);
        let mut out = Vec::new();
        view.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, [9, 9]);
        assert_eq!(view.remaining(), 4);
    }
}
