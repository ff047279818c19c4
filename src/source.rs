use std::io::{Cursor, Read};

/// A sequential byte source: `std::io::Read` plus the skip, mark/reset,
/// availability and close operations a chunked transfer needs.
///
/// End of data is `Ok(0)` from [`Read::read`] and `Ok(None)` from
/// [`read_byte`](ByteSource::read_byte). Decorators expose this same trait,
/// so a wrapped source can be passed anywhere a plain source is expected.
pub trait ByteSource: Read {
    /// Reads a single byte, `None` at end of data.
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut byte = [0; 1];

        if self.read(&mut byte)? == 0 {
            Ok(None)
        } else {
            Ok(Some(byte[0]))
        }
    }

    /// Skips up to `n` bytes, returning how many were actually skipped.
    fn skip(&mut self, n: u64) -> std::io::Result<u64> {
        let mut scratch = vec![0; std::cmp::min(n, crate::BUFFER_SIZE as u64) as usize];
        let mut skipped = 0;

        while skipped < n {
            let to_read = std::cmp::min(n - skipped, scratch.len() as u64) as usize;
            let bytes_read = self.read(&mut scratch[..to_read])?;

            if crate::unlikely(bytes_read == 0) {
                break;
            }

            skipped += bytes_read as u64;
        }

        Ok(skipped)
    }

    /// Remembers the current position so [`reset`](ByteSource::reset) can
    /// return to it. `read_limit` hints how far the caller intends to read
    /// past the mark; sources without mark support accept and ignore the call.
    fn mark(&mut self, read_limit: usize) {
        let _ = read_limit;
    }

    /// Returns to the most recent mark.
    fn reset(&mut self) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "mark/reset not supported",
        ))
    }

    fn mark_supported(&self) -> bool {
        false
    }

    /// Estimate of the bytes readable without blocking. 0 when unknown.
    fn available(&self) -> u64 {
        0
    }

    /// Releases the source. Reads after a close fail.
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn skip(&mut self, n: u64) -> std::io::Result<u64> {
        (**self).skip(n)
    }

    fn mark(&mut self, read_limit: usize) {
        (**self).mark(read_limit)
    }

    fn reset(&mut self) -> std::io::Result<()> {
        (**self).reset()
    }

    fn mark_supported(&self) -> bool {
        (**self).mark_supported()
    }

    fn available(&self) -> u64 {
        (**self).available()
    }

    fn close(&mut self) -> std::io::Result<()> {
        (**self).close()
    }
}

/// In-memory source with full mark/reset support, used for replaying
/// buffered frames and in tests.
pub struct MemorySource<T: AsRef<[u8]>> {
    cursor: Cursor<T>,
    mark: Option<u64>,
    closed: bool,
}

impl<T: AsRef<[u8]>> MemorySource<T> {
    pub fn new(data: T) -> Self {
        Self {
            cursor: Cursor::new(data),
            mark: None,
            closed: false,
        }
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn remaining_len(&self) -> u64 {
        let len = self.cursor.get_ref().as_ref().len() as u64;

        len.saturating_sub(self.cursor.position())
    }

    fn ensure_open(&self) -> std::io::Result<()> {
        if crate::unlikely(self.closed) {
            return Err(std::io::Error::other("source is closed"));
        }

        Ok(())
    }
}

impl<T: AsRef<[u8]>> Read for MemorySource<T> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.ensure_open()?;

        self.cursor.read(buf)
    }
}

impl<T: AsRef<[u8]>> ByteSource for MemorySource<T> {
    fn skip(&mut self, n: u64) -> std::io::Result<u64> {
        self.ensure_open()?;

        let skipped = std::cmp::min(n, self.remaining_len());
        self.cursor.set_position(self.cursor.position() + skipped);

        Ok(skipped)
    }

    fn mark(&mut self, _read_limit: usize) {
        self.mark = Some(self.cursor.position());
    }

    fn reset(&mut self) -> std::io::Result<()> {
        self.ensure_open()?;

        match self.mark {
            Some(position) => {
                self.cursor.set_position(position);

                Ok(())
            }
            None => Err(std::io::Error::other("mark not set")),
        }
    }

    fn mark_supported(&self) -> bool {
        true
    }

    fn available(&self) -> u64 {
        if self.closed {
            return 0;
        }

        self.remaining_len()
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.closed = true;

        Ok(())
    }
}

/// Adapts any plain [`Read`] (socket, file, decompressor) into a
/// [`ByteSource`]. Mark/reset is not supported and availability is unknown.
pub struct ReaderSource<R: Read> {
    inner: R,
    closed: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if crate::unlikely(self.closed) {
            return Err(std::io::Error::other("source is closed"));
        }

        self.inner.read(buf)
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn close(&mut self) -> std::io::Result<()> {
        self.closed = true;

        Ok(())
    }
}
