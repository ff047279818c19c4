//! Byte stream decorators for bulk transfers that read framed chunks of
//! binary data from a single shared connection.
//!
//! [`OpenReader`] shields a shared source from being closed by a per-chunk
//! consumer; [`BoundedReader`] exposes only the next `n` bytes of it. The
//! [`chunk`] helper stacks the two into the per-frame chain, and [`copy`]
//! drains a chain into a writer.

use std::io::{Read, Write};

pub mod bounded_reader;
pub mod open_reader;
pub mod source;

pub use bounded_reader::{AsyncBoundedReader, BoundedReader};
pub use open_reader::{AsyncOpenReader, OpenReader};
pub use source::{ByteSource, MemorySource, ReaderSource};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUFFER_SIZE: usize = 32 * 1024;

#[inline(always)]
#[cold]
fn cold_path() {}

#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if b {
        true
    } else {
        cold_path();
        false
    }
}

#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
        true
    } else {
        false
    }
}

/// Builds the per-chunk chain over a shared source: a bounded view of the
/// next `len` bytes whose close (and drop) leaves the source untouched.
pub fn chunk<S: ByteSource>(source: &mut S, len: u64) -> BoundedReader<OpenReader<&mut S>> {
    BoundedReader::new(OpenReader::new(source), len)
}

/// Drains `reader` into `writer`, returning the number of bytes moved.
pub fn copy(
    reader: &mut (impl ?Sized + Read),
    writer: &mut (impl ?Sized + Write),
) -> std::io::Result<u64> {
    let mut buffer = vec![0; BUFFER_SIZE];

    copy_shared(&mut buffer, reader, writer)
}

/// [`copy`] with a caller-supplied scratch buffer, for consumers pumping
/// many chunks in a row.
pub fn copy_shared(
    buffer: &mut [u8],
    reader: &mut (impl ?Sized + Read),
    writer: &mut (impl ?Sized + Write),
) -> std::io::Result<u64> {
    let mut total = 0;

    loop {
        let bytes_read = reader.read(buffer)?;

        if unlikely(bytes_read == 0) {
            break;
        }

        writer.write_all(&buffer[..bytes_read])?;
        total += bytes_read as u64;
    }

    Ok(total)
}
