//! Timeout-bounded exact reads and writes over a connected byte stream.

use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use snafu::{ensure, ResultExt};
use tracing::{debug, trace};

use crate::error::{Direction, IoSnafu, PartialWriteSnafu, TimeoutSnafu, TransportError};

/// How long the module gets to become readable or writable.
pub const IO_TIMEOUT: Duration = Duration::from_millis(500);

/// A connected, exclusively owned byte stream to a module.
pub trait ModuleStream: Read + Write {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

impl ModuleStream for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl ModuleStream for std::os::unix::net::UnixStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        std::os::unix::net::UnixStream::set_write_timeout(self, timeout)
    }
}

// Socket timeouts surface as EAGAIN on unix and as TimedOut on windows.
fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Read up to `n` bytes.
///
/// Fails with [`TransportError::Timeout`] if nothing arrives within `timeout`.
/// A clean close by the peer ends the read early and the short buffer is
/// returned as is; it is up to the caller to reject it.
pub fn read_exact<S: ModuleStream + ?Sized>(
    stream: &mut S,
    n: usize,
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    stream
        .set_read_timeout(Some(timeout))
        .context(IoSnafu {
            action: "arming read timeout",
        })?;

    let mut buf = vec![0u8; n];
    let mut count = 0;
    while count < n {
        match stream.read(&mut buf[count..]) {
            Ok(0) => {
                debug!(count, requested = n, "stream closed by module");
                break;
            }
            Ok(rd) => count += rd,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if count == 0 && is_timeout(&e) => {
                return TimeoutSnafu {
                    direction: Direction::Readable,
                    timeout,
                }
                .fail()
            }
            Err(e) => return Err(e).context(IoSnafu { action: "reading" }),
        }
    }
    buf.truncate(count);
    trace!(reply = %hex::encode(&buf), "read");
    Ok(buf)
}

/// Write `bytes` with a single write call.
///
/// Frames are a few bytes long, so a short write is not resumed but
/// reported as [`TransportError::PartialWrite`].
pub fn write_exact<S: ModuleStream + ?Sized>(
    stream: &mut S,
    bytes: &[u8],
    timeout: Duration,
) -> Result<(), TransportError> {
    stream
        .set_write_timeout(Some(timeout))
        .context(IoSnafu {
            action: "arming write timeout",
        })?;

    let written = loop {
        match stream.write(bytes) {
            Ok(written) => break written,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(&e) => {
                return TimeoutSnafu {
                    direction: Direction::Writable,
                    timeout,
                }
                .fail()
            }
            Err(e) => return Err(e).context(IoSnafu { action: "writing" }),
        }
    };
    ensure!(
        written == bytes.len(),
        PartialWriteSnafu {
            written,
            requested: bytes.len(),
        }
    );
    stream.flush().context(IoSnafu { action: "flushing" })
}
