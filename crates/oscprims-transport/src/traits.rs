use std::io;
use std::net::SocketAddr;

/// Datagram that asks a receive loop to stop when it arrives on a local socket.
///
/// Lets a process shut down a loop it cannot reach directly (for example one
/// running in another process on the same host) by sending to its port.
pub const STOP_DATAGRAM: &[u8; 8] = b"__stop_\0";

/// A datagram socket that can be watched for readiness and drained.
///
/// The multiplexer registers [`AsRawFd::as_raw_fd`] with its poller and calls
/// [`receive_from`](DatagramSocket::receive_from) once per ready socket per
/// loop iteration. Implementations must be in non-blocking mode: a blocking
/// read would stall every other socket and timer on the loop. Sockets are
/// `Send + Sync` so the loop owning them can move between threads.
///
/// [`AsRawFd::as_raw_fd`]: std::os::fd::AsRawFd::as_raw_fd
#[cfg(unix)]
pub trait DatagramSocket: std::os::fd::AsRawFd + Send + Sync {
    /// Read one datagram into `buf`.
    ///
    /// Returns `Ok(None)` when no datagram is queued. A datagram larger than
    /// `buf` is truncated to `buf.len()`.
    fn receive_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>>;
}

/// Map a non-blocking read result onto the "no data" convention.
///
/// `Interrupted` is retried; `WouldBlock` becomes `Ok(None)`.
pub(crate) fn retry_nonblocking<T>(
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<Option<T>> {
    loop {
        match op() {
            Ok(value) => return Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(err) => return Err(err),
        }
    }
}
