use std::net::SocketAddr;

use crate::error::ListenerResult;

/// Receives every datagram read from the socket it is attached to.
///
/// `data` borrows the multiplexer's scratch buffer and is only valid for the
/// duration of the call. Returning an error ends the receive loop.
///
/// Listeners are `Send + Sync` so that a multiplexer can be set up on one
/// thread and run on another. Closures of the form
/// `Fn(&[u8], SocketAddr) -> ListenerResult` implement this trait.
pub trait PacketListener: Send + Sync {
    /// Handle one datagram received from `remote`.
    fn process_packet(&self, data: &[u8], remote: SocketAddr) -> ListenerResult;
}

impl<F> PacketListener for F
where
    F: Fn(&[u8], SocketAddr) -> ListenerResult + Send + Sync,
{
    fn process_packet(&self, data: &[u8], remote: SocketAddr) -> ListenerResult {
        self(data, remote)
    }
}

/// Called each time a periodic timer comes due.
///
/// Closures of the form `Fn() -> ListenerResult` implement this trait.
pub trait TimerListener: Send + Sync {
    /// Handle one expiry of the timer.
    fn timer_expired(&self) -> ListenerResult;
}

impl<F> TimerListener for F
where
    F: Fn() -> ListenerResult + Send + Sync,
{
    fn timer_expired(&self) -> ListenerResult {
        self()
    }
}

/// Arc identity for trait objects, ignoring vtable metadata.
pub(crate) fn same_object<T: ?Sized>(a: &std::sync::Arc<T>, b: &std::sync::Arc<T>) -> bool {
    std::ptr::addr_eq(std::sync::Arc::as_ptr(a), std::sync::Arc::as_ptr(b))
}
