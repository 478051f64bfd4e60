use std::os::fd::RawFd;

/// Error returned by a packet or timer listener.
///
/// Any error type can be returned; it ends the current [`run`] and is handed
/// back to its caller inside [`MuxError::Listener`].
///
/// [`run`]: crate::Multiplexer::run
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single listener callback.
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Errors that can occur while driving the receive loop.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    /// The poller or its wake channel could not be created.
    #[error("unable to set up receive loop: {0}")]
    Setup(std::io::Error),

    /// A socket could not be added to the poller.
    #[error("unable to watch socket (fd {fd}): {source}")]
    Register { fd: RawFd, source: std::io::Error },

    /// Waiting for readiness failed for a reason other than an interrupt.
    #[error("waiting for socket readiness failed: {0}")]
    Wait(std::io::Error),

    /// The wake channel could not be signalled.
    #[error("unable to wake receive loop: {0}")]
    Wake(std::io::Error),

    /// A listener callback returned an error.
    #[error("listener failed: {0}")]
    Listener(#[source] ListenerError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] oscprims_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, MuxError>;
