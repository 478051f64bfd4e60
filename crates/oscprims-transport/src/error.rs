use std::net::SocketAddr;

/// Errors that can occur while setting up or using a datagram socket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The operating system refused to create the socket.
    #[error("unable to create udp socket: {0}")]
    Create(std::io::Error),

    /// Failed to bind to the specified address.
    #[error("unable to bind udp socket to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("unable to connect udp socket to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// A socket option could not be applied.
    #[error("unable to set socket option {option}: {source}")]
    SocketOption {
        option: &'static str,
        source: std::io::Error,
    },

    /// An I/O error occurred on the socket.
    #[error("udp socket I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
