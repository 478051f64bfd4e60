//! Datagram transport for the oscprims receive loop.
//!
//! Provides the [`DatagramSocket`] abstraction consumed by the multiplexer and
//! one implementation of it, a non-blocking [`UdpSocket`]. These are thin
//! wrappers over the OS primitives; everything protocol-aware lives in the
//! crates built on top of this one.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::STOP_DATAGRAM;

#[cfg(unix)]
pub use traits::DatagramSocket;

#[cfg(unix)]
pub use udp::{SocketOptions, UdpSocket};
