//! Receive-side OSC primitives.
//!
//! oscprims reads OSC packets straight out of a received datagram, without
//! copying, and drives any number of UDP sockets and periodic timers from a
//! single receive loop.
//!
//! # Crate Structure
//!
//! - [`transport`]: non-blocking UDP sockets and the datagram socket abstraction
//! - [`packet`]: message, bundle and argument readers
//! - [`mux`]: receive loop, timers and packet dispatch (behind `mux` feature,
//!   unix-only apart from its configuration)

/// Re-export transport types.
pub mod transport {
    pub use oscprims_transport::*;
}

/// Re-export packet reader types.
pub mod packet {
    pub use oscprims_packet::*;
}

/// Re-export receive loop types (requires `mux` feature).
#[cfg(feature = "mux")]
pub mod mux {
    pub use oscprims_mux::*;
}
