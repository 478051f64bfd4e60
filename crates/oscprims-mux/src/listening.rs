use std::net::SocketAddr;
use std::sync::Arc;

use oscprims_transport::{DatagramSocket, SocketOptions, UdpSocket};

use crate::config::MultiplexerConfig;
use crate::error::Result;
use crate::listener::PacketListener;
use crate::multiplexer::{BreakHandle, Multiplexer};

/// A bound UDP socket with its own receive loop and a single listener.
///
/// The common case of "receive on one port until told to stop", without
/// setting up a [`Multiplexer`] by hand.
#[derive(Debug)]
pub struct ListeningSocket {
    socket: Arc<UdpSocket>,
    mux: Multiplexer,
}

impl ListeningSocket {
    /// Bind to `addr` and deliver every datagram to `listener`.
    pub fn bind(addr: SocketAddr, listener: Arc<dyn PacketListener>) -> Result<Self> {
        Self::bind_with_config(
            addr,
            SocketOptions::default(),
            MultiplexerConfig::default(),
            listener,
        )
    }

    /// Bind with explicit socket options and loop configuration.
    pub fn bind_with_config(
        addr: SocketAddr,
        options: SocketOptions,
        config: MultiplexerConfig,
        listener: Arc<dyn PacketListener>,
    ) -> Result<Self> {
        let socket = Arc::new(UdpSocket::bind_with_options(addr, options)?);
        let mut mux = Multiplexer::with_config(config)?;
        mux.attach_socket_listener(Arc::clone(&socket) as Arc<dyn DatagramSocket>, listener);
        Ok(Self { socket, mux })
    }

    /// The address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// The underlying socket, e.g. to send replies from the same port.
    pub fn socket(&self) -> &Arc<UdpSocket> {
        &self.socket
    }

    /// Receive until a break is requested. See [`Multiplexer::run`].
    pub fn run(&mut self) -> Result<()> {
        self.mux.run()
    }

    /// Ask [`run`](Self::run) to return. See [`BreakHandle::request_break`].
    pub fn request_break(&self) {
        self.mux.request_break();
    }

    /// Ask [`run`](Self::run) to return from any thread, waking it if needed.
    pub fn asynchronous_break(&self) -> Result<()> {
        self.mux.asynchronous_break()
    }

    /// A handle that can stop this socket's loop from anywhere.
    pub fn break_handle(&self) -> BreakHandle {
        self.mux.break_handle()
    }
}
