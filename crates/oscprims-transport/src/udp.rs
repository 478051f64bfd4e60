use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::{AsRawFd, RawFd};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{retry_nonblocking, DatagramSocket, STOP_DATAGRAM};

/// Options applied while a socket is created, before it is bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// Set `SO_REUSEADDR` (and `SO_REUSEPORT` on macOS) so several listeners
    /// can share one port on the same interface.
    pub allow_reuse: bool,
    /// Allow sending to broadcast addresses.
    pub broadcast: bool,
}

/// Non-blocking UDP socket.
///
/// Every socket returned by this type is already in non-blocking mode, which
/// is what the receive multiplexer requires. `receive_from` therefore reports
/// "no data" instead of waiting.
#[derive(Debug)]
pub struct UdpSocket {
    inner: std::net::UdpSocket,
    connected: Option<SocketAddr>,
}

impl UdpSocket {
    /// Bind to `addr` with default options.
    ///
    /// Port 0 asks the OS for an ephemeral port; see [`local_addr`](Self::local_addr).
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        Self::bind_with_options(addr, SocketOptions::default())
    }

    /// Bind to `addr`, applying `options` first.
    pub fn bind_with_options(addr: SocketAddr, options: SocketOptions) -> Result<Self> {
        let inner = bind_socket(addr, options)?;

        let local = inner.local_addr()?;
        info!(%local, reuse = options.allow_reuse, "bound udp socket");

        Ok(Self {
            inner,
            connected: None,
        })
    }

    /// Bind to an ephemeral port on the unspecified address of `remote`'s family
    /// and connect to `remote`.
    ///
    /// This is the usual shape of a transmit socket.
    pub fn connect_to(remote: SocketAddr) -> Result<Self> {
        let mut socket = Self::bind(unspecified_for(remote))?;
        socket.connect(remote)?;
        Ok(socket)
    }

    /// Connect to `remote` so that [`send`](Self::send) can be used.
    ///
    /// A connected socket only receives datagrams from `remote`.
    pub fn connect(&mut self, remote: SocketAddr) -> Result<()> {
        self.inner
            .connect(remote)
            .map_err(|e| TransportError::Connect {
                addr: remote,
                source: e,
            })?;
        self.connected = Some(remote);
        debug!(%remote, "connected udp socket");
        Ok(())
    }

    /// The remote address this socket is connected to, if any.
    pub fn connected_addr(&self) -> Option<SocketAddr> {
        self.connected
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// The local address the OS would use to reach `remote` from this socket.
    ///
    /// Useful when the socket is bound to the unspecified address and the
    /// caller needs a concrete address to advertise to `remote`. The route is
    /// resolved on a throwaway socket, so this socket's connection state is
    /// left untouched.
    pub fn local_endpoint_for(&self, remote: SocketAddr) -> Result<SocketAddr> {
        let probe = std::net::UdpSocket::bind(unspecified_for(remote)).map_err(|e| {
            TransportError::Bind {
                addr: unspecified_for(remote),
                source: e,
            }
        })?;
        probe.connect(remote).map_err(|e| TransportError::Connect {
            addr: remote,
            source: e,
        })?;
        let ip = probe.local_addr()?.ip();
        let port = self.local_addr()?.port();
        Ok(SocketAddr::new(ip, port))
    }

    /// Send `data` to the connected remote.
    pub fn send(&self, data: &[u8]) -> Result<usize> {
        Ok(self.inner.send(data)?)
    }

    /// Send `data` to `remote`.
    pub fn send_to(&self, data: &[u8], remote: SocketAddr) -> Result<usize> {
        Ok(self.inner.send_to(data, remote)?)
    }

    /// Send [`STOP_DATAGRAM`] to `remote`, asking the loop reading it to stop.
    pub fn send_stop_to(&self, remote: SocketAddr) -> Result<()> {
        self.send_to(STOP_DATAGRAM, remote)?;
        debug!(%remote, "sent stop datagram");
        Ok(())
    }
}

impl DatagramSocket for UdpSocket {
    fn receive_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        retry_nonblocking(|| self.inner.recv_from(buf))
    }
}

impl AsRawFd for UdpSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

fn unspecified_for(remote: SocketAddr) -> SocketAddr {
    let ip = match remote.ip() {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

/// Create a datagram socket, apply `options`, then bind it to `addr`.
///
/// std only offers bind-on-create, so the options that must precede `bind(2)`
/// go through socket2.
fn bind_socket(addr: SocketAddr, options: SocketOptions) -> Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(TransportError::Create)?;

    if options.allow_reuse {
        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::SocketOption {
                option: "SO_REUSEADDR",
                source: e,
            })?;
        #[cfg(target_os = "macos")]
        socket
            .set_reuse_port(true)
            .map_err(|e| TransportError::SocketOption {
                option: "SO_REUSEPORT",
                source: e,
            })?;
    }
    if options.broadcast {
        socket
            .set_broadcast(true)
            .map_err(|e| TransportError::SocketOption {
                option: "SO_BROADCAST",
                source: e,
            })?;
    }
    socket.set_nonblocking(true)?;

    socket
        .bind(&addr.into())
        .map_err(|e| TransportError::Bind { addr, source: e })?;

    Ok(socket.into())
}
