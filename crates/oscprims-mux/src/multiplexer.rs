use std::fmt;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Registry, Token, Waker};
use oscprims_transport::{DatagramSocket, STOP_DATAGRAM};
use tracing::{debug, info, trace, warn};

use crate::config::MultiplexerConfig;
use crate::error::{MuxError, Result};
use crate::listener::{same_object, PacketListener, TimerListener};
use crate::timer::{TimerQueue, TimerRegistration};

const WAKE_TOKEN: Token = Token(usize::MAX);

struct SocketRegistration {
    socket: Arc<dyn DatagramSocket>,
    listener: Arc<dyn PacketListener>,
}

/// Stops a [`Multiplexer`] from a listener or from another thread.
///
/// Obtained from [`Multiplexer::break_handle`]. Cloning is cheap and every
/// clone controls the same multiplexer.
#[derive(Debug, Clone)]
pub struct BreakHandle {
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl BreakHandle {
    /// Ask the loop to return after the current callback.
    ///
    /// Does not wake a blocked wait, so use it from inside a listener running
    /// on the loop thread.
    pub fn request_break(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Ask the loop to return, waking it if it is waiting.
    ///
    /// Safe to call from any thread.
    pub fn asynchronous_break(&self) -> Result<()> {
        self.request_break();
        self.waker.wake().map_err(MuxError::Wake)
    }
}

/// Single-threaded receive loop over several datagram sockets and a set of
/// periodic timers.
///
/// Sockets and timers are attached before [`run`](Self::run) is called. Each
/// pass of the loop:
///
/// 1. waits until a socket is readable, the earliest timer is due, or the
///    loop is woken by [`BreakHandle::asynchronous_break`];
/// 2. reads one datagram from each ready socket, in attach order, and hands it
///    to that socket's listener;
/// 3. fires every due timer, earliest first.
///
/// Attaching and detaching take `&mut self`, as does `run`, so registrations
/// can never change while the loop is running.
pub struct Multiplexer {
    poll: Poll,
    waker: Arc<Waker>,
    stop: Arc<AtomicBool>,
    sockets: Vec<SocketRegistration>,
    timers: Vec<TimerRegistration>,
    config: MultiplexerConfig,
}

impl Multiplexer {
    /// Create a multiplexer with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(MultiplexerConfig::default())
    }

    /// Create a multiplexer with custom configuration.
    pub fn with_config(config: MultiplexerConfig) -> Result<Self> {
        let poll = Poll::new().map_err(MuxError::Setup)?;
        let waker = Waker::new(poll.registry(), WAKE_TOKEN).map_err(MuxError::Setup)?;
        Ok(Self {
            poll,
            waker: Arc::new(waker),
            stop: Arc::new(AtomicBool::new(false)),
            sockets: Vec::new(),
            timers: Vec::new(),
            config,
        })
    }

    /// The configuration this multiplexer was created with.
    pub fn config(&self) -> &MultiplexerConfig {
        &self.config
    }

    /// Deliver every datagram received on `socket` to `listener`.
    ///
    /// # Panics
    ///
    /// If this exact socket/listener pair is already attached.
    pub fn attach_socket_listener(
        &mut self,
        socket: Arc<dyn DatagramSocket>,
        listener: Arc<dyn PacketListener>,
    ) {
        assert!(
            self.find_socket_listener(&socket, &listener).is_none(),
            "socket listener is already attached"
        );
        self.sockets.push(SocketRegistration { socket, listener });
    }

    /// Remove a pair previously passed to
    /// [`attach_socket_listener`](Self::attach_socket_listener).
    ///
    /// # Panics
    ///
    /// If the pair is not attached.
    pub fn detach_socket_listener(
        &mut self,
        socket: &Arc<dyn DatagramSocket>,
        listener: &Arc<dyn PacketListener>,
    ) {
        let index = self
            .find_socket_listener(socket, listener)
            .unwrap_or_else(|| panic!("socket listener is not attached"));
        self.sockets.remove(index);
    }

    /// Call `listener` every `period`, starting one period from the start of
    /// [`run`](Self::run).
    ///
    /// # Panics
    ///
    /// If `period` is zero.
    pub fn attach_periodic_timer_listener(
        &mut self,
        period: Duration,
        listener: Arc<dyn TimerListener>,
    ) {
        self.attach_periodic_timer_listener_with_delay(period, period, listener);
    }

    /// Call `listener` every `period`, starting `initial_delay` from the start
    /// of [`run`](Self::run).
    ///
    /// # Panics
    ///
    /// If `period` is zero.
    pub fn attach_periodic_timer_listener_with_delay(
        &mut self,
        initial_delay: Duration,
        period: Duration,
        listener: Arc<dyn TimerListener>,
    ) {
        assert!(!period.is_zero(), "timer period must be non-zero");
        self.timers.push(TimerRegistration {
            initial_delay,
            period,
            listener,
        });
    }

    /// Remove the first timer registered with `listener`.
    ///
    /// # Panics
    ///
    /// If no timer uses `listener`.
    pub fn detach_periodic_timer_listener(&mut self, listener: &Arc<dyn TimerListener>) {
        let index = self
            .timers
            .iter()
            .position(|timer| same_object(&timer.listener, listener))
            .unwrap_or_else(|| panic!("timer listener is not attached"));
        self.timers.remove(index);
    }

    /// Number of attached socket/listener pairs.
    pub fn socket_listener_count(&self) -> usize {
        self.sockets.len()
    }

    /// Number of attached periodic timers.
    pub fn timer_listener_count(&self) -> usize {
        self.timers.len()
    }

    /// A handle that can stop this multiplexer from anywhere.
    pub fn break_handle(&self) -> BreakHandle {
        BreakHandle {
            stop: Arc::clone(&self.stop),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Ask [`run`](Self::run) to return. See [`BreakHandle::request_break`].
    pub fn request_break(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Ask [`run`](Self::run) to return, waking it if it is waiting.
    /// See [`BreakHandle::asynchronous_break`].
    pub fn asynchronous_break(&self) -> Result<()> {
        self.break_handle().asynchronous_break()
    }

    /// Run the receive loop until a break is requested, a stop datagram
    /// arrives, or a listener fails.
    ///
    /// A break requested before `run` is called is discarded. Sockets are
    /// watched only while `run` executes, so the multiplexer can be run again
    /// after it returns.
    pub fn run(&mut self) -> Result<()> {
        self.stop.store(false, Ordering::Release);

        let registered = register_sockets(self.poll.registry(), &self.sockets)?;
        info!(
            sockets = self.sockets.len(),
            timers = self.timers.len(),
            "receive loop started"
        );

        let outcome = self.run_loop();

        deregister_sockets(self.poll.registry(), &registered);
        match &outcome {
            Ok(()) => info!("receive loop stopped"),
            Err(err) => warn!(error = %err, "receive loop failed"),
        }
        outcome
    }

    fn run_loop(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(self.config.events_capacity.max(1));
        let mut buffer = vec![0u8; self.config.max_datagram_size];
        // Readiness is edge-triggered: a socket stays ready until a read finds
        // no data. Start with every socket ready to drain anything queued
        // before the run began.
        let mut ready = vec![true; self.sockets.len()];
        let mut timers = TimerQueue::new(&self.timers, Instant::now());

        while !self.stop.load(Ordering::Acquire) {
            let timeout = if ready.contains(&true) {
                Some(Duration::ZERO)
            } else {
                timers.next_timeout(Instant::now())
            };

            if let Err(err) = self.poll.poll(&mut events, timeout) {
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(MuxError::Wait(err));
            }

            if self.stop.load(Ordering::Acquire) {
                break;
            }

            for event in events.iter() {
                if event.token() == WAKE_TOKEN {
                    trace!("receive loop woken");
                    continue;
                }
                self.mark_ready(event.token(), &mut ready);
            }

            self.service_sockets(&mut ready, &mut buffer)?;

            if timers.len() > 0 {
                timers.fire_expired(Instant::now(), &self.stop)?;
            }
        }

        Ok(())
    }

    /// Several registrations may share one socket; all of them become ready.
    fn mark_ready(&self, token: Token, ready: &mut [bool]) {
        let Some(fd) = self.sockets.get(token.0).map(|r| r.socket.as_raw_fd()) else {
            return;
        };
        for (index, registration) in self.sockets.iter().enumerate() {
            if registration.socket.as_raw_fd() == fd {
                ready[index] = true;
            }
        }
    }

    fn service_sockets(&self, ready: &mut [bool], buffer: &mut [u8]) -> Result<()> {
        for (index, registration) in self.sockets.iter().enumerate() {
            if !ready[index] {
                continue;
            }

            let (size, remote) = match registration.socket.receive_from(buffer) {
                Ok(Some(received)) => received,
                Ok(None) => {
                    ready[index] = false;
                    continue;
                }
                Err(err) => {
                    warn!(socket = index, error = %err, "receive failed");
                    ready[index] = false;
                    continue;
                }
            };

            let data = &buffer[..size];
            if self.config.honor_stop_datagram && data == STOP_DATAGRAM {
                debug!(%remote, "stop datagram received");
                self.stop.store(true, Ordering::Release);
                break;
            }

            if size > 0 {
                trace!(socket = index, %remote, size, "datagram received");
                registration
                    .listener
                    .process_packet(data, remote)
                    .map_err(MuxError::Listener)?;
                if self.stop.load(Ordering::Acquire) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn find_socket_listener(
        &self,
        socket: &Arc<dyn DatagramSocket>,
        listener: &Arc<dyn PacketListener>,
    ) -> Option<usize> {
        self.sockets.iter().position(|registration| {
            same_object(&registration.socket, socket)
                && same_object(&registration.listener, listener)
        })
    }
}

impl fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiplexer")
            .field("sockets", &self.sockets.len())
            .field("timers", &self.timers.len())
            .field("stop", &self.stop.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish()
    }
}

/// Watch each distinct socket once, keyed by the index of its first
/// registration. On failure, anything already watched is released again.
fn register_sockets(registry: &Registry, sockets: &[SocketRegistration]) -> Result<Vec<RawFd>> {
    let mut registered: Vec<RawFd> = Vec::with_capacity(sockets.len());
    for (index, registration) in sockets.iter().enumerate() {
        let fd = registration.socket.as_raw_fd();
        if registered.contains(&fd) {
            continue;
        }
        if let Err(source) = registry.register(&mut SourceFd(&fd), Token(index), Interest::READABLE)
        {
            deregister_sockets(registry, &registered);
            return Err(MuxError::Register { fd, source });
        }
        debug!(fd, socket = index, "watching socket");
        registered.push(fd);
    }
    Ok(registered)
}

fn deregister_sockets(registry: &Registry, registered: &[RawFd]) {
    for fd in registered {
        if let Err(err) = registry.deregister(&mut SourceFd(fd)) {
            warn!(fd, error = %err, "unable to stop watching socket");
        }
    }
}
