//! Receive loop for OSC over UDP.
//!
//! A [`Multiplexer`] waits on any number of datagram sockets at once and hands
//! each received datagram to the [`PacketListener`] attached to its socket. It
//! also runs periodic [`TimerListener`]s, and can be stopped from a listener,
//! from another thread through a [`BreakHandle`], or by a stop datagram.
//!
//! [`PacketDispatcher`] turns a [`MessageHandler`] into a packet listener that
//! walks bundles and delivers individual messages. [`ListeningSocket`] bundles
//! one socket, one listener and its own loop.
//!
//! Sockets are watched through their raw descriptors, so everything except
//! [`MultiplexerConfig`] is only available on unix.

pub mod config;
#[cfg(unix)]
pub mod dispatch;
#[cfg(unix)]
pub mod error;
#[cfg(unix)]
pub mod listener;
#[cfg(unix)]
pub mod listening;
#[cfg(unix)]
pub mod multiplexer;
#[cfg(unix)]
mod timer;

pub use config::{MultiplexerConfig, DEFAULT_EVENTS_CAPACITY, DEFAULT_MAX_DATAGRAM_SIZE};

#[cfg(unix)]
pub use dispatch::{MessageHandler, PacketDispatcher};
#[cfg(unix)]
pub use error::{ListenerError, ListenerResult, MuxError, Result};
#[cfg(unix)]
pub use listener::{PacketListener, TimerListener};
#[cfg(unix)]
pub use listening::ListeningSocket;
#[cfg(unix)]
pub use multiplexer::{BreakHandle, Multiplexer};
