//! Zero-copy reading of received OSC packets.
//!
//! A datagram is either a message or a bundle:
//! - A message is a padded address pattern, a padded `,`-prefixed type-tag
//!   string, and one big-endian payload per tag
//! - A bundle is `#bundle\0`, a 64-bit time tag, and size-prefixed elements,
//!   each of which is again a message or a bundle
//!
//! Every reader borrows from the caller's buffer and validates the whole
//! structure when it is constructed. Once a [`Message`] or [`Bundle`] exists,
//! walking it never touches bytes outside the packet.

pub mod argument;
pub mod bundle;
pub mod element;
pub mod error;
mod layout;
pub mod message;
pub mod stream;
pub mod types;

#[cfg(test)]
mod testutil;

pub use argument::{Argument, Arguments};
pub use bundle::{Bundle, BundleElements, BUNDLE_HEADER_SIZE, BUNDLE_MARKER};
pub use element::{Element, Packet};
pub use error::{PacketError, Result};
pub use message::Message;
pub use stream::{ArgumentStream, FromArgument};
pub use types::{Blob, MidiMessage, RgbaColor, Symbol, TimeTag, TypeTag};
