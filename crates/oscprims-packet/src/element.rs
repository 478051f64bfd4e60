use crate::bundle::{Bundle, BUNDLE_MARKER};
use crate::error::Result;
use crate::message::Message;

/// A region that holds either a message or a bundle.
///
/// Used both for a whole received datagram and for each element of a bundle.
/// Only the bundle marker is inspected here; structural problems surface when
/// the region is read as a [`Message`] or [`Bundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    contents: &'a [u8],
}

/// An element classified and read as its concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    Message(Message<'a>),
    Bundle(Bundle<'a>),
}

impl<'a> Element<'a> {
    /// Wrap `contents` without inspecting it.
    pub fn new(contents: &'a [u8]) -> Self {
        Self { contents }
    }

    /// True when the region starts with `#bundle\0`.
    pub fn is_bundle(&self) -> bool {
        self.contents.starts_with(BUNDLE_MARKER)
    }

    /// True for anything that is not a bundle.
    pub fn is_message(&self) -> bool {
        !self.is_bundle()
    }

    /// The raw bytes of the element.
    pub fn contents(&self) -> &'a [u8] {
        self.contents
    }

    /// Length of the element in bytes.
    pub fn size(&self) -> usize {
        self.contents.len()
    }

    /// Read the region as a bundle or a message, depending on its marker.
    pub fn parse(&self) -> Result<Packet<'a>> {
        if self.is_bundle() {
            Bundle::new(self.contents).map(Packet::Bundle)
        } else {
            Message::new(self.contents).map(Packet::Message)
        }
    }
}

impl<'a> From<&'a [u8]> for Element<'a> {
    fn from(contents: &'a [u8]) -> Self {
        Self::new(contents)
    }
}
