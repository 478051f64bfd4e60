use std::iter::FusedIterator;

use bytes::Buf;

use crate::element::Element;
use crate::error::{PacketError, Result};
use crate::layout::is_aligned;
use crate::types::TimeTag;

/// Marker that opens every bundle.
pub const BUNDLE_MARKER: &[u8; 8] = b"#bundle\0";

/// Marker plus time tag.
pub const BUNDLE_HEADER_SIZE: usize = 16;

/// A received bundle: a time tag followed by size-prefixed elements.
///
/// ```text
/// ┌────────────┬──────────────┬───────────┬──────────────┬─────┐
/// │ "#bundle\0"│ time tag (8) │ size (4B) │ element      │ ... │
/// └────────────┴──────────────┴───────────┴──────────────┴─────┘
/// ```
///
/// Element sizes are checked on construction, so walking the elements later
/// cannot fail. Nested elements still have to be read as a [`Message`] or
/// [`Bundle`] of their own.
///
/// [`Message`]: crate::Message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bundle<'a> {
    time_tag: TimeTag,
    elements: &'a [u8],
    element_count: usize,
}

impl<'a> Bundle<'a> {
    /// Read a bundle from `data`.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if !data.starts_with(BUNDLE_MARKER) {
            return Err(PacketError::MalformedBundle("bad bundle address pattern"));
        }
        if data.len() < BUNDLE_HEADER_SIZE {
            return Err(PacketError::MalformedBundle("packet too short for bundle"));
        }
        if !is_aligned(data.len()) {
            return Err(PacketError::MalformedBundle(
                "bundle size must be multiple of four",
            ));
        }

        let time_tag = TimeTag((&data[BUNDLE_MARKER.len()..BUNDLE_HEADER_SIZE]).get_u64());
        let elements = &data[BUNDLE_HEADER_SIZE..];
        let element_count = count_elements(elements)?;

        Ok(Self {
            time_tag,
            elements,
            element_count,
        })
    }

    /// When the bundle's contents should take effect.
    pub fn time_tag(&self) -> TimeTag {
        self.time_tag
    }

    /// Number of elements, counted while the bundle was validated.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Iterate over the nested elements in order.
    pub fn elements(&self) -> BundleElements<'a> {
        BundleElements {
            remaining: self.elements,
            count: self.element_count,
        }
    }
}

impl<'a> TryFrom<Element<'a>> for Bundle<'a> {
    type Error = PacketError;

    fn try_from(element: Element<'a>) -> Result<Self> {
        Self::new(element.contents())
    }
}

fn count_elements(mut data: &[u8]) -> Result<usize> {
    let mut count = 0;
    while !data.is_empty() {
        if data.len() < 4 {
            return Err(PacketError::MalformedBundle(
                "packet too short for elementSize",
            ));
        }
        let size = (&data[..4]).get_u32() as usize;
        if !is_aligned(size) {
            return Err(PacketError::MalformedBundle(
                "bundle element size must be multiple of four",
            ));
        }
        data = data
            .get(4..)
            .and_then(|rest| rest.get(size..))
            .ok_or(PacketError::MalformedBundle(
                "packet too short for bundle element",
            ))?;
        count += 1;
    }
    Ok(count)
}

/// Forward-only iterator over the elements of a [`Bundle`].
#[derive(Debug, Clone)]
pub struct BundleElements<'a> {
    remaining: &'a [u8],
    count: usize,
}

impl<'a> Iterator for BundleElements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (mut prefix, rest) = self.remaining.split_at_checked(4)?;
        let size = prefix.get_u32() as usize;
        let contents = rest.get(..size)?;
        self.remaining = &rest[size..];
        self.count -= 1;
        Some(Element::new(contents))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl ExactSizeIterator for BundleElements<'_> {}

impl FusedIterator for BundleElements<'_> {}
