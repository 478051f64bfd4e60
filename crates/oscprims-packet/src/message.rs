use crate::argument::Arguments;
use crate::element::Element;
use crate::error::{PacketError, Result};
use crate::layout::{is_aligned, padded_string_end, payload_size};
use crate::stream::ArgumentStream;
use crate::types::TypeTag;

/// A received message: address pattern, type tags and argument payloads.
///
/// The whole structure is validated on construction: both strings must be
/// terminated inside the message, every tag must be known, and every argument
/// payload must fit. Accessors afterwards only borrow from the original
/// buffer.
///
/// ```text
/// ┌──────────────────────┬──────────────────────┬─────────────────────┐
/// │ address pattern      │ type tags            │ arguments           │
/// │ "/foo\0" pad to 4    │ ",if\0" pad to 4     │ payloads, tag order │
/// └──────────────────────┴──────────────────────┴─────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    address: &'a str,
    address_region: &'a [u8],
    type_tags: &'a str,
    arguments: &'a [u8],
}

impl<'a> Message<'a> {
    /// Read a message from `data`.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(PacketError::MalformedMessage(
                "zero length messages not permitted",
            ));
        }
        if !is_aligned(data.len()) {
            return Err(PacketError::MalformedMessage(
                "message size must be multiple of four",
            ));
        }

        let tags_start = padded_string_end(data, 0).ok_or(PacketError::MalformedMessage(
            "unterminated address pattern",
        ))?;
        let address_region = &data[..tags_start];
        let address_len = address_region
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(address_region.len());
        let address = std::str::from_utf8(&address_region[..address_len])
            .map_err(|_| PacketError::MalformedMessage("address pattern is not valid UTF-8"))?;

        // A message may end right after its address pattern: no type tags, no arguments.
        if tags_start == data.len() {
            return Ok(Self {
                address,
                address_region,
                type_tags: "",
                arguments: &[],
            });
        }

        if data[tags_start] != b',' {
            return Err(PacketError::MalformedMessage("type tags not present"));
        }
        let arguments_start = padded_string_end(data, tags_start).ok_or(
            PacketError::MalformedMessage("type tags were not terminated"),
        )?;
        let tags_region = &data[tags_start..arguments_start];
        let tags_len = tags_region
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(tags_region.len());
        let tags = &tags_region[..tags_len];

        let arguments = &data[arguments_start..];
        validate_arguments(&tags[1..], arguments)?;

        // Every byte after the leading ',' is a known ASCII tag, so this cannot fail.
        let type_tags = std::str::from_utf8(tags)
            .map_err(|_| PacketError::MalformedMessage("unknown type tag"))?;

        Ok(Self {
            address,
            address_region,
            type_tags,
            arguments,
        })
    }

    /// The address pattern, without its terminator.
    pub fn address_pattern(&self) -> &'a str {
        self.address
    }

    /// The padded address pattern region as it appears on the wire.
    pub fn address_pattern_bytes(&self) -> &'a [u8] {
        self.address_region
    }

    /// Whether the address is a numeric address rather than a path.
    ///
    /// See [`address_pattern_as_u32`](Self::address_pattern_as_u32).
    pub fn address_pattern_is_u32(&self) -> bool {
        self.address_pattern_as_u32().is_some()
    }

    /// Decode a numeric address, as sent by peers that address commands by
    /// number instead of by path.
    ///
    /// Two encodings are recognised: exactly four ASCII digits (`"1234"`,
    /// decoded as decimal), and a 4-byte region whose first byte is NUL
    /// (decoded as a big-endian `u32`).
    pub fn address_pattern_as_u32(&self) -> Option<u32> {
        if self.address.len() == 4 && self.address.bytes().all(|b| b.is_ascii_digit()) {
            return self.address.parse().ok();
        }
        match self.address_region {
            [0, b1, b2, b3] => Some(u32::from_be_bytes([0, *b1, *b2, *b3])),
            _ => None,
        }
    }

    /// The type-tag string including its leading `,` (e.g. `",if"`).
    ///
    /// Empty when the message carries no type-tag string at all.
    pub fn type_tags(&self) -> &'a str {
        self.type_tags
    }

    /// The type tags without the leading `,`, one character per argument.
    pub fn argument_tags(&self) -> &'a str {
        self.type_tags.strip_prefix(',').unwrap_or("")
    }

    /// Number of arguments, equal to the number of argument type tags.
    pub fn argument_count(&self) -> usize {
        self.argument_tags().len()
    }

    /// Iterate over the arguments in order.
    pub fn arguments(&self) -> Arguments<'a> {
        Arguments::new(self.argument_tags().as_bytes(), self.arguments)
    }

    /// A positional, type-checked extraction stream over the arguments.
    pub fn argument_stream(&self) -> ArgumentStream<'a> {
        ArgumentStream::new(self.arguments())
    }
}

impl<'a> TryFrom<Element<'a>> for Message<'a> {
    type Error = PacketError;

    fn try_from(element: Element<'a>) -> Result<Self> {
        Self::new(element.contents())
    }
}

fn validate_arguments(tags: &[u8], mut data: &[u8]) -> Result<()> {
    for &byte in tags {
        let tag =
            TypeTag::from_byte(byte).ok_or(PacketError::MalformedMessage("unknown type tag"))?;
        let size = payload_size(tag, data)?;
        data = &data[size..];
    }
    Ok(())
}
