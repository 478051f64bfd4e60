use std::iter::FusedIterator;

use crate::error::{PacketError, Result};
use crate::layout::{c_str, payload_size, read_u32, read_u64};
use crate::types::{Blob, MidiMessage, RgbaColor, Symbol, TimeTag, TypeTag};

const TRUNCATED: PacketError = PacketError::MalformedMessage("argument exceeds message size");

/// One argument of a received message.
///
/// Holds the type tag and a view of the message from this argument's payload
/// to the end of the message. Nothing is decoded until an accessor is called.
///
/// Checked accessors (`as_*`) verify the tag first and fail with
/// [`PacketError::WrongArgumentType`] on a mismatch. Unchecked accessors
/// (`as_*_unchecked`) decode the payload bytes whatever the tag says; they
/// are meant for callers that have already matched on [`type_tag`](Self::type_tag).
/// Both forms bounds-check against the message and report a truncated payload
/// as [`PacketError::MalformedMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argument<'a> {
    tag: TypeTag,
    data: &'a [u8],
}

impl<'a> Argument<'a> {
    pub(crate) fn new(tag: TypeTag, data: &'a [u8]) -> Self {
        Self { tag, data }
    }

    /// The type tag of this argument.
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    fn require(&self, tag: TypeTag) -> Result<()> {
        if self.tag == tag {
            Ok(())
        } else {
            Err(self.wrong_type(tag.name()))
        }
    }

    pub(crate) fn wrong_type(&self, expected: &'static str) -> PacketError {
        PacketError::WrongArgumentType {
            expected,
            found: self.tag.as_char(),
        }
    }

    /// True when the type tag is `T` or `F`.
    pub fn is_bool(&self) -> bool {
        matches!(self.tag, TypeTag::True | TypeTag::False)
    }

    /// Read a boolean. Fails with `WrongArgumentType` for any other tag.
    pub fn as_bool(&self) -> Result<bool> {
        match self.tag {
            TypeTag::True => Ok(true),
            TypeTag::False => Ok(false),
            _ => Err(self.wrong_type("bool")),
        }
    }

    /// `true` only for `T`; every other tag reads as `false`.
    pub fn as_bool_unchecked(&self) -> bool {
        self.tag == TypeTag::True
    }

    /// True when the type tag is `N`.
    pub fn is_nil(&self) -> bool {
        self.tag == TypeTag::Nil
    }

    /// True when the type tag is `I`.
    pub fn is_infinitum(&self) -> bool {
        self.tag == TypeTag::Infinitum
    }

    /// True when the type tag is `i`.
    pub fn is_int32(&self) -> bool {
        self.tag == TypeTag::Int32
    }

    /// Read a 32-bit integer. Fails with `WrongArgumentType` for any other tag.
    pub fn as_int32(&self) -> Result<i32> {
        self.require(TypeTag::Int32)?;
        self.as_int32_unchecked()
    }

    /// Read the payload as a 32-bit integer whatever the tag. Still bounds-checked.
    pub fn as_int32_unchecked(&self) -> Result<i32> {
        Ok(read_u32(self.data, TRUNCATED)? as i32)
    }

    /// True when the type tag is `f`.
    pub fn is_float(&self) -> bool {
        self.tag == TypeTag::Float
    }

    /// Read a 32-bit float. Fails with `WrongArgumentType` for any other tag.
    pub fn as_float(&self) -> Result<f32> {
        self.require(TypeTag::Float)?;
        self.as_float_unchecked()
    }

    /// Read the payload as a 32-bit float whatever the tag. Still bounds-checked.
    pub fn as_float_unchecked(&self) -> Result<f32> {
        Ok(f32::from_bits(read_u32(self.data, TRUNCATED)?))
    }

    /// True when the type tag is `c`.
    pub fn is_char(&self) -> bool {
        self.tag == TypeTag::Char
    }

    /// Read a character. Fails with `WrongArgumentType` for any other tag.
    pub fn as_char(&self) -> Result<char> {
        self.require(TypeTag::Char)?;
        self.as_char_unchecked()
    }

    /// The low byte of the 32-bit payload, as an ASCII character.
    pub fn as_char_unchecked(&self) -> Result<char> {
        Ok(char::from(read_u32(self.data, TRUNCATED)? as u8))
    }

    /// True when the type tag is `r`.
    pub fn is_rgba_color(&self) -> bool {
        self.tag == TypeTag::RgbaColor
    }

    /// Read an RGBA color. Fails with `WrongArgumentType` for any other tag.
    pub fn as_rgba_color(&self) -> Result<RgbaColor> {
        self.require(TypeTag::RgbaColor)?;
        self.as_rgba_color_unchecked()
    }

    /// Read the payload as an RGBA color whatever the tag. Still bounds-checked.
    pub fn as_rgba_color_unchecked(&self) -> Result<RgbaColor> {
        Ok(RgbaColor(read_u32(self.data, TRUNCATED)?))
    }

    /// True when the type tag is `m`.
    pub fn is_midi_message(&self) -> bool {
        self.tag == TypeTag::MidiMessage
    }

    /// Read a MIDI message. Fails with `WrongArgumentType` for any other tag.
    pub fn as_midi_message(&self) -> Result<MidiMessage> {
        self.require(TypeTag::MidiMessage)?;
        self.as_midi_message_unchecked()
    }

    /// Read the payload as a MIDI message whatever the tag. Still bounds-checked.
    pub fn as_midi_message_unchecked(&self) -> Result<MidiMessage> {
        Ok(MidiMessage(read_u32(self.data, TRUNCATED)?))
    }

    /// True when the type tag is `h`.
    pub fn is_int64(&self) -> bool {
        self.tag == TypeTag::Int64
    }

    /// Read a 64-bit integer. Fails with `WrongArgumentType` for any other tag.
    pub fn as_int64(&self) -> Result<i64> {
        self.require(TypeTag::Int64)?;
        self.as_int64_unchecked()
    }

    /// Read the payload as a 64-bit integer whatever the tag. Still bounds-checked.
    pub fn as_int64_unchecked(&self) -> Result<i64> {
        Ok(read_u64(self.data, TRUNCATED)? as i64)
    }

    /// True when the type tag is `t`.
    pub fn is_time_tag(&self) -> bool {
        self.tag == TypeTag::TimeTag
    }

    /// Read a time tag. Fails with `WrongArgumentType` for any other tag.
    pub fn as_time_tag(&self) -> Result<TimeTag> {
        self.require(TypeTag::TimeTag)?;
        self.as_time_tag_unchecked()
    }

    /// Read the payload as a time tag whatever the tag. Still bounds-checked.
    pub fn as_time_tag_unchecked(&self) -> Result<TimeTag> {
        Ok(TimeTag(read_u64(self.data, TRUNCATED)?))
    }

    /// True when the type tag is `d`.
    pub fn is_double(&self) -> bool {
        self.tag == TypeTag::Double
    }

    /// Read a 64-bit float. Fails with `WrongArgumentType` for any other tag.
    pub fn as_double(&self) -> Result<f64> {
        self.require(TypeTag::Double)?;
        self.as_double_unchecked()
    }

    /// Read the payload as a 64-bit float whatever the tag. Still bounds-checked.
    pub fn as_double_unchecked(&self) -> Result<f64> {
        Ok(f64::from_bits(read_u64(self.data, TRUNCATED)?))
    }

    /// True when the type tag is `s`.
    pub fn is_string(&self) -> bool {
        self.tag == TypeTag::String
    }

    /// The string payload, borrowed from the packet.
    pub fn as_str(&self) -> Result<&'a str> {
        self.require(TypeTag::String)?;
        self.as_str_unchecked()
    }

    /// Read the payload as a string whatever the tag. Still bounds-checked.
    pub fn as_str_unchecked(&self) -> Result<&'a str> {
        let bytes = c_str(self.data).ok_or(PacketError::MalformedMessage(
            "unterminated string argument",
        ))?;
        std::str::from_utf8(bytes)
            .map_err(|_| PacketError::MalformedMessage("string argument is not valid UTF-8"))
    }

    /// True when the type tag is `S`.
    pub fn is_symbol(&self) -> bool {
        self.tag == TypeTag::Symbol
    }

    /// Read a symbol. Fails with `WrongArgumentType` for any other tag.
    pub fn as_symbol(&self) -> Result<Symbol<'a>> {
        self.require(TypeTag::Symbol)?;
        self.as_symbol_unchecked()
    }

    /// Read the payload as a symbol whatever the tag. Still bounds-checked.
    pub fn as_symbol_unchecked(&self) -> Result<Symbol<'a>> {
        self.as_str_unchecked().map(Symbol)
    }

    /// True when the type tag is `b`.
    pub fn is_blob(&self) -> bool {
        self.tag == TypeTag::Blob
    }

    /// The blob payload without its size prefix or padding.
    pub fn as_blob(&self) -> Result<Blob<'a>> {
        self.require(TypeTag::Blob)?;
        self.as_blob_unchecked()
    }

    /// Read the payload as a blob whatever the tag. Still bounds-checked.
    pub fn as_blob_unchecked(&self) -> Result<Blob<'a>> {
        let len = read_u32(self.data, TRUNCATED)? as usize;
        let end = len.checked_add(4).ok_or(TRUNCATED)?;
        self.data.get(4..end).map(Blob).ok_or(TRUNCATED)
    }

    /// True when the type tag is `[`.
    pub fn is_array_begin(&self) -> bool {
        self.tag == TypeTag::ArrayBegin
    }

    /// True when the type tag is `]`.
    pub fn is_array_end(&self) -> bool {
        self.tag == TypeTag::ArrayEnd
    }
}

/// Iterator over the arguments of a message, in type-tag order.
///
/// The argument region was validated when the message was read, so iteration
/// cannot fail; cloning the iterator restarts from the same position.
#[derive(Debug, Clone)]
pub struct Arguments<'a> {
    tags: &'a [u8],
    data: &'a [u8],
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(tags: &'a [u8], data: &'a [u8]) -> Self {
        Self { tags, data }
    }
}

impl<'a> Iterator for Arguments<'a> {
    type Item = Argument<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&byte, rest) = self.tags.split_first()?;
        let tag = TypeTag::from_byte(byte)?;
        let argument = Argument::new(tag, self.data);

        let size = payload_size(tag, self.data).unwrap_or(self.data.len());
        self.data = self.data.get(size..).unwrap_or_default();
        self.tags = rest;
        Some(argument)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tags.len(), Some(self.tags.len()))
    }
}

impl ExactSizeIterator for Arguments<'_> {}

impl FusedIterator for Arguments<'_> {}
