//! Type tags and the small value types that argument accessors return.

/// Argument type tag, one per character of a message's type-tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `T`, boolean true, no payload.
    True,
    /// `F`, boolean false, no payload.
    False,
    /// `N`, nil, no payload.
    Nil,
    /// `I`, infinitum (impulse), no payload.
    Infinitum,
    /// `i`, 32-bit big-endian two's complement integer.
    Int32,
    /// `f`, 32-bit big-endian IEEE 754 float.
    Float,
    /// `c`, ASCII character sent as 32 bits.
    Char,
    /// `r`, 32-bit RGBA color.
    RgbaColor,
    /// `m`, 4-byte MIDI message (port, status, data1, data2).
    MidiMessage,
    /// `h`, 64-bit big-endian integer.
    Int64,
    /// `t`, 64-bit NTP time tag.
    TimeTag,
    /// `d`, 64-bit big-endian IEEE 754 double.
    Double,
    /// `s`, NUL-terminated string padded to 4 bytes.
    String,
    /// `S`, symbol; same encoding as `s`.
    Symbol,
    /// `b`, 32-bit size followed by that many bytes, padded to 4 bytes.
    Blob,
    /// `[`, start of an array, no payload.
    ArrayBegin,
    /// `]`, end of an array, no payload.
    ArrayEnd,
}

impl TypeTag {
    /// Decode a type-tag character.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let tag = match byte {
            b'T' => Self::True,
            b'F' => Self::False,
            b'N' => Self::Nil,
            b'I' => Self::Infinitum,
            b'i' => Self::Int32,
            b'f' => Self::Float,
            b'c' => Self::Char,
            b'r' => Self::RgbaColor,
            b'm' => Self::MidiMessage,
            b'h' => Self::Int64,
            b't' => Self::TimeTag,
            b'd' => Self::Double,
            b's' => Self::String,
            b'S' => Self::Symbol,
            b'b' => Self::Blob,
            b'[' => Self::ArrayBegin,
            b']' => Self::ArrayEnd,
            _ => return None,
        };
        Some(tag)
    }

    /// The wire character for this tag.
    pub fn as_char(self) -> char {
        match self {
            Self::True => 'T',
            Self::False => 'F',
            Self::Nil => 'N',
            Self::Infinitum => 'I',
            Self::Int32 => 'i',
            Self::Float => 'f',
            Self::Char => 'c',
            Self::RgbaColor => 'r',
            Self::MidiMessage => 'm',
            Self::Int64 => 'h',
            Self::TimeTag => 't',
            Self::Double => 'd',
            Self::String => 's',
            Self::Symbol => 'S',
            Self::Blob => 'b',
            Self::ArrayBegin => '[',
            Self::ArrayEnd => ']',
        }
    }

    /// Human-readable name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::True | Self::False => "bool",
            Self::Nil => "nil",
            Self::Infinitum => "infinitum",
            Self::Int32 => "int32",
            Self::Float => "float",
            Self::Char => "char",
            Self::RgbaColor => "rgba color",
            Self::MidiMessage => "midi message",
            Self::Int64 => "int64",
            Self::TimeTag => "time tag",
            Self::Double => "double",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Blob => "blob",
            Self::ArrayBegin => "array begin",
            Self::ArrayEnd => "array end",
        }
    }

    /// Payload size for fixed-width tags; `None` for strings, symbols and blobs.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::True
            | Self::False
            | Self::Nil
            | Self::Infinitum
            | Self::ArrayBegin
            | Self::ArrayEnd => Some(0),
            Self::Int32 | Self::Float | Self::Char | Self::RgbaColor | Self::MidiMessage => Some(4),
            Self::Int64 | Self::TimeTag | Self::Double => Some(8),
            Self::String | Self::Symbol | Self::Blob => None,
        }
    }
}

/// 64-bit NTP-style time tag: 32 bits of seconds since 1900, 32 bits of fraction.
///
/// The value is kept opaque; scheduling against it is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeTag(pub u64);

impl TimeTag {
    /// The special value meaning "execute immediately".
    pub const IMMEDIATE: TimeTag = TimeTag(1);

    /// Whole seconds since the NTP epoch.
    pub fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Fractional part, in units of 2^-32 seconds.
    pub fn fraction(self) -> u32 {
        self.0 as u32
    }

    /// True for the reserved value 1, "execute immediately".
    pub fn is_immediate(self) -> bool {
        self == Self::IMMEDIATE
    }
}

/// 32-bit RGBA color, red in the most significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RgbaColor(pub u32);

impl RgbaColor {
    /// Red channel.
    pub fn red(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Green channel.
    pub fn green(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Blue channel.
    pub fn blue(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Alpha channel.
    pub fn alpha(self) -> u8 {
        self.0 as u8
    }
}

/// 4-byte MIDI message: port id, status byte, two data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MidiMessage(pub u32);

impl MidiMessage {
    /// Port id, the most significant byte.
    pub fn port(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Status byte.
    pub fn status(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// First data byte.
    pub fn data1(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Second data byte.
    pub fn data2(self) -> u8 {
        self.0 as u8
    }
}

/// A symbol argument, borrowed from the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol<'a>(pub &'a str);

impl<'a> Symbol<'a> {
    /// The symbol text.
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

/// A blob argument, borrowed from the packet (padding excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blob<'a>(pub &'a [u8]);

impl<'a> Blob<'a> {
    /// The blob contents.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Length of the blob contents in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length blob.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_round_trips_through_its_character() {
        for byte in b"TFNIifcrmhtdsSb[]" {
            let tag = TypeTag::from_byte(*byte).unwrap();
            assert_eq!(tag.as_char(), *byte as char);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(TypeTag::from_byte(b'x').is_none());
        assert!(TypeTag::from_byte(b',').is_none());
        assert!(TypeTag::from_byte(0).is_none());
    }

    #[test]
    fn fixed_sizes_follow_the_wire_format() {
        assert_eq!(TypeTag::Int32.fixed_size(), Some(4));
        assert_eq!(TypeTag::MidiMessage.fixed_size(), Some(4));
        assert_eq!(TypeTag::Double.fixed_size(), Some(8));
        assert_eq!(TypeTag::TimeTag.fixed_size(), Some(8));
        assert_eq!(TypeTag::True.fixed_size(), Some(0));
        assert_eq!(TypeTag::Infinitum.fixed_size(), Some(0));
        assert_eq!(TypeTag::String.fixed_size(), None);
        assert_eq!(TypeTag::Blob.fixed_size(), None);
    }

    #[test]
    fn time_tag_parts() {
        let tag = TimeTag(0x0000_0002_8000_0000);
        assert_eq!(tag.seconds(), 2);
        assert_eq!(tag.fraction(), 0x8000_0000);
        assert!(!tag.is_immediate());
        assert!(TimeTag::IMMEDIATE.is_immediate());
    }

    #[test]
    fn color_and_midi_byte_order() {
        let color = RgbaColor(0x1122_3344);
        assert_eq!(
            (color.red(), color.green(), color.blue(), color.alpha()),
            (0x11, 0x22, 0x33, 0x44)
        );

        let midi = MidiMessage(0x0190_3C7F);
        assert_eq!(
            (midi.port(), midi.status(), midi.data1(), midi.data2()),
            (0x01, 0x90, 0x3C, 0x7F)
        );
    }
}
