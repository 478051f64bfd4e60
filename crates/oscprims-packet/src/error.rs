/// Errors raised while reading a received packet.
///
/// Structural errors carry a short static description of what was wrong, so
/// they can be produced on the hot path without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    /// The message structure is invalid (terminators, tags, or argument sizes).
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),

    /// The bundle structure is invalid (marker, time tag, or element sizes).
    #[error("malformed bundle: {0}")]
    MalformedBundle(&'static str),

    /// A checked accessor was used on an argument with a different type tag.
    #[error("wrong argument type (expected {expected}, found '{found}')")]
    WrongArgumentType { expected: &'static str, found: char },

    /// An argument was extracted after the last one had been consumed.
    #[error("missing argument")]
    MissingArgument,

    /// Arguments remained where the caller expected the end of the message.
    #[error("too many arguments")]
    ExcessArgument,
}

pub type Result<T> = std::result::Result<T, PacketError>;
