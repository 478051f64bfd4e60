use crate::argument::{Argument, Arguments};
use crate::error::{PacketError, Result};
use crate::types::{Blob, MidiMessage, RgbaColor, Symbol, TimeTag};

/// Sequential, type-checked extraction of message arguments.
///
/// Each [`read`](Self::read) takes the next argument in order and converts it
/// to the requested type. A handler can assert the exact shape of a message in
/// a few lines:
///
/// ```
/// # use oscprims_packet::{Message, Result};
/// # fn handle(message: &Message<'_>) -> Result<()> {
/// let mut args = message.argument_stream();
/// let channel: i32 = args.read()?;
/// let gain: f32 = args.read()?;
/// args.expect_end()?;
/// # let _ = (channel, gain);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentStream<'a> {
    args: Arguments<'a>,
}

impl<'a> ArgumentStream<'a> {
    pub(crate) fn new(args: Arguments<'a>) -> Self {
        Self { args }
    }

    /// True once every argument has been consumed.
    pub fn is_end(&self) -> bool {
        self.args.len() == 0
    }

    /// Number of arguments not yet consumed.
    pub fn remaining(&self) -> usize {
        self.args.len()
    }

    /// Take the next argument without converting it.
    pub fn next_argument(&mut self) -> Result<Argument<'a>> {
        self.args.next().ok_or(PacketError::MissingArgument)
    }

    /// Take the next argument and convert it to `T`.
    ///
    /// The argument is consumed even when the conversion fails with
    /// [`PacketError::WrongArgumentType`].
    pub fn read<T: FromArgument<'a>>(&mut self) -> Result<T> {
        let argument = self.next_argument()?;
        T::from_argument(&argument)
    }

    /// Fail with [`PacketError::ExcessArgument`] if arguments remain.
    pub fn expect_end(&self) -> Result<()> {
        if self.is_end() {
            Ok(())
        } else {
            Err(PacketError::ExcessArgument)
        }
    }
}

/// Types that can be read from an [`ArgumentStream`].
pub trait FromArgument<'a>: Sized {
    fn from_argument(argument: &Argument<'a>) -> Result<Self>;
}

macro_rules! from_argument {
    ($($ty:ty => $accessor:ident),* $(,)?) => {
        $(
            impl<'a> FromArgument<'a> for $ty {
                fn from_argument(argument: &Argument<'a>) -> Result<Self> {
                    argument.$accessor()
                }
            }
        )*
    };
}

from_argument! {
    bool => as_bool,
    i32 => as_int32,
    f32 => as_float,
    char => as_char,
    RgbaColor => as_rgba_color,
    MidiMessage => as_midi_message,
    i64 => as_int64,
    TimeTag => as_time_tag,
    f64 => as_double,
}

impl<'a> FromArgument<'a> for &'a str {
    fn from_argument(argument: &Argument<'a>) -> Result<Self> {
        argument.as_str()
    }
}

impl<'a> FromArgument<'a> for Symbol<'a> {
    fn from_argument(argument: &Argument<'a>) -> Result<Self> {
        argument.as_symbol()
    }
}

impl<'a> FromArgument<'a> for Blob<'a> {
    fn from_argument(argument: &Argument<'a>) -> Result<Self> {
        argument.as_blob()
    }
}

impl<'a> FromArgument<'a> for Argument<'a> {
    fn from_argument(argument: &Argument<'a>) -> Result<Self> {
        Ok(*argument)
    }
}
