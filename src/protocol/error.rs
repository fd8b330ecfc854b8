use std::fmt::{Display, Formatter};
use std::io;
use std::string::FromUtf8Error;

#[derive(Debug)]
pub enum DecodeErrorKind {
    // Tag byte is not one of + - : $ *
    UnknownSymbol(u8),
    // Stream ended before the frame was complete
    EndOfStream,
    // CR not followed by LF, or a bulk payload missing its terminator
    NoCrlf,
    // Length, count or integer line did not parse as a number
    BadInteger(String),
    // Array nesting beyond the decoder's depth cap
    DepthExceeded,
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A malformed frame. Decoding never returns a partial value; the kind
/// carries the offending tag or line for diagnostics.
#[derive(Debug)]
pub struct DecodeError {
    pub(crate) kind: DecodeErrorKind,
}

impl DecodeError {
    pub(crate) fn unknown_symbol(tag: u8) -> Self {
        Self {
            kind: DecodeErrorKind::UnknownSymbol(tag),
        }
    }

    pub(crate) fn end_of_stream() -> Self {
        Self {
            kind: DecodeErrorKind::EndOfStream,
        }
    }

    pub(crate) fn no_crlf() -> Self {
        Self {
            kind: DecodeErrorKind::NoCrlf,
        }
    }

    pub(crate) fn bad_integer(line: String) -> Self {
        Self {
            kind: DecodeErrorKind::BadInteger(line),
        }
    }

    pub(crate) fn depth_exceeded() -> Self {
        Self {
            kind: DecodeErrorKind::DepthExceeded,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DecodeErrorKind::UnknownSymbol(tag) => {
                write!(f, "unknown response type 0x{:02x}", tag)
            }
            DecodeErrorKind::EndOfStream => write!(f, "stream ended mid-frame"),
            DecodeErrorKind::NoCrlf => write!(f, "missing CRLF terminator"),
            DecodeErrorKind::BadInteger(line) => write!(f, "not a number: {:?}", line),
            DecodeErrorKind::DepthExceeded => write!(f, "array nesting too deep"),
            DecodeErrorKind::Other(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: DecodeErrorKind::Other(Box::new(err)),
        }
    }
}

impl From<FromUtf8Error> for DecodeError {
    fn from(err: FromUtf8Error) -> Self {
        Self {
            kind: DecodeErrorKind::Other(Box::new(err)),
        }
    }
}
