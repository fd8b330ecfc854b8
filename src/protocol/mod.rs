
pub mod decoder;
pub mod error;

use std::fmt::{Display, Formatter};

use crate::command::Command;

pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

pub const NIL: &[u8; 5] = b"$-1\r\n";
pub const NIL_ARRAY: &[u8; 5] = b"*-1\r\n";

/// One decoded RESP frame. `Bulk(None)` and `Array(None)` are the null
/// sentinels, distinct from the empty string and the empty array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resp {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Option<String>),
    Array(Option<Vec<Resp>>),
}

impl Resp {
    pub fn bulk<S: Into<String>>(text: S) -> Self {
        Resp::Bulk(Some(text.into()))
    }

    pub fn status<S: Into<String>>(text: S) -> Self {
        Resp::Status(text.into())
    }

    pub fn array(items: Vec<Resp>) -> Self {
        Resp::Array(Some(items))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Resp::Error(_))
    }
}

impl Display for Resp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Resp::Status(text) => write!(f, "{}", text),
            Resp::Error(message) => write!(f, "(error) {}", message),
            Resp::Integer(number) => write!(f, "{}", number),
            Resp::Bulk(Some(text)) => write!(f, "\"{}\"", text),
            Resp::Bulk(None) => write!(f, "(nil)"),
            Resp::Array(Some(items)) => {
                let items: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Resp::Array(None) => write!(f, "(nil array)"),
        }
    }
}

/// Frame a command as an array of bulk strings. Lengths are byte lengths,
/// so multi-byte arguments frame correctly.
pub fn encode(command: &Command) -> Vec<u8> {
    let args = command.args();
    let mut wire = Vec::with_capacity(16 * args.len());

    wire.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        wire.extend_from_slice(format!("${}\r\n", arg.as_bytes().len()).as_bytes());
        wire.extend_from_slice(arg.as_bytes());
        wire.extend_from_slice(b"\r\n");
    }

    wire
}

/// Render a frame the way a server replies with it. The harness only
/// decodes replies; this is for round-trip checks and test fixtures.
pub fn encode_reply(resp: &Resp) -> Vec<u8> {
    match resp {
        Resp::Status(text) => format!("+{}\r\n", text).into_bytes(),
        Resp::Error(message) => format!("-{}\r\n", message).into_bytes(),
        Resp::Integer(number) => format!(":{}\r\n", number).into_bytes(),
        Resp::Bulk(None) => NIL.to_vec(),
        Resp::Bulk(Some(text)) => {
            let mut wire = format!("${}\r\n", text.as_bytes().len()).into_bytes();
            wire.extend_from_slice(text.as_bytes());
            wire.extend_from_slice(b"\r\n");
            wire
        }
        Resp::Array(None) => NIL_ARRAY.to_vec(),
        Resp::Array(Some(items)) => {
            let mut wire = format!("*{}\r\n", items.len()).into_bytes();
            for item in items {
                wire.append(&mut encode_reply(item));
            }
            wire
        }
    }
}
