use std::io::{ErrorKind, Read};

use super::error::DecodeError;
use super::{Resp, CR, LF};

// Protocol-legal replies never nest this deep; the cap keeps adversarial
// frames from exhausting the stack.
const MAX_DEPTH: usize = 64;

pub struct RespDecoder;

impl RespDecoder {
    /// Decode one complete frame from the byte supply, blocking until every
    /// byte the frame declares has arrived. Every frame is self-describing,
    /// so this is a single top-down pass with one byte of lookahead.
    pub fn decode<R: Read>(input: &mut R) -> Result<Resp, DecodeError> {
        RespDecoder::decode_at(input, 0)
    }

    fn decode_at<R: Read>(input: &mut R, depth: usize) -> Result<Resp, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::depth_exceeded());
        }

        match RespDecoder::read_byte(input)? {
            b'+' => Ok(Resp::Status(RespDecoder::read_line(input)?)),
            b'-' => Ok(Resp::Error(RespDecoder::read_line(input)?)),
            b':' => {
                let line = RespDecoder::read_line(input)?;
                line.parse::<i64>()
                    .map(Resp::Integer)
                    .map_err(|_| DecodeError::bad_integer(line))
            }
            b'$' => RespDecoder::decode_bulk(input),
            b'*' => RespDecoder::decode_array(input, depth),
            tag => Err(DecodeError::unknown_symbol(tag)),
        }
    }

    fn decode_bulk<R: Read>(input: &mut R) -> Result<Resp, DecodeError> {
        let length = RespDecoder::read_length(input)?;
        if length < 0 {
            // null bulk; no payload bytes follow
            return Ok(Resp::Bulk(None));
        }

        let mut payload = vec![0_u8; length as usize];
        match input.read_exact(&mut payload) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(DecodeError::end_of_stream());
            }
            Err(err) => return Err(DecodeError::from(err)),
        }

        let cr = RespDecoder::read_byte(input)?;
        let lf = RespDecoder::read_byte(input)?;
        if cr != CR || lf != LF {
            return Err(DecodeError::no_crlf());
        }

        Ok(Resp::Bulk(Some(String::from_utf8(payload)?)))
    }

    fn decode_array<R: Read>(input: &mut R, depth: usize) -> Result<Resp, DecodeError> {
        let count = RespDecoder::read_length(input)?;
        if count < 0 {
            return Ok(Resp::Array(None));
        }

        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            items.push(RespDecoder::decode_at(input, depth + 1)?);
        }

        Ok(Resp::Array(Some(items)))
    }

    // Accumulate until CR, then discard the LF that follows.
    fn read_line<R: Read>(input: &mut R) -> Result<String, DecodeError> {
        let mut line = Vec::new();

        loop {
            let byte = RespDecoder::read_byte(input)?;
            if byte == CR {
                if RespDecoder::read_byte(input)? != LF {
                    return Err(DecodeError::no_crlf());
                }
                break;
            }
            line.push(byte);
        }

        Ok(String::from_utf8(line)?)
    }

    fn read_length<R: Read>(input: &mut R) -> Result<i64, DecodeError> {
        let line = RespDecoder::read_line(input)?;
        line.parse::<i64>()
            .map_err(|_| DecodeError::bad_integer(line))
    }

    fn read_byte<R: Read>(input: &mut R) -> Result<u8, DecodeError> {
        let mut byte = [0_u8; 1];
        match input.read_exact(&mut byte) {
            Ok(()) => Ok(byte[0]),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                Err(DecodeError::end_of_stream())
            }
            Err(err) => Err(DecodeError::from(err)),
        }
    }
}
