#[cfg(test)]
mod tests;

pub mod pubsub;

use std::fmt::{Display, Formatter};
use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use log::{debug, info};

use crate::command::Command;
use crate::protocol::{self, decoder::RespDecoder, error::DecodeError, Resp};

#[derive(Debug)]
pub enum ConnectionError {
    // Could not establish the socket; fatal before any case has run
    Refused { addr: String, source: io::Error },
    // Write side failed mid-run
    Write(io::Error),
    // Read side failed outside the decoder (push-frame path)
    Read(io::Error),
    // The reply could not be decoded off the wire
    Decode(DecodeError),
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Refused { addr, source } => {
                write!(f, "cannot connect to {}: {}", addr, source)
            }
            ConnectionError::Write(err) => write!(f, "write failed: {}", err),
            ConnectionError::Read(err) => write!(f, "read failed: {}", err),
            ConnectionError::Decode(err) => write!(f, "bad reply: {}", err),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<DecodeError> for ConnectionError {
    fn from(err: DecodeError) -> Self {
        ConnectionError::Decode(err)
    }
}

/// Exclusive owner of one client socket. Reads go through a persistent
/// buffered reader so a frame spanning several segments is reassembled;
/// writes go straight to the stream.
pub struct Connection {
    reader: BufReader<TcpStream>,
    addr: String,
}

impl Connection {
    pub fn connect(host: &str, port: u16) -> Result<Connection, ConnectionError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).map_err(|source| ConnectionError::Refused {
            addr: addr.clone(),
            source,
        })?;
        info!("connected to {}", addr);

        Ok(Connection {
            reader: BufReader::new(stream),
            addr,
        })
    }

    pub fn send(&mut self, command: &Command) -> Result<(), ConnectionError> {
        let wire = protocol::encode(command);
        debug!("-> {} ({} bytes)", command, wire.len());

        let stream = self.reader.get_mut();
        stream.write_all(&wire).map_err(ConnectionError::Write)?;
        stream.flush().map_err(ConnectionError::Write)
    }

    /// Block until one complete reply frame has been decoded. No deadline
    /// on this path: the server is expected to answer every request.
    pub fn reply(&mut self) -> Result<Resp, ConnectionError> {
        let resp = RespDecoder::decode(&mut self.reader)?;
        debug!("<- {}", resp);
        Ok(resp)
    }

    // Raw segment read for the push-frame path. Drains buffered bytes first.
    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    pub(crate) fn set_read_deadline(&self, deadline: Option<Duration>) -> io::Result<()> {
        self.reader.get_ref().set_read_timeout(deadline)
    }

    /// Release the socket. Dropping has the same effect, so the socket is
    /// returned on every exit path, panics included.
    pub fn close(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.reader.get_ref().shutdown(Shutdown::Both);
        info!("closed connection to {}", self.addr);
    }
}
