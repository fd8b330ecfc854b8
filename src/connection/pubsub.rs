use std::io::{self, ErrorKind};
use std::thread;
use std::time::Duration;

use log::debug;

use super::{Connection, ConnectionError};

// Push frames can trail each other closely; after a CRLF-terminated buffer
// one more short read merges an immediately following segment.
const GRACE: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(10);
const SEGMENT: usize = 1024;

/// Reads frames the server pushes outside the request/response cadence,
/// once a connection has active subscriptions. Best-effort by heuristic:
/// the CRLF check can merge adjacent frames or cut one short, so callers
/// assert by substring containment, never by structural decode.
pub struct PushReader<'a> {
    connection: &'a mut Connection,
}

impl<'a> PushReader<'a> {
    pub fn new(connection: &'a mut Connection) -> Self {
        PushReader { connection }
    }

    /// Accumulate pushed bytes until `deadline` elapses with nothing new,
    /// or the buffer ends on CRLF. An elapsed deadline is "no further
    /// data", not a failure. Invalid UTF-8 is replaced rather than
    /// propagated, since push payloads may be binary-adjacent fixtures.
    pub fn read(&mut self, deadline: Duration) -> Result<String, ConnectionError> {
        self.connection
            .set_read_deadline(Some(deadline))
            .map_err(ConnectionError::Read)?;

        let mut buffer = Vec::new();
        let mut segment = [0_u8; SEGMENT];

        loop {
            match self.connection.read_chunk(&mut segment) {
                // peer closed the stream
                Ok(0) => break,
                Ok(received) => {
                    buffer.extend_from_slice(&segment[..received]);
                    if buffer.ends_with(b"\r\n") {
                        self.merge_trailing(&mut buffer, &mut segment)?;
                        break;
                    }
                }
                Err(err) if timed_out(&err) => break,
                Err(err) => {
                    let _ = self.connection.set_read_deadline(None);
                    return Err(ConnectionError::Read(err));
                }
            }
        }

        self.connection
            .set_read_deadline(None)
            .map_err(ConnectionError::Read)?;

        let text = String::from_utf8_lossy(&buffer).into_owned();
        debug!("push frames ({} bytes): {:?}", buffer.len(), text);
        Ok(text)
    }

    fn merge_trailing(
        &mut self,
        buffer: &mut Vec<u8>,
        segment: &mut [u8],
    ) -> Result<(), ConnectionError> {
        thread::sleep(SETTLE);
        self.connection
            .set_read_deadline(Some(GRACE))
            .map_err(ConnectionError::Read)?;

        match self.connection.read_chunk(segment) {
            Ok(received) if received > 0 => buffer.extend_from_slice(&segment[..received]),
            Ok(_) => {}
            Err(err) if timed_out(&err) => {}
            Err(err) => return Err(ConnectionError::Read(err)),
        }

        Ok(())
    }
}

// Read deadlines surface as WouldBlock on unix and TimedOut on windows.
fn timed_out(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
