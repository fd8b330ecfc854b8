use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use crate::command::Command;
use crate::connection::{pubsub::PushReader, Connection, ConnectionError};
use crate::protocol::Resp;

const SUBSCRIBE_ACK: &[u8] = b"*3\r\n$9\r\nsubscribe\r\n$4\r\nnews\r\n:1\r\n";
const NEWS_MESSAGE: &[u8] = b"*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$11\r\nHello World\r\n";

// One accepted client; for each canned reply, consume one request frame
// then write the reply, then hold the socket open briefly.
fn script_server(replies: Vec<&'static [u8]>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0_u8; 512];
        for reply in replies {
            let _ = stream.read(&mut buf).unwrap();
            stream.write_all(reply).unwrap();
        }
        thread::sleep(Duration::from_millis(400));
    });

    port
}

#[test]
fn reply_decodes_scripted_frames() {
    let port = script_server(vec![
        b"+PONG\r\n",
        b"$-1\r\n",
        b"*2\r\n$1\r\na\r\n$1\r\nb\r\n",
    ]);
    let mut connection = Connection::connect("127.0.0.1", port).unwrap();

    connection.send(&Command::new(["PING"])).unwrap();
    assert_eq!(connection.reply().unwrap(), Resp::status("PONG"));

    connection.send(&Command::new(["GET", "missing"])).unwrap();
    assert_eq!(connection.reply().unwrap(), Resp::Bulk(None));

    connection
        .send(&Command::new(["LRANGE", "l", "0", "-1"]))
        .unwrap();
    assert_eq!(
        connection.reply().unwrap(),
        Resp::array(vec![Resp::bulk("a"), Resp::bulk("b")])
    );

    connection.close();
}

#[test]
fn error_reply_decodes_as_a_value() {
    let port = script_server(vec![b"-ERR unknown command\r\n"]);
    let mut connection = Connection::connect("127.0.0.1", port).unwrap();

    connection.send(&Command::new(["BOGUS"])).unwrap();
    let reply = connection.reply().unwrap();
    assert!(reply.is_error());
}

#[test]
fn garbage_on_the_wire_is_a_decode_error() {
    let port = script_server(vec![b"?boom\r\n"]);
    let mut connection = Connection::connect("127.0.0.1", port).unwrap();

    connection.send(&Command::new(["PING"])).unwrap();
    match connection.reply() {
        Err(ConnectionError::Decode(err)) => {
            assert!(err.to_string().contains("unknown response type"));
        }
        other => panic!("expected a decode error, got {:?}", other.map(|r| r.to_string())),
    }
}

#[test]
fn connect_refused_is_fatal_and_distinct() {
    // a port nothing listens on; bind-then-drop reserves a dead one
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    match Connection::connect("127.0.0.1", port) {
        Err(ConnectionError::Refused { addr, .. }) => {
            assert!(addr.ends_with(&port.to_string()));
        }
        other => panic!("expected refusal, got {:?}", other.map(|_| "connection")),
    }
}

#[test]
fn push_reader_returns_empty_on_silence() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (_stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(600));
    });

    let mut connection = Connection::connect("127.0.0.1", port).unwrap();
    let text = PushReader::new(&mut connection)
        .read(Duration::from_millis(150))
        .unwrap();
    assert_eq!(text, "");
}

#[test]
fn push_reader_captures_a_push_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0_u8; 512];
        let _ = stream.read(&mut buf).unwrap();
        stream.write_all(SUBSCRIBE_ACK).unwrap();
        thread::sleep(Duration::from_millis(400));
    });

    let mut connection = Connection::connect("127.0.0.1", port).unwrap();
    connection
        .send(&Command::new(["SUBSCRIBE", "news"]))
        .unwrap();

    let text = PushReader::new(&mut connection)
        .read(Duration::from_secs(1))
        .unwrap();
    assert!(text.contains("subscribe"));
    assert!(text.contains("news"));
}

#[test]
#[serial]
fn push_reader_merges_frames_delivered_back_to_back() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(SUBSCRIBE_ACK).unwrap();
        thread::sleep(Duration::from_millis(1));
        stream.write_all(NEWS_MESSAGE).unwrap();
        thread::sleep(Duration::from_millis(400));
    });

    let mut connection = Connection::connect("127.0.0.1", port).unwrap();
    let text = PushReader::new(&mut connection)
        .read(Duration::from_secs(1))
        .unwrap();

    // the CRLF heuristic merges the trailing frame into one buffer
    assert!(text.contains("subscribe"));
    assert!(text.contains("Hello World"));
}
