use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use super::*;
use crate::connection::Connection;
use crate::runner::Runner;

#[test]
fn unordered_replies_compare_as_sets() {
    let reply = Resp::array(vec![Resp::bulk("b"), Resp::bulk("a")]);
    assert_eq!(as_set(&reply), Some(strs(["a", "b"])));

    // a non-text member means no set view at all
    let mixed = Resp::array(vec![Resp::bulk("a"), Resp::Integer(1)]);
    assert_eq!(as_set(&mixed), None);

    assert_eq!(as_set(&Resp::Array(None)), None);
    assert_eq!(as_set(&Resp::bulk("a")), None);
}

#[test]
fn numeric_replies_parse_from_either_wire_shape() {
    assert_eq!(as_float(&Resp::bulk("166.27")), Some(166.27));
    assert_eq!(as_float(&Resp::Integer(90)), Some(90.0));
    assert_eq!(as_float(&Resp::bulk("not a number")), None);
    assert_eq!(as_float(&Resp::Bulk(None)), None);
}

#[test]
fn text_view_covers_status_and_bulk() {
    assert_eq!(as_text(&Resp::status("Hello")), Some("Hello"));
    assert_eq!(as_text(&Resp::bulk("Hello")), Some("Hello"));
    assert_eq!(as_text(&Resp::Integer(5)), None);
}

// One accepted client; each canned reply answers one request frame.
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
fn string_lifecycle_scenario() {
    let port = script_server(vec![b"+OK\r\n", b"$1\r\nv\r\n", b":1\r\n", b"$-1\r\n"]);
    let mut runner = Runner::new(Connection::connect("127.0.0.1", port).unwrap());

    eq(&mut runner, "SET k", ["SET", "k", "v"], ok());
    eq(&mut runner, "GET k", ["GET", "k"], Resp::bulk("v"));
    eq(&mut runner, "DEL k", ["DEL", "k"], Resp::Integer(1));
    eq(&mut runner, "GET deleted k", ["GET", "k"], Resp::Bulk(None));

    let run = runner.into_run();
    assert!(run.all_passed(), "failures: {:?}", run.failures());
    assert_eq!(run.total(), 4);
}

#[test]
fn list_order_scenario() {
    let port = script_server(vec![
        b":3\r\n",
        b"*3\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n",
    ]);
    let mut runner = Runner::new(Connection::connect("127.0.0.1", port).unwrap());

    eq(
        &mut runner,
        "RPUSH l",
        ["RPUSH", "l", "a", "b", "c"],
        Resp::Integer(3),
    );
    // elements come back in insertion order
    eq(
        &mut runner,
        "LRANGE l",
        ["LRANGE", "l", "0", "-1"],
        bulks(["a", "b", "c"]),
    );

    assert!(runner.summary().all_passed());
}
