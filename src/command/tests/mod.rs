use crate::command::Command;
use crate::protocol;

#[test]
fn arguments_keep_their_order() {
    let command = Command::new(["RPUSH", "mylist", "a", "b", "c"]);
    assert_eq!(command.name(), "RPUSH");
    assert_eq!(command.args(), ["RPUSH", "mylist", "a", "b", "c"]);
}

#[test]
fn mixed_argument_sources() {
    let port = 6379.to_string();
    let command = Command::new(vec!["SET".to_string(), "port".to_string(), port]);
    assert_eq!(command.args().len(), 3);
    assert_eq!(command.to_string(), "SET port 6379");
}

#[test]
fn encodes_through_the_protocol() {
    let command = Command::new(["PING"]);
    assert_eq!(protocol::encode(&command), b"*1\r\n$4\r\nPING\r\n".to_vec());
}

#[test]
#[should_panic]
fn empty_command_is_a_programming_error() {
    let none: [&str; 0] = [];
    let _ = Command::new(none);
}
