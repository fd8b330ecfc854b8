#[cfg(test)]
#[macro_use]
extern crate serial_test;

pub mod command;
pub mod connection;
pub mod protocol;
pub mod runner;
pub mod suite;

pub use command::Command;
pub use connection::{Connection, ConnectionError};
pub use protocol::Resp;
pub use runner::{Outcome, Runner, TestCase, TestRun};
