
pub mod report;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::command::Command;
use crate::connection::{Connection, ConnectionError};
use crate::protocol::Resp;

/// What a case demands of the decoded reply: a literal value compared
/// structurally, or a predicate for replies that are only constrained,
/// not fixed (TTL windows, unordered members, approximate counts).
pub enum Expectation {
    Equals(Resp),
    Satisfies(Box<dyn Fn(&Resp) -> bool>),
}

pub struct TestCase {
    pub name: String,
    pub command: Command,
    pub expectation: Expectation,
}

impl TestCase {
    pub fn equals<N: Into<String>>(name: N, command: Command, expected: Resp) -> Self {
        TestCase {
            name: name.into(),
            command,
            expectation: Expectation::Equals(expected),
        }
    }

    pub fn satisfies<N, F>(name: N, command: Command, predicate: F) -> Self
    where
        N: Into<String>,
        F: Fn(&Resp) -> bool + 'static,
    {
        TestCase {
            name: name.into(),
            command,
            expectation: Expectation::Satisfies(Box::new(predicate)),
        }
    }
}

/// Classification of one executed case. Exactly one variant per case; an
/// error reply can never satisfy a positive expectation, so it is checked
/// first and wins unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Mismatch { expected: Resp, actual: Resp },
    PredicateFailed { actual: Resp },
    TransportError(String),
}

impl Outcome {
    pub fn passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Mismatch { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            Outcome::PredicateFailed { actual } => {
                write!(f, "predicate not satisfied by {}", actual)
            }
            Outcome::TransportError(message) => write!(f, "transport error: {}", message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub name: String,
    pub reason: String,
}

/// Aggregate for one run, owned by a single runner for its lifetime.
/// Never process-global, so concurrent runs cannot interfere.
pub struct TestRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    passed: u32,
    failed: u32,
    failures: Vec<Failure>,
}

impl TestRun {
    fn new() -> Self {
        TestRun {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            passed: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &str, outcome: &Outcome) {
        if outcome.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
            self.failures.push(Failure {
                name: name.to_string(),
                reason: outcome.to_string(),
            });
        }
    }

    pub fn passed(&self) -> u32 {
        self.passed
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn total(&self) -> u32 {
        self.passed + self.failed
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Drives one request/response connection through an ordered list of
/// cases, strictly sequentially: a case's full round trip completes
/// before the next command is sent.
pub struct Runner {
    connection: Connection,
    run: TestRun,
}

impl Runner {
    pub fn new(connection: Connection) -> Self {
        Runner {
            connection,
            run: TestRun::new(),
        }
    }

    /// Send and decode without recording. Suite sections use this for
    /// fixture setup and for deriving cases from earlier replies.
    pub fn query(&mut self, command: &Command) -> Result<Resp, ConnectionError> {
        self.connection.send(command)?;
        self.connection.reply()
    }

    pub fn run(&mut self, case: TestCase) -> Outcome {
        let outcome = self.execute(&case);
        report::case_line(&case.name, &outcome);
        self.run.record(&case.name, &outcome);
        outcome
    }

    fn execute(&mut self, case: &TestCase) -> Outcome {
        let reply = match self.query(&case.command) {
            Ok(reply) => reply,
            // decode failures land here too; the stream's byte alignment
            // is not guaranteed to have recovered (no resync marker)
            Err(err) => return Outcome::TransportError(err.to_string()),
        };

        // an error reply trumps whatever the case expected
        if let Resp::Error(message) = &reply {
            return Outcome::TransportError(message.clone());
        }

        match &case.expectation {
            Expectation::Satisfies(predicate) => {
                if predicate(&reply) {
                    Outcome::Passed
                } else {
                    Outcome::PredicateFailed { actual: reply }
                }
            }
            Expectation::Equals(expected) => {
                if reply == *expected {
                    Outcome::Passed
                } else {
                    Outcome::Mismatch {
                        expected: expected.clone(),
                        actual: reply,
                    }
                }
            }
        }
    }

    pub fn summary(&self) -> &TestRun {
        &self.run
    }

    /// Hand the aggregate back and release the connection.
    pub fn into_run(self) -> TestRun {
        self.run
    }
}
