use std::thread;
use std::time::Duration;

use rand::{distributions::Alphanumeric, Rng};

use crate::command::Command;
use crate::connection::{pubsub::PushReader, Connection, ConnectionError};
use crate::protocol::Resp;
use crate::runner::{report, Outcome, TestRun};

// Acks come straight back; published messages cross two connections and
// the server's fan-out, so they get the longer deadlines.
const ACK_DEADLINE: Duration = Duration::from_secs(1);
const MESSAGE_DEADLINE: Duration = Duration::from_secs(2);
const PATTERN_DEADLINE: Duration = Duration::from_secs(3);
const SILENCE_DEADLINE: Duration = Duration::from_millis(500);

/// Drive the push-message flow: one subscriber connection, one publisher
/// connection, a single control thread alternating between them. Push
/// frames are asserted by substring containment, never structural decode.
pub fn verify(host: &str, port: u16, run: &mut TestRun) {
    report::section("PUB/SUB");
    if let Err(err) = drive(host, port, run) {
        let outcome = Outcome::TransportError(err.to_string());
        report::case_line("pub/sub scenario", &outcome);
        run.record("pub/sub scenario", &outcome);
    }
}

fn drive(host: &str, port: u16, run: &mut TestRun) -> Result<(), ConnectionError> {
    let mut subscriber = Connection::connect(host, port)?;
    let mut publisher = Connection::connect(host, port)?;

    // a per-run nonce keeps the containment checks from matching a stale
    // frame left over from an earlier run against the same server
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    let payload = format!("Hello World #{}", nonce);

    subscriber.send(&Command::new(["SUBSCRIBE", "news"]))?;
    let ack = PushReader::new(&mut subscriber).read(ACK_DEADLINE)?;
    record(
        run,
        "SUBSCRIBE news",
        ack.contains("subscribe") && ack.contains("news"),
        &ack,
    );

    publisher.send(&Command::new(["PUBLISH", "news", &payload]))?;
    let receivers = publisher.reply()?;
    record(
        run,
        "PUBLISH news",
        matches!(&receivers, Resp::Integer(_)),
        &receivers.to_string(),
    );

    let message = PushReader::new(&mut subscriber).read(MESSAGE_DEADLINE)?;
    record(
        run,
        "message delivered",
        message.contains("message") && message.contains("Hello World"),
        &message,
    );

    subscriber.send(&Command::new(["PSUBSCRIBE", "sports:*"]))?;
    let ack = PushReader::new(&mut subscriber).read(ACK_DEADLINE)?;
    record(
        run,
        "PSUBSCRIBE sports:*",
        ack.contains("psubscribe") && ack.contains("sports:*"),
        &ack,
    );

    publisher.send(&Command::new(["PUBLISH", "sports:football", "Goal!"]))?;
    let _ = publisher.reply()?;

    // pattern fan-out can lag plain channel delivery
    thread::sleep(Duration::from_millis(100));
    let message = PushReader::new(&mut subscriber).read(PATTERN_DEADLINE)?;
    record(
        run,
        "pattern message delivered",
        message.contains("pmessage") && message.contains("Goal!"),
        &message,
    );

    subscriber.send(&Command::new(["UNSUBSCRIBE", "news"]))?;
    let ack = PushReader::new(&mut subscriber).read(ACK_DEADLINE)?;
    record(
        run,
        "UNSUBSCRIBE news",
        ack.contains("unsubscribe") && ack.contains("news"),
        &ack,
    );

    // nothing is published after the unsubscribe, so a short read must not
    // produce a delivery for that channel
    let silence = PushReader::new(&mut subscriber).read(SILENCE_DEADLINE)?;
    record(
        run,
        "no delivery after unsubscribe",
        !(silence.contains("message") && silence.contains("news")),
        &silence,
    );

    subscriber.send(&Command::new(["PUNSUBSCRIBE", "sports:*"]))?;
    let ack = PushReader::new(&mut subscriber).read(ACK_DEADLINE)?;
    record(
        run,
        "PUNSUBSCRIBE sports:*",
        ack.contains("punsubscribe"),
        &ack,
    );

    subscriber.close();
    publisher.close();
    Ok(())
}

fn record(run: &mut TestRun, name: &str, satisfied: bool, text: &str) {
    let outcome = if satisfied {
        Outcome::Passed
    } else {
        Outcome::PredicateFailed {
            actual: Resp::bulk(text),
        }
    };
    report::case_line(name, &outcome);
    run.record(name, &outcome);
}
