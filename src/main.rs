use std::process;

use structopt::StructOpt;

use redcheck::connection::Connection;
use redcheck::runner::{report, Runner};
use redcheck::suite;

/// Conformance checks for a RESP server: data-structure commands over one
/// request/response connection, then a pub/sub exchange over two.
#[derive(StructOpt, Debug)]
#[structopt(name = "redcheck", about = "RESP server conformance checks")]
struct Opt {
    /// Server host
    #[structopt(default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[structopt(default_value = "6379")]
    port: u16,
}

fn main() {
    let opt = Opt::from_args();
    let _ = simple_logger::init_with_level(log::Level::Warn);

    report::banner(&opt.host, opt.port);

    let connection = match Connection::connect(&opt.host, opt.port) {
        Ok(connection) => connection,
        Err(err) => {
            // nothing ran; this is not a test failure but an unreachable server
            eprintln!("{}", err);
            eprintln!("usage: redcheck [HOST] [PORT]");
            process::exit(1);
        }
    };

    let mut runner = Runner::new(connection);
    suite::run_all(&mut runner);

    // the command connection closes here; pub/sub opens its own pair
    let mut run = runner.into_run();
    suite::pubsub::verify(&opt.host, opt.port, &mut run);

    report::print_summary(&run);
    process::exit(if run.all_passed() { 0 } else { 1 });
}
