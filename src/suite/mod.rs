#[cfg(test)]
mod tests;

pub mod pubsub;

use std::collections::BTreeSet;

use log::warn;

use crate::command::Command;
use crate::protocol::Resp;
use crate::runner::{report, Runner, TestCase};

const CONCAT_SCRIPT: &str = "return KEYS[1] .. ' ' .. ARGV[1]";
const CALL_SCRIPT: &str = "return redis.call('GET', KEYS[1])";
const TABLE_SCRIPT: &str = "return {1, 2, 3, 4, 5}";

/// Every section in a fixed order, one round trip at a time. Later
/// sections rely on the cleanup at the start, not on each other.
pub fn run_all(runner: &mut Runner) {
    cleanup(runner);
    strings(runner);
    lists(runner);
    hashes(runner);
    sets(runner);
    sorted_sets(runner);
    bitmaps(runner);
    hyperloglog(runner);
    bloom(runner);
    geo(runner);
    scripting(runner);
    utility(runner);
}

fn eq<const N: usize>(runner: &mut Runner, name: &str, args: [&str; N], expected: Resp) {
    runner.run(TestCase::equals(name, Command::new(args), expected));
}

fn check<const N: usize, F>(runner: &mut Runner, name: &str, args: [&str; N], predicate: F)
where
    F: Fn(&Resp) -> bool + 'static,
{
    runner.run(TestCase::satisfies(name, Command::new(args), predicate));
}

fn ok() -> Resp {
    Resp::status("OK")
}

fn bulks<const N: usize>(items: [&str; N]) -> Resp {
    Resp::array(items.iter().map(|item| Resp::bulk(*item)).collect())
}

fn ints<const N: usize>(items: [i64; N]) -> Resp {
    Resp::array(items.iter().map(|item| Resp::Integer(*item)).collect())
}

fn strs<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

// Unordered replies (HKEYS, SMEMBERS, ...) compare as sets of text items.
fn as_set(reply: &Resp) -> Option<BTreeSet<String>> {
    match reply {
        Resp::Array(Some(items)) => items
            .iter()
            .map(|item| match item {
                Resp::Bulk(Some(text)) | Resp::Status(text) => Some(text.clone()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

// Numeric replies arrive as integers or as bulk text, server depending.
fn as_float(reply: &Resp) -> Option<f64> {
    match reply {
        Resp::Bulk(Some(text)) | Resp::Status(text) => text.parse().ok(),
        Resp::Integer(number) => Some(*number as f64),
        _ => None,
    }
}

fn as_text(reply: &Resp) -> Option<&str> {
    match reply {
        Resp::Bulk(Some(text)) | Resp::Status(text) => Some(text),
        _ => None,
    }
}

fn cleanup(runner: &mut Runner) {
    report::section("CLEANUP");
    eq(runner, "FLUSHALL", ["FLUSHALL"], ok());
}

fn strings(runner: &mut Runner) {
    report::section("STRING COMMANDS");
    eq(runner, "SET key", ["SET", "mykey", "Hello"], ok());
    eq(runner, "GET key", ["GET", "mykey"], Resp::bulk("Hello"));
    eq(runner, "SET overwrite", ["SET", "mykey", "World"], ok());
    eq(runner, "GET updated", ["GET", "mykey"], Resp::bulk("World"));
    eq(runner, "GET non-existent", ["GET", "nonexistent"], Resp::Bulk(None));
    eq(runner, "DEL key", ["DEL", "mykey"], Resp::Integer(1));
    eq(runner, "DEL non-existent", ["DEL", "nonexistent"], Resp::Integer(0));
    eq(runner, "SET key1", ["SET", "key1", "val1"], ok());
    eq(runner, "EXISTS check", ["EXISTS", "key1"], Resp::Integer(1));
    eq(runner, "EXISTS false", ["EXISTS", "key999"], Resp::Integer(0));

    eq(runner, "SET counter", ["SET", "counter", "10"], ok());
    eq(runner, "INCR", ["INCR", "counter"], Resp::Integer(11));
    eq(runner, "INCRBY 5", ["INCRBY", "counter", "5"], Resp::Integer(16));
    eq(runner, "DECR", ["DECR", "counter"], Resp::Integer(15));
    eq(runner, "DECRBY 3", ["DECRBY", "counter", "3"], Resp::Integer(12));

    eq(runner, "SET with expiry", ["SET", "tempkey", "temp"], ok());
    eq(runner, "EXPIRE 2s", ["EXPIRE", "tempkey", "2"], Resp::Integer(1));
    check(runner, "TTL check", ["TTL", "tempkey"], |reply| {
        matches!(reply, Resp::Integer(ttl) if *ttl > 0 && *ttl <= 2)
    });
}

fn lists(runner: &mut Runner) {
    report::section("LIST COMMANDS");
    eq(runner, "LPUSH", ["LPUSH", "mylist", "world"], Resp::Integer(1));
    eq(runner, "LPUSH 2", ["LPUSH", "mylist", "hello"], Resp::Integer(2));
    eq(
        runner,
        "LRANGE all",
        ["LRANGE", "mylist", "0", "-1"],
        bulks(["hello", "world"]),
    );
    eq(runner, "RPUSH", ["RPUSH", "mylist", "!"], Resp::Integer(3));
    eq(runner, "LLEN", ["LLEN", "mylist"], Resp::Integer(3));
    eq(runner, "LINDEX 0", ["LINDEX", "mylist", "0"], Resp::bulk("hello"));
    eq(runner, "LINDEX 1", ["LINDEX", "mylist", "1"], Resp::bulk("world"));
    eq(runner, "LPOP", ["LPOP", "mylist"], Resp::bulk("hello"));
    eq(runner, "RPOP", ["RPOP", "mylist"], Resp::bulk("!"));
    eq(runner, "LLEN after pop", ["LLEN", "mylist"], Resp::Integer(1));

    eq(
        runner,
        "RPUSH multi",
        ["RPUSH", "list2", "a", "b", "c", "d", "e"],
        Resp::Integer(5),
    );
    eq(runner, "LSET", ["LSET", "list2", "2", "C"], ok());
    eq(
        runner,
        "LRANGE check",
        ["LRANGE", "list2", "0", "-1"],
        bulks(["a", "b", "C", "d", "e"]),
    );
    eq(runner, "LTRIM", ["LTRIM", "list2", "1", "3"], ok());
    eq(
        runner,
        "LRANGE trimmed",
        ["LRANGE", "list2", "0", "-1"],
        bulks(["b", "C", "d"]),
    );
}

fn hashes(runner: &mut Runner) {
    report::section("HASH COMMANDS");
    eq(runner, "HSET", ["HSET", "user:1", "name", "Alice"], Resp::Integer(1));
    eq(runner, "HSET age", ["HSET", "user:1", "age", "30"], Resp::Integer(1));
    eq(runner, "HGET name", ["HGET", "user:1", "name"], Resp::bulk("Alice"));
    eq(runner, "HGET age", ["HGET", "user:1", "age"], Resp::bulk("30"));
    eq(runner, "HEXISTS true", ["HEXISTS", "user:1", "name"], Resp::Integer(1));
    eq(runner, "HEXISTS false", ["HEXISTS", "user:1", "email"], Resp::Integer(0));
    eq(runner, "HLEN", ["HLEN", "user:1"], Resp::Integer(2));
    check(runner, "HKEYS", ["HKEYS", "user:1"], |reply| {
        as_set(reply) == Some(strs(["name", "age"]))
    });
    check(runner, "HVALS", ["HVALS", "user:1"], |reply| {
        as_set(reply) == Some(strs(["Alice", "30"]))
    });
    eq(runner, "HDEL", ["HDEL", "user:1", "age"], Resp::Integer(1));
    eq(runner, "HLEN after del", ["HLEN", "user:1"], Resp::Integer(1));

    eq(runner, "HSET user2", ["HSET", "user:2", "name", "Bob"], Resp::Integer(1));
    eq(runner, "HSET user2 age", ["HSET", "user:2", "age", "25"], Resp::Integer(1));
    eq(runner, "HSET user2 city", ["HSET", "user:2", "city", "NYC"], Resp::Integer(1));
    eq(
        runner,
        "HMGET",
        ["HMGET", "user:2", "name", "age"],
        bulks(["Bob", "25"]),
    );
    eq(
        runner,
        "HINCRBY",
        ["HINCRBY", "user:2", "age", "1"],
        Resp::Integer(26),
    );
}

fn sets(runner: &mut Runner) {
    report::section("SET COMMANDS");
    eq(runner, "SADD", ["SADD", "myset", "apple"], Resp::Integer(1));
    eq(
        runner,
        "SADD multi",
        ["SADD", "myset", "banana", "cherry"],
        Resp::Integer(2),
    );
    eq(runner, "SISMEMBER true", ["SISMEMBER", "myset", "apple"], Resp::Integer(1));
    eq(runner, "SISMEMBER false", ["SISMEMBER", "myset", "grape"], Resp::Integer(0));
    eq(runner, "SCARD", ["SCARD", "myset"], Resp::Integer(3));
    check(runner, "SMEMBERS", ["SMEMBERS", "myset"], |reply| {
        as_set(reply) == Some(strs(["apple", "banana", "cherry"]))
    });
    eq(runner, "SREM", ["SREM", "myset", "banana"], Resp::Integer(1));
    eq(runner, "SCARD after rem", ["SCARD", "myset"], Resp::Integer(2));

    eq(runner, "SADD set1", ["SADD", "set1", "a", "b", "c"], Resp::Integer(3));
    eq(runner, "SADD set2", ["SADD", "set2", "b", "c", "d"], Resp::Integer(3));
    check(runner, "SUNION", ["SUNION", "set1", "set2"], |reply| {
        as_set(reply) == Some(strs(["a", "b", "c", "d"]))
    });
    check(runner, "SINTER", ["SINTER", "set1", "set2"], |reply| {
        as_set(reply) == Some(strs(["b", "c"]))
    });
    check(runner, "SDIFF", ["SDIFF", "set1", "set2"], |reply| {
        as_set(reply) == Some(strs(["a"]))
    });
}

fn sorted_sets(runner: &mut Runner) {
    report::section("SORTED SET COMMANDS");
    eq(runner, "ZADD", ["ZADD", "scores", "100", "Alice"], Resp::Integer(1));
    eq(
        runner,
        "ZADD multi",
        ["ZADD", "scores", "85", "Bob", "92", "Charlie"],
        Resp::Integer(2),
    );
    eq(runner, "ZCARD", ["ZCARD", "scores"], Resp::Integer(3));
    check(runner, "ZSCORE", ["ZSCORE", "scores", "Alice"], |reply| {
        as_float(reply).map_or(false, |score| (score - 100.0).abs() < 1e-9)
    });
    // highest score ranks last ascending, first descending
    eq(runner, "ZRANK", ["ZRANK", "scores", "Alice"], Resp::Integer(2));
    eq(runner, "ZREVRANK", ["ZREVRANK", "scores", "Alice"], Resp::Integer(0));

    eq(
        runner,
        "ZRANGE",
        ["ZRANGE", "scores", "0", "-1"],
        bulks(["Bob", "Charlie", "Alice"]),
    );
    eq(
        runner,
        "ZREVRANGE",
        ["ZREVRANGE", "scores", "0", "-1"],
        bulks(["Alice", "Charlie", "Bob"]),
    );
    check(runner, "ZINCRBY", ["ZINCRBY", "scores", "5", "Bob"], |reply| {
        as_float(reply).map_or(false, |score| (score - 90.0).abs() < 1e-9)
    });
    eq(runner, "ZREM", ["ZREM", "scores", "Charlie"], Resp::Integer(1));
    eq(runner, "ZCARD after rem", ["ZCARD", "scores"], Resp::Integer(2));

    eq(
        runner,
        "ZADD scores2",
        ["ZADD", "scores2", "10", "a", "20", "b", "30", "c", "40", "d"],
        Resp::Integer(4),
    );
    eq(runner, "ZCOUNT", ["ZCOUNT", "scores2", "15", "35"], Resp::Integer(2));
    eq(
        runner,
        "ZREMRANGEBYRANK",
        ["ZREMRANGEBYRANK", "scores2", "0", "1"],
        Resp::Integer(2),
    );
    eq(runner, "ZCARD after rankrem", ["ZCARD", "scores2"], Resp::Integer(2));
}

fn bitmaps(runner: &mut Runner) {
    report::section("BITMAP COMMANDS");
    eq(runner, "SETBIT", ["SETBIT", "mybitmap", "7", "1"], Resp::Integer(0));
    eq(runner, "GETBIT set", ["GETBIT", "mybitmap", "7"], Resp::Integer(1));
    eq(runner, "GETBIT unset", ["GETBIT", "mybitmap", "100"], Resp::Integer(0));
    eq(runner, "SETBIT multi", ["SETBIT", "mybitmap", "10", "1"], Resp::Integer(0));
    eq(runner, "BITCOUNT", ["BITCOUNT", "mybitmap"], Resp::Integer(2));
    eq(runner, "BITPOS 1", ["BITPOS", "mybitmap", "1"], Resp::Integer(7));
}

fn hyperloglog(runner: &mut Runner) {
    report::section("HYPERLOGLOG COMMANDS");
    eq(runner, "PFADD", ["PFADD", "hll", "a", "b", "c"], Resp::Integer(1));
    // cardinality is approximate; only a lower bound is stable
    check(runner, "PFCOUNT", ["PFCOUNT", "hll"], |reply| {
        matches!(reply, Resp::Integer(count) if *count >= 3)
    });
    eq(runner, "PFADD dupe", ["PFADD", "hll", "a", "b", "c"], Resp::Integer(0));
    eq(runner, "PFADD new", ["PFADD", "hll2", "d", "e", "f"], Resp::Integer(1));
    eq(runner, "PFMERGE", ["PFMERGE", "hll3", "hll", "hll2"], ok());
    check(runner, "PFCOUNT merged", ["PFCOUNT", "hll3"], |reply| {
        matches!(reply, Resp::Integer(count) if *count >= 6)
    });
}

fn bloom(runner: &mut Runner) {
    report::section("BLOOM FILTER COMMANDS");
    eq(
        runner,
        "BF.RESERVE",
        ["BF.RESERVE", "mybloom", "0.01", "1000"],
        ok(),
    );
    eq(runner, "BF.ADD", ["BF.ADD", "mybloom", "apple"], Resp::Integer(1));
    eq(runner, "BF.EXISTS true", ["BF.EXISTS", "mybloom", "apple"], Resp::Integer(1));
    eq(runner, "BF.EXISTS false", ["BF.EXISTS", "mybloom", "grape"], Resp::Integer(0));
    eq(
        runner,
        "BF.MADD",
        ["BF.MADD", "mybloom", "banana", "cherry"],
        ints([1, 1]),
    );
    eq(
        runner,
        "BF.MEXISTS",
        ["BF.MEXISTS", "mybloom", "banana", "grape"],
        ints([1, 0]),
    );
}

fn geo(runner: &mut Runner) {
    report::section("GEO COMMANDS");
    eq(
        runner,
        "GEOADD",
        ["GEOADD", "cities", "13.361389", "38.115556", "Palermo"],
        Resp::Integer(1),
    );
    eq(
        runner,
        "GEOADD multi",
        ["GEOADD", "cities", "15.087269", "37.502669", "Catania"],
        Resp::Integer(1),
    );
    // great-circle Palermo-Catania is about 166 km
    check(
        runner,
        "GEODIST",
        ["GEODIST", "cities", "Palermo", "Catania", "km"],
        |reply| as_float(reply).map_or(false, |km| km > 150.0 && km < 170.0),
    );
}

fn scripting(runner: &mut Runner) {
    report::section("LUA SCRIPTING");
    eq(
        runner,
        "EVAL concat",
        ["EVAL", CONCAT_SCRIPT, "1", "Hello", "World"],
        Resp::bulk("Hello World"),
    );

    if let Err(err) = runner.query(&Command::new(["SET", "luakey", "luavalue"])) {
        warn!("scripting fixture setup failed: {}", err);
    }
    eq(
        runner,
        "EVAL redis.call",
        ["EVAL", CALL_SCRIPT, "1", "luakey"],
        Resp::bulk("luavalue"),
    );
    eq(
        runner,
        "EVAL array",
        ["EVAL", TABLE_SCRIPT, "0"],
        ints([1, 2, 3, 4, 5]),
    );

    check(
        runner,
        "SCRIPT LOAD",
        ["SCRIPT", "LOAD", CONCAT_SCRIPT],
        |reply| {
            matches!(
                reply,
                Resp::Bulk(Some(sha))
                    if sha.len() == 40 && sha.bytes().all(|b| b.is_ascii_hexdigit())
            )
        },
    );

    // the sha comes off the live server, so these cases are derived at run time
    match runner.query(&Command::new(["SCRIPT", "LOAD", CONCAT_SCRIPT])) {
        Ok(Resp::Bulk(Some(sha))) if sha.len() == 40 => {
            eq(
                runner,
                "EVALSHA",
                ["EVALSHA", sha.as_str(), "1", "Foo", "Bar"],
                Resp::bulk("Foo Bar"),
            );
            eq(
                runner,
                "SCRIPT EXISTS",
                ["SCRIPT", "EXISTS", sha.as_str()],
                ints([1]),
            );
        }
        other => warn!("SCRIPT LOAD did not return a sha, skipping EVALSHA: {:?}", other),
    }
}

fn utility(runner: &mut Runner) {
    report::section("CLEANUP & UTILITY");
    check(runner, "KEYS pattern", ["KEYS"], |reply| {
        matches!(reply, Resp::Array(Some(keys)) if !keys.is_empty())
    });
    eq(runner, "FLUSHALL final", ["FLUSHALL"], ok());
    eq(runner, "KEYS empty", ["KEYS"], Resp::array(vec![]));

    eq(runner, "PING", ["PING"], Resp::status("PONG"));
    // servers answer a ping payload as status or bulk; either is conformant
    check(runner, "PING message", ["PING", "Hello"], |reply| {
        as_text(reply) == Some("Hello")
    });
}
