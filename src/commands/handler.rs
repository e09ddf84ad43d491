//! Command Handler Module
//!
//! This module implements the commands driftkv understands. It takes parsed
//! request frames, dispatches them by name, applies them to the storage engine
//! and forwards successful writes to the append-only file.
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET key value` - Set a key, clearing any expiry
//! - `GET key` - Get a key's value
//! - `DEL key [key ...]` - Delete keys
//! - `EXISTS key [key ...]` - Count existing keys
//! - `EXPIRE key seconds` - Set expiry
//! - `TTL key` - Get remaining TTL in seconds
//! - `PTTL key` - Get remaining TTL in ms
//! - `PERSIST key` - Remove expiry
//!
//! ### Server Commands
//! - `PING [message]` - Test connection
//! - `ECHO message` - Echo message
//! - `DBSIZE` - Number of keys
//! - `INFO` - Server information
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │  execute()  │───>│  dispatch() │───>│  cmd_xxx()  │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │             │
//! │                          ┌────────────────────┴──────┐      │
//! │                          ▼                           ▼      │
//! │                   StorageEngine          AppendOnlyLog      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::metrics::ServerStats;
use crate::persistence::{replay_frames, AofError, AppendOnlyLog, ReplaySummary};
use crate::protocol::{Frame, RespValue};
use crate::storage::{MonotonicClock, StorageEngine, SweepStats};
use bytes::Bytes;
use std::fmt::Write as _;
use std::time::Instant;
use tracing::info;

/// Handles commands by dispatching them to the appropriate handlers.
///
/// The handler owns every piece of server state that commands touch, so the
/// event loop only needs one `&mut CommandHandler`.
#[derive(Debug, Default)]
pub struct CommandHandler {
    /// The storage engine
    storage: StorageEngine,
    /// Durability log, absent when persistence is disabled
    aof: Option<AppendOnlyLog>,
    /// Counters reported by INFO
    stats: ServerStats,
    /// Source of `now` for every deadline
    clock: MonotonicClock,
}

impl CommandHandler {
    /// Creates a handler without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler that appends writes to `aof`.
    pub fn with_aof(aof: AppendOnlyLog) -> Self {
        Self {
            aof: Some(aof),
            ..Self::default()
        }
    }

    /// Executes a command and returns the response.
    ///
    /// # Arguments
    ///
    /// * `frame` - The parsed request
    ///
    /// # Returns
    ///
    /// The RESP response to send back to the client.
    pub fn execute(&mut self, frame: Frame) -> RespValue {
        let now = self.clock.now_ms();
        self.execute_at(frame, now)
    }

    /// Executes a command as if the clock read `now` milliseconds.
    pub fn execute_at(&mut self, frame: Frame, now: u64) -> RespValue {
        self.stats.command_processed();

        let cmd_name = match frame.name() {
            Some(name) => name.to_ascii_uppercase(),
            None => return RespValue::error("empty command"),
        };

        self.dispatch(&cmd_name, &frame, now)
    }

    /// Dispatches a command to its handler.
    fn dispatch(&mut self, cmd: &[u8], frame: &Frame, now: u64) -> RespValue {
        match cmd {
            // Key commands
            b"SET" => self.cmd_set(frame),
            b"GET" => self.cmd_get(frame, now),
            b"DEL" => self.cmd_del(frame, now),
            b"EXISTS" => self.cmd_exists(frame, now),
            b"EXPIRE" => self.cmd_expire(frame, now),
            b"TTL" => self.cmd_ttl(frame, now),
            b"PTTL" => self.cmd_pttl(frame, now),
            b"PERSIST" => self.cmd_persist(frame, now),

            // Server commands
            b"PING" => self.cmd_ping(frame),
            b"ECHO" => self.cmd_echo(frame),
            b"DBSIZE" => self.cmd_dbsize(frame),
            b"INFO" => self.cmd_info(frame),

            // Unknown command, reported with the name the client sent
            _ => {
                let name = frame.name().map(|n| String::from_utf8_lossy(n).into_owned());
                RespValue::error(format!("unknown command '{}'", name.unwrap_or_default()))
            }
        }
    }

    /// Forwards a successful write to the log.
    fn log_write(&mut self, frame: &Frame) {
        if let Some(aof) = self.aof.as_mut() {
            aof.append(frame);
        }
    }

    // ========================================================================
    // Key Commands
    // ========================================================================

    /// SET key value
    fn cmd_set(&mut self, frame: &Frame) -> RespValue {
        let [_, key, value] = frame.args() else {
            return RespValue::error("usage: SET key value");
        };

        self.storage.set(key.clone(), value.clone());
        self.log_write(frame);
        RespValue::ok()
    }

    /// GET key
    fn cmd_get(&mut self, frame: &Frame, now: u64) -> RespValue {
        let [_, key] = frame.args() else {
            return RespValue::error("usage: GET key");
        };

        match self.storage.get(key, now) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        }
    }

    /// DEL key [key ...]
    fn cmd_del(&mut self, frame: &Frame, now: u64) -> RespValue {
        let keys = &frame.args()[1..];
        if keys.is_empty() {
            return RespValue::error("usage: DEL key [key ...]");
        }

        let deleted = self.storage.delete_many(keys, now);
        if deleted > 0 {
            self.log_write(frame);
        }
        RespValue::integer(deleted as i64)
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&mut self, frame: &Frame, now: u64) -> RespValue {
        let keys = &frame.args()[1..];
        if keys.is_empty() {
            return RespValue::error("usage: EXISTS key [key ...]");
        }

        RespValue::integer(self.storage.exists_many(keys, now) as i64)
    }

    /// EXPIRE key seconds
    fn cmd_expire(&mut self, frame: &Frame, now: u64) -> RespValue {
        let [_, key, seconds] = frame.args() else {
            return RespValue::error("usage: EXPIRE key seconds");
        };

        let seconds = match parse_integer(seconds) {
            Some(s) => s,
            None => return RespValue::error("value is not an integer or out of range"),
        };

        let deadline = match seconds
            .checked_mul(1000)
            .and_then(|ms| ms.checked_add(now as i64))
        {
            // A deadline before the clock origin is already due
            Some(deadline) => deadline.max(0) as u64,
            None => return RespValue::error("invalid expire time in 'expire' command"),
        };

        if self.storage.expire_at(key, deadline, now) {
            self.log_write(frame);
            RespValue::integer(1)
        } else {
            RespValue::integer(0)
        }
    }

    /// TTL key
    fn cmd_ttl(&mut self, frame: &Frame, now: u64) -> RespValue {
        let [_, key] = frame.args() else {
            return RespValue::error("usage: TTL key");
        };

        RespValue::integer(self.storage.ttl(key, now).unwrap_or(-2))
    }

    /// PTTL key
    fn cmd_pttl(&mut self, frame: &Frame, now: u64) -> RespValue {
        let [_, key] = frame.args() else {
            return RespValue::error("usage: PTTL key");
        };

        RespValue::integer(self.storage.pttl(key, now).unwrap_or(-2))
    }

    /// PERSIST key
    fn cmd_persist(&mut self, frame: &Frame, now: u64) -> RespValue {
        let [_, key] = frame.args() else {
            return RespValue::error("usage: PERSIST key");
        };

        if self.storage.persist(key, now) {
            self.log_write(frame);
            RespValue::integer(1)
        } else {
            RespValue::integer(0)
        }
    }

    // ========================================================================
    // Server Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&self, frame: &Frame) -> RespValue {
        match frame.args() {
            [_] => RespValue::pong(),
            [_, message] => RespValue::bulk_string(message.clone()),
            _ => RespValue::error("usage: PING [message]"),
        }
    }

    /// ECHO message
    fn cmd_echo(&self, frame: &Frame) -> RespValue {
        match frame.args() {
            [_, message] => RespValue::bulk_string(message.clone()),
            _ => RespValue::error("wrong number of arguments for 'ECHO'"),
        }
    }

    /// DBSIZE
    fn cmd_dbsize(&self, frame: &Frame) -> RespValue {
        if frame.len() != 1 {
            return RespValue::error("usage: DBSIZE");
        }
        RespValue::integer(self.storage.len() as i64)
    }

    /// INFO
    fn cmd_info(&self, frame: &Frame) -> RespValue {
        if frame.len() != 1 {
            return RespValue::error("usage: INFO");
        }

        let stats = self.storage.stats();
        let mut info = String::with_capacity(128);
        let fields = [
            ("uptime", self.stats.uptime_secs()),
            ("connected_clients", self.stats.active_connections),
            ("keys", stats.keys),
            ("total_commands", self.stats.commands_processed),
            ("expired_keys", stats.expired),
            ("aof_bytes", self.aof_bytes()),
        ];
        for (name, value) in fields {
            // Writing into a String cannot fail
            let _ = writeln!(info, "{}:{}", name, value);
        }

        RespValue::bulk_string(Bytes::from(info))
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Runs one proactive expiry pass with at most `budget` evictions.
    pub fn sweep(&mut self, budget: usize) -> SweepStats {
        let now = self.clock.now_ms();
        self.storage.sweep(now, budget)
    }

    /// Gives the durability log its periodic flush/fsync opportunity.
    pub fn tick_aof(&mut self, now: Instant) {
        if let Some(aof) = self.aof.as_mut() {
            aof.tick(now);
        }
    }

    /// Rebuilds the keyspace from the durability log.
    ///
    /// Must run before any client is served. Without a log this is a no-op.
    /// An unreadable tail is truncated away before appends resume.
    ///
    /// `EXPIRE` is logged with its relative argument, so a replayed key gets
    /// its full TTL again counted from replay time.
    pub fn replay_aof(&mut self) -> Result<ReplaySummary, AofError> {
        let data = match self.aof.as_mut() {
            Some(aof) => {
                let data = aof.read_all()?;
                aof.begin_replay();
                data
            }
            None => return Ok(ReplaySummary::default()),
        };

        let summary = replay_frames(&data, |frame| {
            self.execute(frame);
        });

        if let Some(aof) = self.aof.as_mut() {
            aof.end_replay()?;
            if summary.bytes_ignored > 0 {
                aof.truncate(summary.bytes_consumed)?;
            }
        }

        info!(
            frames = summary.frames,
            bytes = summary.bytes_consumed,
            ignored = summary.bytes_ignored,
            "append-only file replayed"
        );
        Ok(summary)
    }

    /// Bytes in the durability log, 0 when persistence is disabled.
    pub fn aof_bytes(&self) -> u64 {
        self.aof.as_ref().map_or(0, AppendOnlyLog::bytes)
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut ServerStats {
        &mut self.stats
    }

    pub fn aof_mut(&mut self) -> Option<&mut AppendOnlyLog> {
        self.aof.as_mut()
    }
}

/// Parses a base-10 signed integer argument.
fn parse_integer(arg: &Bytes) -> Option<i64> {
    std::str::from_utf8(arg).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::AofConfig;
    use tempfile::tempdir;

    fn create_handler() -> CommandHandler {
        CommandHandler::new()
    }

    fn make_command(args: &[&str]) -> Frame {
        Frame::from_strs(args)
    }

    #[test]
    fn test_ping() {
        let mut handler = create_handler();

        let response = handler.execute(make_command(&["PING"]));
        assert_eq!(response, RespValue::simple_string("PONG"));

        let response = handler.execute(make_command(&["ping", "hello"]));
        assert_eq!(response, RespValue::bulk_string(Bytes::from("hello")));

        let response = handler.execute(make_command(&["PING", "a", "b"]));
        assert_eq!(response, RespValue::error("usage: PING [message]"));
    }

    #[test]
    fn test_echo() {
        let mut handler = create_handler();

        let response = handler.execute(make_command(&["ECHO", "hi"]));
        assert_eq!(response, RespValue::bulk_string(Bytes::from("hi")));

        let response = handler.execute(make_command(&["ECHO"]));
        assert_eq!(response, RespValue::error("wrong number of arguments for 'ECHO'"));
    }

    #[test]
    fn test_set_get() {
        let mut handler = create_handler();

        let response = handler.execute(make_command(&["SET", "key", "value"]));
        assert_eq!(response, RespValue::ok());

        let response = handler.execute(make_command(&["GET", "key"]));
        assert_eq!(response, RespValue::bulk_string(Bytes::from("value")));
    }

    #[test]
    fn test_get_nonexistent() {
        let mut handler = create_handler();

        let response = handler.execute(make_command(&["GET", "nonexistent"]));
        assert_eq!(response, RespValue::null());
    }

    #[test]
    fn test_binary_values() {
        let mut handler = create_handler();
        let value = Bytes::from_static(b"\x00\r\n\xff");

        handler.execute(Frame::new(vec![
            Bytes::from("SET"),
            Bytes::from("bin"),
            value.clone(),
        ]));
        let response = handler.execute(make_command(&["GET", "bin"]));
        assert_eq!(response, RespValue::bulk_string(value));
    }

    #[test]
    fn test_arity_errors() {
        let mut handler = create_handler();

        let cases: &[(&[&str], &str)] = &[
            (&["SET", "key"], "usage: SET key value"),
            (&["SET", "k", "v", "extra"], "usage: SET key value"),
            (&["GET"], "usage: GET key"),
            (&["DEL"], "usage: DEL key [key ...]"),
            (&["EXISTS"], "usage: EXISTS key [key ...]"),
            (&["EXPIRE", "key"], "usage: EXPIRE key seconds"),
            (&["TTL"], "usage: TTL key"),
            (&["PTTL", "a", "b"], "usage: PTTL key"),
            (&["PERSIST"], "usage: PERSIST key"),
            (&["INFO", "server"], "usage: INFO"),
            (&["DBSIZE", "x"], "usage: DBSIZE"),
        ];

        for (args, message) in cases {
            assert_eq!(
                handler.execute(make_command(args)),
                RespValue::error(*message),
                "{:?}",
                args
            );
        }
        assert_eq!(handler.stats().commands_processed, cases.len() as u64);
    }

    #[test]
    fn test_unknown_and_empty_command() {
        let mut handler = create_handler();

        let response = handler.execute(make_command(&["FlushAll"]));
        assert_eq!(response, RespValue::error("unknown command 'FlushAll'"));

        let response = handler.execute(Frame::new(Vec::new()));
        assert_eq!(response, RespValue::error("empty command"));
        assert_eq!(handler.stats().commands_processed, 2);
    }

    #[test]
    fn test_del_and_exists() {
        let mut handler = create_handler();

        handler.execute(make_command(&["SET", "key1", "value1"]));
        handler.execute(make_command(&["SET", "key2", "value2"]));

        let response = handler.execute(make_command(&["EXISTS", "key1", "key1", "key3"]));
        assert_eq!(response, RespValue::integer(2));

        let response = handler.execute(make_command(&["DEL", "key1", "key2", "key3"]));
        assert_eq!(response, RespValue::integer(2));

        let response = handler.execute(make_command(&["GET", "key1"]));
        assert_eq!(response, RespValue::null());
    }

    #[test]
    fn test_expire_and_ttl() {
        let mut handler = create_handler();
        handler.execute_at(make_command(&["SET", "key", "value"]), 0);

        // No expiry yet
        let response = handler.execute_at(make_command(&["TTL", "key"]), 0);
        assert_eq!(response, RespValue::integer(-1));

        let response = handler.execute_at(make_command(&["EXPIRE", "key", "100"]), 0);
        assert_eq!(response, RespValue::integer(1));

        let response = handler.execute_at(make_command(&["TTL", "key"]), 500);
        assert_eq!(response, RespValue::integer(99));

        let response = handler.execute_at(make_command(&["PTTL", "key"]), 500);
        assert_eq!(response, RespValue::integer(99_500));

        // Missing key
        let response = handler.execute_at(make_command(&["TTL", "missing"]), 0);
        assert_eq!(response, RespValue::integer(-2));
        let response = handler.execute_at(make_command(&["EXPIRE", "missing", "10"]), 0);
        assert_eq!(response, RespValue::integer(0));
    }

    #[test]
    fn test_expire_zero_removes_key() {
        let mut handler = create_handler();
        handler.execute_at(make_command(&["SET", "key", "value"]), 0);

        let response = handler.execute_at(make_command(&["EXPIRE", "key", "0"]), 0);
        assert_eq!(response, RespValue::integer(1));

        assert_eq!(
            handler.execute_at(make_command(&["TTL", "key"]), 0),
            RespValue::integer(-2)
        );
        assert_eq!(
            handler.execute_at(make_command(&["GET", "key"]), 0),
            RespValue::null()
        );
        assert_eq!(handler.storage().stats().expired, 1);
    }

    #[test]
    fn test_expire_negative_seconds() {
        let mut handler = create_handler();
        handler.execute_at(make_command(&["SET", "key", "value"]), 10);

        let response = handler.execute_at(make_command(&["EXPIRE", "key", "-5"]), 10);
        assert_eq!(response, RespValue::integer(1));
        assert_eq!(
            handler.execute_at(make_command(&["EXISTS", "key"]), 10),
            RespValue::integer(0)
        );
    }

    #[test]
    fn test_expire_invalid_argument_leaves_key() {
        let mut handler = create_handler();
        handler.execute_at(make_command(&["SET", "key", "value"]), 0);

        let response = handler.execute_at(make_command(&["EXPIRE", "key", "soon"]), 0);
        assert_eq!(response, RespValue::error("value is not an integer or out of range"));

        let response = handler.execute_at(
            make_command(&["EXPIRE", "key", "9223372036854775807"]),
            0,
        );
        assert_eq!(response, RespValue::error("invalid expire time in 'expire' command"));

        assert_eq!(
            handler.execute_at(make_command(&["TTL", "key"]), 0),
            RespValue::integer(-1)
        );
    }

    #[test]
    fn test_persist() {
        let mut handler = create_handler();
        handler.execute_at(make_command(&["SET", "key", "value"]), 0);

        let response = handler.execute_at(make_command(&["PERSIST", "key"]), 0);
        assert_eq!(response, RespValue::integer(0));

        handler.execute_at(make_command(&["EXPIRE", "key", "10"]), 0);
        let response = handler.execute_at(make_command(&["PERSIST", "key"]), 0);
        assert_eq!(response, RespValue::integer(1));

        let response = handler.execute_at(make_command(&["TTL", "key"]), 60_000);
        assert_eq!(response, RespValue::integer(-1));
    }

    #[test]
    fn test_dbsize_and_info() {
        let mut handler = create_handler();
        handler.execute(make_command(&["SET", "a", "1"]));
        handler.execute(make_command(&["SET", "b", "2"]));
        handler.stats_mut().connection_opened();

        assert_eq!(
            handler.execute(make_command(&["DBSIZE"])),
            RespValue::integer(2)
        );

        let response = handler.execute(make_command(&["INFO"]));
        let body = String::from_utf8(response.as_bytes().unwrap().to_vec()).unwrap();
        let names: Vec<&str> = body
            .lines()
            .map(|line| line.split(':').next().unwrap())
            .collect();

        assert_eq!(
            names,
            [
                "uptime",
                "connected_clients",
                "keys",
                "total_commands",
                "expired_keys",
                "aof_bytes"
            ]
        );
        assert!(body.contains("connected_clients:1\n"));
        assert!(body.contains("keys:2\n"));
        assert!(body.contains("total_commands:4\n"));
        assert!(body.contains("aof_bytes:0\n"));
    }

    #[test]
    fn test_sweep_counts_expired() {
        let mut handler = create_handler();
        for key in ["a", "b", "c"] {
            handler.execute_at(make_command(&["SET", key, "v"]), 0);
            handler.execute_at(make_command(&["EXPIRE", key, "0"]), 0);
        }

        let stats = handler.sweep(200);
        assert_eq!(stats.evicted, 3);
        assert_eq!(handler.storage().stats().expired, 3);
        assert!(handler.storage().is_empty());
    }

    #[test]
    fn test_writes_are_logged_and_replayed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("handler.aof");

        {
            let aof = AppendOnlyLog::open(&path, AofConfig::default()).unwrap();
            let mut handler = CommandHandler::with_aof(aof);

            handler.execute(make_command(&["SET", "a", "1"]));
            handler.execute(make_command(&["SET", "b", "2"]));
            handler.execute(make_command(&["SET", "c", "3"]));
            handler.execute(make_command(&["DEL", "b", "nope"]));
            // Neither of these changes state, so neither is logged
            handler.execute(make_command(&["DEL", "nope"]));
            handler.execute(make_command(&["PERSIST", "a"]));
            handler.execute(make_command(&["GET", "a"]));
            handler.execute(make_command(&["EXPIRE", "c", "3600"]));

            let expected: u64 = [
                make_command(&["SET", "a", "1"]),
                make_command(&["SET", "b", "2"]),
                make_command(&["SET", "c", "3"]),
                make_command(&["DEL", "b", "nope"]),
                make_command(&["EXPIRE", "c", "3600"]),
            ]
            .iter()
            .map(|f| f.encoded_len() as u64)
            .sum();
            assert_eq!(handler.aof_bytes(), expected);

            handler.aof_mut().unwrap().flush().unwrap();
        }

        let aof = AppendOnlyLog::open(&path, AofConfig::default()).unwrap();
        let bytes_before = aof.bytes();
        let mut handler = CommandHandler::with_aof(aof);
        let summary = handler.replay_aof().unwrap();

        assert_eq!(summary.frames, 5);
        assert_eq!(summary.bytes_ignored, 0);
        assert_eq!(handler.aof_bytes(), bytes_before);
        assert_eq!(handler.stats().commands_processed, 5);

        assert_eq!(
            handler.execute(make_command(&["GET", "a"])),
            RespValue::bulk_string(Bytes::from("1"))
        );
        assert_eq!(
            handler.execute(make_command(&["GET", "b"])),
            RespValue::null()
        );
        let ttl = handler
            .execute(make_command(&["TTL", "c"]))
            .as_integer()
            .unwrap();
        assert!((3590..=3600).contains(&ttl));
    }

    #[test]
    fn test_writes_after_torn_tail_survive_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.aof");
        let mut data = make_command(&["SET", "a", "1"]).encode();
        data.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$1\r\nx");
        std::fs::write(&path, &data).unwrap();

        {
            let aof = AppendOnlyLog::open(&path, AofConfig::default()).unwrap();
            let mut handler = CommandHandler::with_aof(aof);
            let summary = handler.replay_aof().unwrap();
            assert_eq!(summary.frames, 1);
            assert!(summary.bytes_ignored > 0);

            handler.execute(make_command(&["SET", "b", "2"]));
            handler.aof_mut().unwrap().flush().unwrap();
        }

        let aof = AppendOnlyLog::open(&path, AofConfig::default()).unwrap();
        let mut handler = CommandHandler::with_aof(aof);
        let summary = handler.replay_aof().unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.bytes_ignored, 0);
        assert_eq!(
            handler.execute(make_command(&["GET", "a"])),
            RespValue::bulk_string(Bytes::from("1"))
        );
        assert_eq!(
            handler.execute(make_command(&["GET", "b"])),
            RespValue::bulk_string(Bytes::from("2"))
        );
    }

    #[test]
    fn test_failed_replay_keeps_logging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wo.aof");

        // A write-only handle cannot be read back
        let file = std::fs::File::create(&path).unwrap();
        let aof = AppendOnlyLog::from_file(file, path.clone(), AofConfig::default()).unwrap();
        let mut handler = CommandHandler::with_aof(aof);

        assert!(handler.replay_aof().is_err());
        assert!(!handler.aof_mut().unwrap().is_replaying());

        handler.execute(make_command(&["SET", "k", "v"]));
        assert_eq!(
            handler.aof_bytes(),
            make_command(&["SET", "k", "v"]).encoded_len() as u64
        );
    }

    #[test]
    fn test_replay_without_aof_is_noop() {
        let mut handler = create_handler();
        assert_eq!(handler.replay_aof().unwrap(), ReplaySummary::default());
        handler.tick_aof(Instant::now());
        assert_eq!(handler.aof_bytes(), 0);
    }
}
