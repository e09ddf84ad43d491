//! Server Statistics
//!
//! Passive counters updated by the event loop and the command handler and
//! read back by `INFO`. Everything runs on the loop thread, so these are plain
//! integers rather than atomics.

use crate::storage::MonotonicClock;

/// Statistics for the running server.
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Total number of connections accepted
    pub connections_accepted: u64,
    /// Currently open connections
    pub active_connections: u64,
    /// Total commands processed, replayed ones included
    pub commands_processed: u64,
    /// Total bytes read from clients
    pub bytes_read: u64,
    /// Total bytes written to clients
    pub bytes_written: u64,
    /// Connections closed because of a malformed request
    pub protocol_errors: u64,
    started_at: MonotonicClock,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&mut self) {
        self.connections_accepted += 1;
        self.active_connections += 1;
    }

    pub fn connection_closed(&mut self) {
        self.active_connections = self.active_connections.saturating_sub(1);
    }

    pub fn command_processed(&mut self) {
        self.commands_processed += 1;
    }

    pub fn bytes_read(&mut self, count: usize) {
        self.bytes_read += count as u64;
    }

    pub fn bytes_written(&mut self, count: usize) {
        self.bytes_written += count as u64;
    }

    pub fn protocol_error(&mut self) {
        self.protocol_errors += 1;
    }

    /// Whole seconds since the stats were created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.uptime_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counters() {
        let mut stats = ServerStats::new();
        stats.connection_opened();
        stats.connection_opened();
        stats.connection_closed();

        assert_eq!(stats.connections_accepted, 2);
        assert_eq!(stats.active_connections, 1);

        stats.connection_closed();
        stats.connection_closed();
        assert_eq!(stats.active_connections, 0);
    }

    #[test]
    fn test_byte_counters() {
        let mut stats = ServerStats::new();
        stats.bytes_read(10);
        stats.bytes_read(5);
        stats.bytes_written(7);
        assert_eq!(stats.bytes_read, 15);
        assert_eq!(stats.bytes_written, 7);
        assert_eq!(stats.uptime_secs(), 0);
    }
}
