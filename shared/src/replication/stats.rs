use crate::property::ReadReport;

/// Running counters of what a replica has sent, received and dropped
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplicationStats {
    pub baselines_sent: u64,
    pub deltas_sent: u64,
    pub slots_sent: u64,
    pub acks_applied: u64,
    pub snapshots_applied: u64,
    pub stale_discarded: u64,
    pub truncated_dropped: u64,
    pub apply_failures: u64,
    pub unknown_buffered: u64,
    /// Inbound values refused because this party controls the slot, or
    /// snapshots refused because the sender is not the authority
    pub unauthorized: u64,
}

impl ReplicationStats {
    /// Add another replica's counters to these, for per-session totals
    pub fn merge(&mut self, other: &ReplicationStats) {
        self.baselines_sent += other.baselines_sent;
        self.deltas_sent += other.deltas_sent;
        self.slots_sent += other.slots_sent;
        self.acks_applied += other.acks_applied;
        self.snapshots_applied += other.snapshots_applied;
        self.stale_discarded += other.stale_discarded;
        self.truncated_dropped += other.truncated_dropped;
        self.apply_failures += other.apply_failures;
        self.unknown_buffered += other.unknown_buffered;
        self.unauthorized += other.unauthorized;
    }

    pub(crate) fn count_read(&mut self, report: &ReadReport) {
        self.apply_failures += report.failed.len() as u64;
        self.unknown_buffered += report.buffered.len() as u64;
        self.unauthorized += report.rejected.len() as u64;
    }
}
