mod delta_snapshot;
mod error;
mod local_snapshot;
mod reliable_changes;
mod remote_snapshot;
mod replica;
mod snapshot_id;
mod snapshot_receiver;
mod snapshot_sender;
mod stats;

pub use delta_snapshot::{DeltaSnapshot, SnapshotAck};
pub use error::ReplicationError;
pub use local_snapshot::LocalSnapshotState;
pub use reliable_changes::ReliableChangeTracker;
pub use remote_snapshot::{AckedSlot, RemoteSnapshotState, SentSnapshot};
pub use replica::{Replica, SnapshotOutcome};
pub use snapshot_id::SnapshotId;
pub use snapshot_receiver::SnapshotReceiver;
pub use snapshot_sender::{AckOutcome, SnapshotSender, SyncState};
pub use stats::ReplicationStats;
