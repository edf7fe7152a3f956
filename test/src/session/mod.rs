//! One host and one client replicating a single Player over a LoopbackLink

use skein_serde::{BufferPool, ReadBuffer};
use skein_shared::{
    AckOutcome, ConnectionId, DeltaSnapshot, ObjectId, Peer, Replica, Role, SnapshotAck,
    SnapshotId, SnapshotOutcome, SyncState,
};

use crate::{
    loopback::LoopbackLink,
    sample_object::{player_schema, Player, SharedPlayer},
};

pub const PLAYER_OBJECT: ObjectId = ObjectId::new(7);
/// How the host addresses the client
pub const CLIENT_CONNECTION: ConnectionId = ConnectionId::new(1);
/// How the client addresses the host
pub const HOST_CONNECTION: ConnectionId = ConnectionId::new(100);

pub struct Session {
    pub host: Replica,
    pub client: Replica,
    pub host_player: SharedPlayer,
    pub client_player: SharedPlayer,
    pub link: LoopbackLink,
    pool: BufferPool,
}

impl Session {
    /// The host starts with `player`; the client starts with a default Player
    pub fn new(player: Player) -> Self {
        Self::with_link(player, LoopbackLink::new())
    }

    pub fn with_link(player: Player, link: LoopbackLink) -> Self {
        let pool = BufferPool::default();

        let host_player = player.shared();
        let mut host = Replica::new(PLAYER_OBJECT, Role::Host, pool.clone());
        host.rebuild(player_schema(&host_player)).unwrap();

        let client_player = Player::default().shared();
        let mut client = Replica::new(PLAYER_OBJECT, Role::Client, pool.clone());
        client.rebuild(player_schema(&client_player)).unwrap();

        Self {
            host,
            client,
            host_player,
            client_player,
            link,
            pool,
        }
    }

    pub fn edit_host(&self, edit: impl FnOnce(&mut Player)) {
        let mut player = self.host_player.write().unwrap();
        edit(&mut *player);
    }

    /// Write the client's snapshot and put it on the link, if there is one
    pub fn host_send(&mut self) -> Option<DeltaSnapshot> {
        let snapshot = self.host.write_snapshot_state(CLIENT_CONNECTION).unwrap()?;
        self.link
            .to_client
            .send(snapshot.encode(&self.pool).unwrap());
        Some(snapshot)
    }

    /// Apply every snapshot that reached the client and send back the acks
    pub fn client_receive(&mut self) -> Vec<SnapshotOutcome> {
        let host = Peer::host(HOST_CONNECTION);
        let mut outcomes = Vec::new();
        for bytes in self.link.to_client.drain() {
            let outcome = self.client.on_snapshot_bytes(&host, &bytes);
            if let Some(ack) = outcome.ack() {
                let mut writer = self.pool.acquire(16);
                writer.write(&ack).unwrap();
                self.link.to_host.send(writer.to_bytes());
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn host_receive_acks(&mut self) -> Vec<AckOutcome> {
        let mut outcomes = Vec::new();
        for bytes in self.link.to_host.drain() {
            let ack: SnapshotAck = ReadBuffer::new(&bytes).read().unwrap();
            assert_eq!(ack.object, PLAYER_OBJECT);
            outcomes.push(self.host.on_snapshot_ack(CLIENT_CONNECTION, ack.snapshot_id));
        }
        outcomes
    }

    /// One full round trip. Returns the id of the snapshot sent, if any.
    pub fn tick(&mut self) -> Option<SnapshotId> {
        let sent = self.host_send().map(|snapshot| snapshot.snapshot_id);
        self.client_receive();
        self.host_receive_acks();
        self.link.advance();
        sent
    }

    pub fn sync_state(&self) -> SyncState {
        self.host.sync_state(&CLIENT_CONNECTION)
    }

    /// Whether the client holds every value the host authors
    pub fn is_converged(&self) -> bool {
        self.host_player.read().unwrap().host_view() == self.client_player.read().unwrap().host_view()
    }
}
