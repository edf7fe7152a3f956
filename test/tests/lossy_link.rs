/// Tests for replication over a link that loses and reorders packets
/// Uses proptest to check that any run of edits and losses converges once
/// the link is clean again

use proptest::prelude::*;
use skein_shared::{SnapshotId, SnapshotOutcome, SyncState};
use skein_test::{DropSchedule, LoopbackLink, Player, Session};

#[derive(Clone, Debug)]
enum Edit {
    Health(u32),
    Name(String),
    Strength(u8),
    Agility(u8),
    Nothing,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u32..4).prop_map(Edit::Health),
        "[a-c]{0,3}".prop_map(Edit::Name),
        (0u8..3).prop_map(Edit::Strength),
        (0u8..3).prop_map(Edit::Agility),
        Just(Edit::Nothing),
    ]
}

fn apply(session: &Session, edit: &Edit) {
    session.edit_host(|player| match edit {
        Edit::Health(health) => player.health = *health,
        Edit::Name(name) => player.name = name.clone(),
        Edit::Strength(strength) => player.stats.strength = *strength,
        Edit::Agility(agility) => player.stats.agility = *agility,
        Edit::Nothing => {}
    });
}

proptest! {
    /// After any mix of edits and lost snapshots or acks, a few clean round
    /// trips bring the client to the host's values and the host to Synced
    #[test]
    fn prop_converges_after_loss(
        edits in prop::collection::vec(edit_strategy(), 1..24),
        lost_snapshots in prop::collection::vec(any::<bool>(), 0..24),
        lost_acks in prop::collection::vec(any::<bool>(), 0..24),
    ) {
        let link = LoopbackLink::lossy(DropSchedule::new(lost_snapshots), DropSchedule::new(lost_acks));
        let mut session = Session::with_link(Player::new(10, "start"), link);

        for edit in &edits {
            apply(&session, edit);
            session.tick();
        }

        session.link.to_client.set_schedule(DropSchedule::default());
        session.link.to_host.set_schedule(DropSchedule::default());
        for _ in 0..3 {
            session.tick();
        }

        prop_assert!(session.is_converged());
        prop_assert_eq!(session.sync_state(), SyncState::Synced);
        prop_assert!(session.host_send().is_none());
    }

    /// With snapshots still in flight when the next tick sends again, acks
    /// that arrive several ticks late still bring the host to Synced
    #[test]
    fn prop_converges_with_pipelined_sends(
        edits in prop::collection::vec(edit_strategy(), 1..16),
        latency in 0u64..4,
    ) {
        let mut session = Session::with_link(Player::new(10, "start"), LoopbackLink::with_latency(latency));

        for edit in &edits {
            apply(&session, edit);
            session.tick();
        }
        for _ in 0..(2 * latency + 3) {
            session.tick();
        }

        prop_assert!(session.is_converged());
        prop_assert_eq!(session.sync_state(), SyncState::Synced);
        prop_assert!(session.host_send().is_none());
    }

    /// Whatever order snapshots arrive in, the client never goes back to an
    /// older snapshot's values
    #[test]
    fn prop_reordered_snapshots_never_regress(
        healths in prop::collection::vec(0u32..1000, 2..10),
        delivery_order in any::<u64>(),
    ) {
        let mut session = Session::new(Player::new(5000, "order"));
        session.tick();

        let mut held = Vec::new();
        for health in &healths {
            session.edit_host(|player| player.health = *health);
            if session.host_send().is_some() {
                held.extend(session.link.to_client.drain());
            }
        }

        // deterministic shuffle from the generated seed
        let mut order: Vec<usize> = (0..held.len()).collect();
        let mut seed = delivery_order;
        for index in (1..order.len()).rev() {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            order.swap(index, (seed >> 33) as usize % (index + 1));
        }

        let mut newest_applied: Option<SnapshotId> = None;
        let host = skein_shared::Peer::host(skein_test::HOST_CONNECTION);
        for index in order {
            let outcome = session.client.on_snapshot_bytes(&host, &held[index]);
            match outcome {
                SnapshotOutcome::Applied { ack, .. } => {
                    if let Some(newest) = newest_applied {
                        prop_assert!(ack.snapshot_id.is_newer_than(&newest));
                    }
                    newest_applied = Some(ack.snapshot_id);
                }
                SnapshotOutcome::Stale { snapshot_id, last_applied } => {
                    prop_assert!(!snapshot_id.is_newer_than(&last_applied));
                }
                other => prop_assert!(false, "unexpected outcome {:?}", other),
            }
        }
    }
}

#[test]
fn late_snapshot_is_discarded() {
    let mut session = Session::new(Player::new(100, "bob"));
    session.tick();

    session.edit_host(|player| player.health = 50);
    session.host_send().unwrap();
    let late = session.link.to_client.drain();

    session.edit_host(|player| player.health = 40);
    session.host_send().unwrap();
    session.link.to_client.redeliver(late);

    let outcomes = session.client_receive();
    assert!(matches!(outcomes[0], SnapshotOutcome::Applied { .. }));
    assert_eq!(
        outcomes[1],
        SnapshotOutcome::Stale {
            snapshot_id: SnapshotId::new(2),
            last_applied: SnapshotId::new(3),
        }
    );
    assert_eq!(session.client_player.read().unwrap().health, 40);
    assert_eq!(session.client.stats().stale_discarded, 1);

    // only the applied snapshot was acknowledged
    session.host_receive_acks();
    assert_eq!(session.sync_state(), SyncState::Synced);
}

#[test]
fn duplicate_snapshot_is_discarded() {
    let mut session = Session::new(Player::new(100, "bob"));
    let baseline = session.host_send().unwrap();
    let bytes = session.link.to_client.drain();
    session.link.to_client.redeliver(bytes.clone());
    session.link.to_client.redeliver(bytes);

    let outcomes = session.client_receive();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].applied().is_some());
    assert_eq!(
        outcomes[1],
        SnapshotOutcome::Stale {
            snapshot_id: baseline.snapshot_id,
            last_applied: baseline.snapshot_id,
        }
    );
}

#[test]
fn truncated_snapshot_is_dropped_without_applying() {
    let mut session = Session::new(Player::new(100, "bob"));
    session.host_send().unwrap();
    let mut bytes = session.link.to_client.drain().remove(0);
    bytes.truncate(bytes.len() - 3);
    session.link.to_client.redeliver(vec![bytes]);

    let outcomes = session.client_receive();
    assert!(matches!(outcomes[..], [SnapshotOutcome::Malformed(_)]));
    assert_eq!(session.client_player.read().unwrap().health, 0);
    assert_eq!(session.client.stats().truncated_dropped, 1);
    assert_eq!(session.link.to_host.in_flight(), 0);
}

#[test]
fn late_acks_settle_while_resends_are_in_flight() {
    let mut session = Session::with_link(Player::new(100, "bob"), LoopbackLink::with_latency(1));

    let sent: Vec<Option<SnapshotId>> = (0..6).map(|_| session.tick()).collect();

    // the baseline goes out twice more before its ack arrives, then nothing
    assert_eq!(
        sent,
        vec![
            Some(SnapshotId::new(1)),
            Some(SnapshotId::new(2)),
            Some(SnapshotId::new(3)),
            None,
            None,
            None,
        ]
    );
    assert_eq!(session.sync_state(), SyncState::Synced);
    assert!(session.is_converged());

    session.edit_host(|player| player.health = 60);
    let sent: Vec<Option<SnapshotId>> = (0..6).map(|_| session.tick()).collect();
    assert_eq!(sent.iter().flatten().count(), 3);
    assert_eq!(session.sync_state(), SyncState::Synced);
    assert_eq!(session.client_player.read().unwrap().health, 60);
    assert_eq!(session.host.stats().deltas_sent, 5);
}
