/// Tests for the delta snapshot round trip between one host and one client
/// Covers baselines, acknowledgment of changed values and out-of-date acks

use skein_shared::{AckOutcome, SnapshotId, SnapshotOutcome, SyncState};
use skein_test::{
    sample_object::{AGILITY, EMOTE, HEALTH, NAME, STRENGTH},
    Player, Session,
};

fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

#[test]
fn first_send_is_a_baseline_of_authored_slots() {
    init_logging();
    let mut session = Session::new(Player::new(100, "bob"));
    assert_eq!(session.sync_state(), SyncState::Unknown);

    let baseline = session.host_send().unwrap();

    assert_eq!(baseline.snapshot_id, SnapshotId::new(1));
    let slots: Vec<_> = baseline.slots.keys().copied().collect();
    let mut expected = vec![HEALTH, NAME, STRENGTH, AGILITY];
    expected.sort();
    assert_eq!(slots, expected);
    assert!(!baseline.contains(&EMOTE));
    assert_eq!(session.sync_state(), SyncState::Partial);
}

#[test]
fn acknowledged_baseline_is_synced() {
    init_logging();
    let mut session = Session::new(Player::new(100, "bob"));

    session.host_send().unwrap();
    let outcomes = session.client_receive();
    assert!(matches!(outcomes[..], [SnapshotOutcome::Applied { .. }]));

    let acks = session.host_receive_acks();
    assert_eq!(
        acks,
        vec![AckOutcome::Acknowledged {
            acknowledged: 4,
            pending: 0,
            synced: true,
        }]
    );
    assert_eq!(session.sync_state(), SyncState::Synced);
    assert!(session.is_converged());

    // nothing changed, nothing to send
    assert!(session.host_send().is_none());
    assert_eq!(session.host.stats().baselines_sent, 1);
    assert_eq!(session.host.stats().deltas_sent, 0);
}

#[test]
fn ack_for_an_overwritten_value_leaves_the_slot_pending() {
    init_logging();
    let mut session = Session::new(Player::new(100, "bob"));
    session.tick();
    assert_eq!(session.sync_state(), SyncState::Synced);

    // health 90 is sent but held back by the link
    session.edit_host(|player| player.health = 90);
    let ninety = session.host_send().unwrap();
    assert_eq!(ninety.slots.keys().copied().collect::<Vec<_>>(), vec![HEALTH]);
    let held = session.link.to_client.drain();

    // health 80 is sent and lost
    session.edit_host(|player| player.health = 80);
    session.link.to_client.drop_next();
    let eighty = session.host_send().unwrap();
    assert_eq!(eighty.slots[&HEALTH], 80u32.to_le_bytes().to_vec());

    // the late 90 arrives and is acknowledged
    session.link.to_client.redeliver(held);
    session.client_receive();
    assert_eq!(session.client_player.read().unwrap().health, 90);
    let acks = session.host_receive_acks();
    assert_eq!(
        acks,
        vec![AckOutcome::Acknowledged {
            acknowledged: 0,
            pending: 1,
            synced: false,
        }]
    );
    assert_eq!(session.sync_state(), SyncState::Partial);

    // the next send carries 80 again, and only health
    let resent = session.host_send().unwrap();
    assert_eq!(resent.slots.len(), 1);
    assert_eq!(resent.slots[&HEALTH], 80u32.to_le_bytes().to_vec());
    session.client_receive();
    session.host_receive_acks();

    assert_eq!(session.sync_state(), SyncState::Synced);
    assert_eq!(session.client_player.read().unwrap().health, 80);
}

#[test]
fn value_that_returns_to_an_acknowledged_value_is_resent() {
    let mut session = Session::new(Player::new(100, "bob"));
    session.tick();

    session.edit_host(|player| player.health = 50);
    session.host_send().unwrap();
    session.client_receive();
    // the ack for 50 is lost
    session.link.to_host.drain();
    assert_eq!(session.client_player.read().unwrap().health, 50);

    session.edit_host(|player| player.health = 100);
    let snapshot = session.host_send().unwrap();
    assert!(snapshot.contains(&HEALTH));
    session.client_receive();
    session.host_receive_acks();

    assert!(session.is_converged());
    assert_eq!(session.sync_state(), SyncState::Synced);
}

#[test]
fn unknown_acks_are_ignored() {
    let mut session = Session::new(Player::new(1, "a"));
    session.tick();

    assert_eq!(
        session
            .host
            .on_snapshot_ack(skein_test::CLIENT_CONNECTION, SnapshotId::new(40)),
        AckOutcome::UnknownSnapshot
    );
    assert_eq!(
        session
            .host
            .on_snapshot_ack(skein_shared::ConnectionId::new(999), SnapshotId::new(1)),
        AckOutcome::UnknownConnection
    );
    assert_eq!(session.sync_state(), SyncState::Synced);
}

#[test]
fn removed_connection_starts_over_with_a_baseline() {
    let mut session = Session::new(Player::new(1, "a"));
    session.tick();
    assert_eq!(session.host.connections(), vec![skein_test::CLIENT_CONNECTION]);

    assert!(session.host.remove_connection(&skein_test::CLIENT_CONNECTION));
    assert!(session.host.connections().is_empty());
    assert_eq!(session.sync_state(), SyncState::Unknown);

    let baseline = session.host_send().unwrap();
    assert_eq!(baseline.len(), 4);
    assert_eq!(session.host.stats().baselines_sent, 2);
}
