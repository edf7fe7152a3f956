//! In-memory packet link for replication tests.
//! Carries host → client and client → host payloads without network I/O,
//! dropping or delaying whichever sends a test tells it to.

use std::collections::VecDeque;

/// Which sends on a lane should be lost, in send order.
/// Once the schedule runs out, everything is delivered.
#[derive(Clone, Debug, Default)]
pub struct DropSchedule {
    drops: VecDeque<bool>,
}

impl DropSchedule {
    pub fn new(drops: impl IntoIterator<Item = bool>) -> Self {
        Self {
            drops: drops.into_iter().collect(),
        }
    }

    fn next_is_dropped(&mut self) -> bool {
        self.drops.pop_front().unwrap_or(false)
    }
}

/// One direction of a [`LoopbackLink`]
#[derive(Default)]
pub struct Lane {
    // (tick the payload becomes receivable, payload)
    queue: VecDeque<(u64, Vec<u8>)>,
    schedule: DropSchedule,
    latency: u64,
    now: u64,
    sent: usize,
    dropped: usize,
}

impl Lane {
    pub fn send(&mut self, payload: Vec<u8>) {
        self.sent += 1;
        if self.schedule.next_is_dropped() {
            self.dropped += 1;
            return;
        }
        self.queue.push_back((self.now + self.latency, payload));
    }

    /// Drop the next send regardless of the schedule
    pub fn drop_next(&mut self) {
        self.schedule.drops.push_front(true);
    }

    pub fn receive(&mut self) -> Option<Vec<u8>> {
        match self.queue.front() {
            Some((ready_at, _)) if *ready_at <= self.now => {
                self.queue.pop_front().map(|(_, payload)| payload)
            }
            _ => None,
        }
    }

    /// Take every payload that has arrived by now, in send order
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let now = self.now;
        let (ready, waiting): (VecDeque<_>, VecDeque<_>) = self
            .queue
            .drain(..)
            .partition(|(ready_at, _)| *ready_at <= now);
        self.queue = waiting;
        ready.into_iter().map(|(_, payload)| payload).collect()
    }

    /// Put payloads taken with [`Lane::drain`] back in flight, receivable
    /// immediately but after anything already queued
    pub fn redeliver(&mut self, payloads: Vec<Vec<u8>>) {
        let now = self.now;
        self.queue
            .extend(payloads.into_iter().map(|payload| (now, payload)));
    }

    pub fn set_schedule(&mut self, schedule: DropSchedule) {
        self.schedule = schedule;
    }

    /// Hold every later send for `ticks` calls to [`Lane::advance`]
    pub fn set_latency(&mut self, ticks: u64) {
        self.latency = ticks;
    }

    pub fn advance(&mut self) {
        self.now += 1;
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Payloads not yet received, whether they have arrived or not
    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }
}

/// Pair of lanes between one host and one client
#[derive(Default)]
pub struct LoopbackLink {
    pub to_client: Lane,
    pub to_host: Lane,
}

impl LoopbackLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lossy(to_client: DropSchedule, to_host: DropSchedule) -> Self {
        let mut link = Self::new();
        link.to_client.set_schedule(to_client);
        link.to_host.set_schedule(to_host);
        link
    }

    /// Both directions take `ticks` ticks to deliver
    pub fn with_latency(ticks: u64) -> Self {
        let mut link = Self::new();
        link.to_client.set_latency(ticks);
        link.to_host.set_latency(ticks);
        link
    }

    pub fn advance(&mut self) {
        self.to_client.advance();
        self.to_host.advance();
    }
}
