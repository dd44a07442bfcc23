//! BLE link boundary
//!
//! The BLE stack is driven through [`LinkServer`]; its connect, disconnect
//! and write callbacks push [`LinkEvent`]s into an [`EventQueue`] that the
//! main loop drains one event per step.

use std::sync::mpsc;

use log::*;

use crate::error::LinkError;

/// Trait for BLE GATT server implementations
///
/// MCU-specific crates implement this trait using their BLE stack.
pub trait LinkServer {
    /// Start advertising. Must be a no-op when already advertising.
    fn start_advertising(&mut self) -> Result<(), LinkError>;

    /// Stop advertising. Must be a no-op when not advertising.
    fn stop_advertising(&mut self) -> Result<(), LinkError>;

    /// Update the data characteristic value
    fn set_characteristic_value(&mut self, value: &[u8]) -> Result<(), LinkError>;

    /// Push the current characteristic value to the subscribed peer
    fn notify(&mut self) -> Result<(), LinkError>;
}

/// A write received on the data characteristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    /// Milliseconds since boot when the stack delivered the write
    pub received_at_ms: u64,
}

/// Event delivered by the BLE stack to the main loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    PeerConnected,
    PeerDisconnected,
    Write(InboundMessage),
}

/// Create a connected sender/queue pair
pub fn channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Handle given to BLE callbacks. Cheap to clone, safe to call from the
/// BLE host task.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<LinkEvent>,
}

impl EventSender {
    pub fn peer_connected(&self) {
        self.push(LinkEvent::PeerConnected);
    }

    pub fn peer_disconnected(&self) {
        self.push(LinkEvent::PeerDisconnected);
    }

    pub fn write(&self, payload: Vec<u8>, received_at_ms: u64) {
        self.push(LinkEvent::Write(InboundMessage {
            payload,
            received_at_ms,
        }));
    }

    fn push(&self, event: LinkEvent) {
        if self.tx.send(event).is_err() {
            warn!("event queue closed, dropping link event");
        }
    }
}

/// Main-loop side of the event channel, in arrival order
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::Receiver<LinkEvent>,
}

impl EventQueue {
    /// Next pending event, if any (non-blocking)
    pub fn try_next(&self) -> Option<LinkEvent> {
        self.rx.try_recv().ok()
    }
}

/// In-memory link for host-side runs and tests
///
/// Tracks what a real stack would observe: advertising registrations,
/// characteristic value and notifications sent. Can be told to fail.
#[derive(Debug, Default)]
pub struct SimLink {
    advertising: bool,
    advertise_starts: usize,
    value: Vec<u8>,
    notified: Vec<Vec<u8>>,
    advertise_failures_left: u32,
    notify_failing: bool,
}

impl SimLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` advertise attempts fail
    pub fn fail_next_advertise(&mut self, count: u32) {
        self.advertise_failures_left = count;
    }

    /// Make notifications fail (peer not subscribed, buffer full)
    pub fn set_notify_failing(&mut self, failing: bool) {
        self.notify_failing = failing;
    }

    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// Number of times advertising was actually (re)registered
    pub fn advertise_starts(&self) -> usize {
        self.advertise_starts
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Every value pushed to the peer, oldest first
    pub fn notifications(&self) -> &[Vec<u8>] {
        &self.notified
    }
}

impl LinkServer for SimLink {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        if self.advertise_failures_left > 0 {
            self.advertise_failures_left -= 1;
            return Err(LinkError::AdvertiseFailed("radio busy".to_string()));
        }
        if !self.advertising {
            self.advertising = true;
            self.advertise_starts += 1;
        }
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), LinkError> {
        self.advertising = false;
        Ok(())
    }

    fn set_characteristic_value(&mut self, value: &[u8]) -> Result<(), LinkError> {
        self.value = value.to_vec();
        Ok(())
    }

    fn notify(&mut self) -> Result<(), LinkError> {
        if self.notify_failing {
            return Err(LinkError::NotifyFailed("peer not subscribed".to_string()));
        }
        self.notified.push(self.value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (tx, queue) = channel();
        tx.peer_connected();
        tx.write(b"hi".to_vec(), 10);
        tx.peer_disconnected();

        assert_eq!(queue.try_next(), Some(LinkEvent::PeerConnected));
        assert_eq!(
            queue.try_next(),
            Some(LinkEvent::Write(InboundMessage {
                payload: b"hi".to_vec(),
                received_at_ms: 10,
            }))
        );
        assert_eq!(queue.try_next(), Some(LinkEvent::PeerDisconnected));
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn sender_outlives_queue() {
        let (tx, queue) = channel();
        drop(queue);
        // must not panic
        tx.peer_connected();
    }

    #[test]
    fn sim_link_advertise_is_idempotent() {
        let mut link = SimLink::new();
        link.start_advertising().unwrap();
        link.start_advertising().unwrap();
        assert!(link.is_advertising());
        assert_eq!(link.advertise_starts(), 1);

        link.stop_advertising().unwrap();
        link.stop_advertising().unwrap();
        assert!(!link.is_advertising());
    }

    #[test]
    fn sim_link_scripted_failures() {
        let mut link = SimLink::new();
        link.fail_next_advertise(1);
        assert!(matches!(
            link.start_advertising(),
            Err(LinkError::AdvertiseFailed(_))
        ));
        assert!(link.start_advertising().is_ok());

        link.set_notify_failing(true);
        link.set_characteristic_value(b"x").unwrap();
        assert!(link.notify().is_err());
        assert!(link.notifications().is_empty());
    }
}
