//! Presentation boundary
//!
//! The core emits discrete events; rendering them (display, serial) is
//! the board crate's job.

use std::fmt;

use log::*;

/// Operator-facing status line. Each failure has its own text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Starting,
    InitRsa,
    RsaEnabled,
    RsaDisabled,
    NoKey,
    MalformedKey,
    StorageUnavailable,
    Advertising,
    Ready,
    AdvertiseFailed,
    AdvertisingRestarted,
    Connected,
    Disconnected,
    DecryptFailed,
    Messages(u32),
    /// Seconds since boot, shown while waiting for a peer
    Uptime(u64),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Starting => f.write_str("Starting..."),
            Status::InitRsa => f.write_str("Init RSA..."),
            Status::RsaEnabled => f.write_str("RSA: Enabled"),
            Status::RsaDisabled => f.write_str("RSA: Disabled"),
            Status::NoKey => f.write_str("No key present"),
            Status::MalformedKey => f.write_str("Malformed key"),
            Status::StorageUnavailable => f.write_str("Storage unavailable"),
            Status::Advertising => f.write_str("Advertising..."),
            Status::Ready => f.write_str("BLE Ready!"),
            Status::AdvertiseFailed => f.write_str("Advertise failed, retrying"),
            Status::AdvertisingRestarted => f.write_str("Advertising restarted"),
            Status::Connected => f.write_str("Connected!"),
            Status::Disconnected => f.write_str("Disconnected"),
            Status::DecryptFailed => f.write_str("Decrypt failed"),
            Status::Messages(count) => write!(f, "Messages: {count}"),
            Status::Uptime(secs) => write!(f, "Time: {secs}s"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    StatusChanged(Status),
    /// Payload to show (plaintext or passthrough) and running message count
    MessageReceived { bytes: Vec<u8>, count: u32 },
    DecryptFailed(String),
    ConnectionChanged(bool),
}

/// Receives presentation events, in order, on the main loop
pub trait Presenter {
    fn present(&mut self, event: PresentationEvent);

    fn status(&mut self, status: Status) {
        self.present(PresentationEvent::StatusChanged(status));
    }
}

/// Collects events; used by tests and host-side runs
impl Presenter for Vec<PresentationEvent> {
    fn present(&mut self, event: PresentationEvent) {
        self.push(event);
    }
}

/// Renders events to the log (serial console on the device)
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&mut self, event: PresentationEvent) {
        match event {
            PresentationEvent::StatusChanged(status) => info!("[status] {status}"),
            PresentationEvent::MessageReceived { bytes, count } => {
                info!(
                    "[message #{count}] {}",
                    String::from_utf8_lossy(&bytes)
                );
            }
            PresentationEvent::DecryptFailed(reason) => warn!("[decrypt failed] {reason}"),
            PresentationEvent::ConnectionChanged(true) => info!("[link] connected"),
            PresentationEvent::ConnectionChanged(false) => info!("[link] disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_statuses_are_distinct() {
        let failures = [
            Status::NoKey,
            Status::MalformedKey,
            Status::StorageUnavailable,
            Status::DecryptFailed,
            Status::AdvertiseFailed,
            Status::AdvertisingRestarted,
        ];
        let texts: std::collections::BTreeSet<String> =
            failures.iter().map(|s| s.to_string()).collect();
        assert_eq!(texts.len(), failures.len());
    }

    #[test]
    fn message_count_status() {
        assert_eq!(Status::Messages(3).to_string(), "Messages: 3");
        assert_eq!(Status::Uptime(15).to_string(), "Time: 15s");
    }

    #[test]
    fn vec_presenter_records_in_order() {
        let mut events = Vec::new();
        events.status(Status::Starting);
        events.present(PresentationEvent::ConnectionChanged(true));
        assert_eq!(
            events,
            vec![
                PresentationEvent::StatusChanged(Status::Starting),
                PresentationEvent::ConnectionChanged(true),
            ]
        );
    }
}
