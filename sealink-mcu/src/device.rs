//! The receiver: boot sequence and cooperative main-loop step
//!
//! Board crates register the BLE service, build a [`Device`] and then call
//! [`Device::step`] forever. Each step consumes at most one link event,
//! then lets the session re-arm advertising and send due notifications.

use log::*;
use sealink_proto::ble::ready;

use crate::config::{Decryption, DeviceConfig};
use crate::crypto::CryptoEngine;
use crate::keystore::{self, PrivateKey};
use crate::link::{EventQueue, LinkEvent, LinkServer};
use crate::presentation::{Presenter, Status};
use crate::router::{MessageRouter, RouterOutcome};
use crate::session::LinkSession;
use crate::storage::KeyFs;

/// How often the uptime status is refreshed while no peer is connected
const UPTIME_INTERVAL_MS: u64 = 5000;

pub struct Device<L, P> {
    link: L,
    presenter: P,
    events: EventQueue,
    session: LinkSession,
    router: MessageRouter,
    next_uptime_at_ms: u64,
}

impl<L: LinkServer, P: Presenter> Device<L, P> {
    /// Load the key (if enabled), publish the ready value and start
    /// advertising. Never fails: a missing or broken key only disables
    /// decryption, and a refused advertise is retried by `step`.
    pub fn boot(
        config: &DeviceConfig,
        fs: &impl KeyFs,
        mut link: L,
        mut presenter: P,
        events: EventQueue,
    ) -> Self {
        presenter.status(Status::Starting);
        info!("{} starting", config.device_name);

        let key = match config.decryption {
            Decryption::Enabled => load_key(config, fs, &mut presenter),
            Decryption::Disabled => {
                info!("decryption disabled by configuration");
                presenter.status(Status::RsaDisabled);
                None
            }
        };

        let engine = CryptoEngine::from_entropy(key);
        let initial = if engine.is_enabled() {
            ready::ENCRYPTED
        } else {
            ready::PLAIN_ONLY
        };
        if let Err(e) = link.set_characteristic_value(initial) {
            warn!("could not set initial value: {e}");
        }

        let router = MessageRouter::new(engine, config.max_ciphertext_len);
        let mut session = LinkSession::new(config.notify_interval_ms);

        presenter.status(Status::Advertising);
        if let Err(e) = session.start(&mut link, &mut presenter) {
            warn!("initial advertise failed, will retry: {e}");
        }

        Self {
            link,
            presenter,
            events,
            session,
            router,
            next_uptime_at_ms: UPTIME_INTERVAL_MS,
        }
    }

    /// One main-loop iteration. Returns the write outcome if this step
    /// handled an inbound write.
    pub fn step(&mut self, now_ms: u64) -> Option<RouterOutcome> {
        let outcome = match self.events.try_next() {
            Some(event) => self.handle(event, now_ms),
            None => None,
        };
        self.session
            .service(now_ms, &mut self.link, &mut self.presenter);

        if now_ms >= self.next_uptime_at_ms {
            if !self.session.is_connected() {
                self.presenter.status(Status::Uptime(now_ms / 1000));
            }
            self.next_uptime_at_ms = now_ms.saturating_add(UPTIME_INTERVAL_MS);
        }
        outcome
    }

    fn handle(&mut self, event: LinkEvent, now_ms: u64) -> Option<RouterOutcome> {
        match event {
            LinkEvent::PeerConnected => {
                self.session
                    .on_connect(now_ms, &mut self.link, &mut self.presenter);
                None
            }
            LinkEvent::PeerDisconnected => {
                let was_connected = self.session.is_connected();
                self.session.on_disconnect(&mut self.presenter);
                let count = self.router.message_count();
                if was_connected && count > 0 {
                    self.presenter.status(Status::Messages(count));
                }
                None
            }
            LinkEvent::Write(message) => {
                debug!("write received at {} ms", message.received_at_ms);
                Some(
                    self.router
                        .on_inbound(&message.payload, &mut self.link, &mut self.presenter),
                )
            }
        }
    }

    pub fn decryption_enabled(&self) -> bool {
        self.router.decryption_enabled()
    }

    pub fn session(&self) -> &LinkSession {
        &self.session
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}

fn load_key(config: &DeviceConfig, fs: &impl KeyFs, presenter: &mut impl Presenter) -> Option<PrivateKey> {
    presenter.status(Status::InitRsa);

    match fs.list() {
        Ok(files) => {
            info!("files in storage:");
            for file in files {
                info!("  - {} ({} bytes)", file.name, file.size);
            }
        }
        Err(e) => debug!("cannot list storage: {e}"),
    }

    match keystore::load(fs, &config.key_path) {
        Ok(key) => {
            presenter.status(Status::RsaEnabled);
            Some(key)
        }
        Err(e) => {
            warn!("{e} - continuing without decryption");
            presenter.status(e.status());
            None
        }
    }
}
