//! Inbound write handling
//!
//! Every non-empty write is acknowledged on the data characteristic,
//! whether or not it could be decrypted. Acks to a peer that has already
//! gone away are dropped quietly.

use data_encoding::HEXLOWER;
use log::*;
use sealink_proto::ble::ack;

use crate::crypto::CryptoEngine;
use crate::error::CryptoError;
use crate::link::LinkServer;
use crate::presentation::{PresentationEvent, Presenter, Status};

/// What happened to one inbound write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterOutcome {
    /// Empty write: nothing shown, nothing acknowledged
    Ignored,
    /// No key: shown as-is
    Passthrough { count: u32 },
    Decrypted { count: u32 },
    DecryptFailed(CryptoError),
}

pub struct MessageRouter {
    engine: CryptoEngine,
    max_ciphertext_len: usize,
    message_count: u32,
}

impl MessageRouter {
    pub fn new(engine: CryptoEngine, max_ciphertext_len: usize) -> Self {
        Self {
            engine,
            max_ciphertext_len,
            message_count: 0,
        }
    }

    pub fn decryption_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    /// Messages shown so far (failed decrypts excluded)
    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn on_inbound(
        &mut self,
        payload: &[u8],
        link: &mut impl LinkServer,
        presenter: &mut impl Presenter,
    ) -> RouterOutcome {
        if payload.is_empty() {
            warn!("empty write ignored");
            return RouterOutcome::Ignored;
        }
        debug!("write: {} bytes: {}", payload.len(), HEXLOWER.encode(payload));

        if !self.engine.is_enabled() {
            let count = self.show(payload.to_vec(), presenter);
            acknowledge(link, ack::RECEIVED);
            return RouterOutcome::Passthrough { count };
        }

        match self.decrypt(payload) {
            Ok(plaintext) => {
                info!("decrypted {} bytes", plaintext.len());
                let count = self.show(plaintext, presenter);
                acknowledge(link, ack::RECEIVED);
                RouterOutcome::Decrypted { count }
            }
            Err(e) => {
                warn!("decrypt failed: {e}");
                presenter.present(PresentationEvent::DecryptFailed(e.to_string()));
                presenter.status(Status::DecryptFailed);
                acknowledge(link, ack::DECRYPT_FAILED);
                RouterOutcome::DecryptFailed(e)
            }
        }
    }

    fn decrypt(&mut self, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if payload.len() > self.max_ciphertext_len {
            return Err(CryptoError::OversizedInput {
                len: payload.len(),
                max: self.max_ciphertext_len,
            });
        }
        self.engine.decrypt(payload)
    }

    fn show(&mut self, bytes: Vec<u8>, presenter: &mut impl Presenter) -> u32 {
        self.message_count = self.message_count.wrapping_add(1);
        let count = self.message_count;
        presenter.present(PresentationEvent::MessageReceived { bytes, count });
        count
    }
}

fn acknowledge(link: &mut impl LinkServer, ack: &[u8]) {
    let sent = link
        .set_characteristic_value(ack)
        .and_then(|()| link.notify());
    if let Err(e) = sent {
        debug!("ack not delivered (peer gone?): {e}");
    }
}
