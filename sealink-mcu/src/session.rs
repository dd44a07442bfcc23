//! Peripheral connection lifecycle
//!
//! `Idle -> Advertising <-> Connected`. A disconnect drops to `Idle` with a
//! pending re-advertise that [`LinkSession::service`] carries out in the
//! same main-loop step, retrying every step while the stack refuses.
//! While connected, a tick notification goes out every interval.

use log::*;
use sealink_proto::Tick;

use crate::error::LinkError;
use crate::link::LinkServer;
use crate::presentation::{PresentationEvent, Presenter, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not advertising, not connected (before start, or right after a disconnect)
    Idle,
    Advertising,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rearm {
    Initial,
    Resume,
}

#[derive(Debug)]
pub struct LinkSession {
    state: SessionState,
    pending: Option<Rearm>,
    /// Bumped on every connect; diagnostics only
    peer_generation: u32,
    /// Next value sent in a periodic notification; wraps
    tick: u32,
    notify_interval_ms: u64,
    next_notify_at_ms: u64,
    advertise_failures: u32,
}

impl LinkSession {
    pub fn new(notify_interval_ms: u64) -> Self {
        Self {
            state: SessionState::Idle,
            pending: None,
            peer_generation: 0,
            tick: 0,
            notify_interval_ms,
            next_notify_at_ms: 0,
            advertise_failures: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn is_advertising(&self) -> bool {
        self.state == SessionState::Advertising
    }

    /// A re-advertise is scheduled but has not succeeded yet
    pub fn rearm_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peer_generation(&self) -> u32 {
        self.peer_generation
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// First advertise after service registration. On failure the attempt
    /// stays scheduled and `service` keeps retrying.
    pub fn start(
        &mut self,
        link: &mut impl LinkServer,
        presenter: &mut impl Presenter,
    ) -> Result<(), LinkError> {
        if self.state != SessionState::Idle || self.pending.is_some() {
            debug!("start ignored in state {:?}", self.state);
            return Ok(());
        }
        self.pending = Some(Rearm::Initial);
        self.advertise(link, presenter)
    }

    pub fn on_connect(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkServer,
        presenter: &mut impl Presenter,
    ) {
        if self.state == SessionState::Connected {
            debug!("duplicate connect event ignored");
            return;
        }

        self.state = SessionState::Connected;
        self.pending = None;
        self.peer_generation = self.peer_generation.wrapping_add(1);
        self.next_notify_at_ms = now_ms.saturating_add(self.notify_interval_ms);

        // single-peer stacks stop on their own; make it explicit
        if let Err(e) = link.stop_advertising() {
            debug!("stop advertising on connect: {e}");
        }

        info!("peer connected (generation {})", self.peer_generation);
        presenter.present(PresentationEvent::ConnectionChanged(true));
        presenter.status(Status::Connected);
    }

    pub fn on_disconnect(&mut self, presenter: &mut impl Presenter) {
        if self.state != SessionState::Connected {
            debug!("disconnect event in state {:?} ignored", self.state);
            return;
        }

        self.state = SessionState::Idle;
        self.pending = Some(Rearm::Resume);

        info!("peer disconnected, re-advertise scheduled");
        presenter.present(PresentationEvent::ConnectionChanged(false));
        presenter.status(Status::Disconnected);
    }

    /// Run once per main-loop step, after the step's event
    pub fn service(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkServer,
        presenter: &mut impl Presenter,
    ) {
        if self.pending.is_some() {
            // failures already logged; retried next step
            let _ = self.advertise(link, presenter);
        }

        if self.state == SessionState::Connected && now_ms >= self.next_notify_at_ms {
            self.notify_tick(link);
            self.schedule_next_tick(now_ms);
        }
    }

    /// Deadlines stay on the grid set at connect time. If the loop fell
    /// more than one interval behind, missed slots are skipped, not sent.
    fn schedule_next_tick(&mut self, now_ms: u64) {
        let interval = self.notify_interval_ms.max(1);
        let next = self.next_notify_at_ms.saturating_add(interval);
        self.next_notify_at_ms = if next > now_ms {
            next
        } else {
            let missed = (now_ms - next) / interval + 1;
            next.saturating_add(missed.saturating_mul(interval))
        };
    }

    fn advertise(
        &mut self,
        link: &mut impl LinkServer,
        presenter: &mut impl Presenter,
    ) -> Result<(), LinkError> {
        let Some(kind) = self.pending else {
            return Ok(());
        };
        if self.state != SessionState::Idle {
            self.pending = None;
            return Ok(());
        }

        if let Err(e) = link.start_advertising() {
            self.advertise_failures = self.advertise_failures.saturating_add(1);
            warn!("{e} (attempt {})", self.advertise_failures);
            if self.advertise_failures == 1 {
                presenter.status(Status::AdvertiseFailed);
            }
            return Err(e);
        }

        self.state = SessionState::Advertising;
        self.pending = None;
        self.advertise_failures = 0;
        match kind {
            Rearm::Initial => {
                info!("advertising started");
                presenter.status(Status::Ready);
            }
            Rearm::Resume => {
                info!("advertising restarted");
                presenter.status(Status::AdvertisingRestarted);
            }
        }
        Ok(())
    }

    fn notify_tick(&mut self, link: &mut impl LinkServer) {
        let tick = Tick(self.tick);
        self.tick = self.tick.wrapping_add(1);

        let sent = link
            .set_characteristic_value(&tick.to_bytes())
            .and_then(|()| link.notify());
        match sent {
            Ok(()) => debug!("notified tick {}", tick.0),
            Err(e) => debug!("tick {} dropped: {e}", tick.0),
        }
    }
}
