//! SOS escalation: a countdown that ends in a call unless cancelled.
//!
//! The controller owns at most one timer lease at a time. All state changes
//! go through `enter`, which releases the current
//! lease before arming the next one, so no exit path leaves a timer running.
//! Timer ids that do not match the current lease are ignored.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capabilities::TimerId;
use crate::config::ClientConfig;
use crate::model::EmergencyService;
use crate::{DEFAULT_COUNTDOWN_SECS, DEFAULT_GRACE_PERIOD_SECS, DEFAULT_TICK_MILLIS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EmergencyState {
    #[default]
    Idle,
    CountingDown {
        seconds_remaining: u32,
        service: EmergencyService,
    },
    Calling {
        service: EmergencyService,
    },
}

impl EmergencyState {
    #[must_use]
    pub const fn service(&self) -> Option<EmergencyService> {
        match self {
            Self::Idle => None,
            Self::CountingDown { service, .. } | Self::Calling { service } => Some(*service),
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CountingDown { .. } => "counting_down",
            Self::Calling { .. } => "calling",
        }
    }
}

/// Side effects requested by a transition, in the order they must happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosCommand {
    StartTimer { id: TimerId, after: Duration },
    ClearTimer(TimerId),
    Dial(EmergencyService),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeaseKind {
    Tick,
    Grace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerLease {
    id: TimerId,
    kind: LeaseKind,
}

#[derive(Debug)]
pub struct EmergencyController {
    state: EmergencyState,
    lease: Option<TimerLease>,
    timers_issued: u64,
    countdown_secs: u32,
    tick: Duration,
    grace: Duration,
}

impl Default for EmergencyController {
    fn default() -> Self {
        Self {
            state: EmergencyState::Idle,
            lease: None,
            timers_issued: 0,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick: Duration::from_millis(DEFAULT_TICK_MILLIS),
            grace: Duration::from_secs(u64::from(DEFAULT_GRACE_PERIOD_SECS)),
        }
    }
}

impl EmergencyController {
    #[must_use]
    pub const fn state(&self) -> EmergencyState {
        self.state
    }

    #[must_use]
    pub const fn countdown_secs(&self) -> u32 {
        self.countdown_secs
    }

    /// Takes effect from the next trigger; a running countdown is untouched.
    pub fn configure(&mut self, config: &ClientConfig) {
        self.countdown_secs = config.countdown_secs.max(1);
        self.tick = config.tick_interval();
        self.grace = config.grace_period();
    }

    /// Starts (or restarts) the countdown. A running countdown keeps its
    /// chosen service; a call in progress is never interrupted.
    pub fn trigger(&mut self) -> Vec<SosCommand> {
        let service = match self.state {
            EmergencyState::Calling { .. } => {
                debug!("sos trigger ignored while calling");
                return Vec::new();
            }
            EmergencyState::CountingDown { service, .. } => service,
            EmergencyState::Idle => EmergencyService::Police,
        };

        info!(service = service.label(), seconds = self.countdown_secs, "sos countdown armed");
        self.enter(EmergencyState::CountingDown {
            seconds_remaining: self.countdown_secs,
            service,
        })
    }

    /// Changes the service without touching the countdown.
    pub fn select_service(&mut self, service: EmergencyService) {
        if let EmergencyState::CountingDown {
            service: ref mut current,
            ..
        } = self.state
        {
            debug!(service = service.label(), "sos service selected");
            *current = service;
        } else {
            debug!(state = self.state.name(), "sos service selection ignored");
        }
    }

    pub fn cancel(&mut self) -> Vec<SosCommand> {
        match self.state {
            EmergencyState::CountingDown { seconds_remaining, .. } => {
                info!(seconds_remaining, "sos cancelled");
                self.enter(EmergencyState::Idle)
            }
            _ => Vec::new(),
        }
    }

    pub fn call_now(&mut self) -> Vec<SosCommand> {
        match self.state {
            EmergencyState::CountingDown { service, seconds_remaining } => {
                info!(service = service.label(), seconds_remaining, "sos call now");
                self.enter(EmergencyState::Calling { service })
            }
            _ => Vec::new(),
        }
    }

    pub fn timer_fired(&mut self, id: TimerId) -> Vec<SosCommand> {
        let lease = match self.lease {
            Some(lease) if lease.id == id => lease,
            _ => {
                debug!(%id, "ignoring timer without a lease");
                return Vec::new();
            }
        };
        // The shell has already retired this timer.
        self.lease = None;

        match (lease.kind, self.state) {
            (
                LeaseKind::Tick,
                EmergencyState::CountingDown {
                    seconds_remaining,
                    service,
                },
            ) => {
                let remaining = seconds_remaining.saturating_sub(1);
                if remaining == 0 {
                    info!(service = service.label(), "sos countdown elapsed");
                    self.enter(EmergencyState::Calling { service })
                } else {
                    self.enter(EmergencyState::CountingDown {
                        seconds_remaining: remaining,
                        service,
                    })
                }
            }
            (LeaseKind::Grace, EmergencyState::Calling { .. }) => {
                debug!("sos grace period over");
                self.enter(EmergencyState::Idle)
            }
            (kind, state) => {
                warn!(?kind, state = state.name(), "timer lease did not match state");
                Vec::new()
            }
        }
    }

    /// Releases any timer and returns to idle. Used when the app closes.
    pub fn teardown(&mut self) -> Vec<SosCommand> {
        if self.state == EmergencyState::Idle && self.lease.is_none() {
            return Vec::new();
        }
        debug!(state = self.state.name(), "sos teardown");
        self.enter(EmergencyState::Idle)
    }

    fn enter(&mut self, next: EmergencyState) -> Vec<SosCommand> {
        let mut commands = Vec::with_capacity(3);

        if let Some(lease) = self.lease.take() {
            commands.push(SosCommand::ClearTimer(lease.id));
        }

        match next {
            EmergencyState::Idle => {}
            EmergencyState::CountingDown { .. } => {
                commands.push(self.arm(LeaseKind::Tick, self.tick));
            }
            EmergencyState::Calling { service } => {
                commands.push(SosCommand::Dial(service));
                commands.push(self.arm(LeaseKind::Grace, self.grace));
            }
        }

        debug!(from = self.state.name(), to = next.name(), "sos transition");
        self.state = next;
        commands
    }

    fn arm(&mut self, kind: LeaseKind, after: Duration) -> SosCommand {
        self.timers_issued += 1;
        let id = TimerId(self.timers_issued);
        self.lease = Some(TimerLease { id, kind });
        SosCommand::StartTimer { id, after }
    }
}
