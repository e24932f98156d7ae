//! Connection and pairing state machine
//!
//! The machine owns the connection state and the init-attempt counter and is
//! their only writer. It never sleeps or spawns: transitions return a
//! `Directive` and the runtime decides how to wait.

use std::time::Duration;

use serde::Serialize;

use crate::domain::entities::ProviderEvent;

/// Default number of consecutive failed establishment attempts tolerated
pub const MAX_INIT_ATTEMPTS: u32 = 3;

/// Default fixed delay before a retry
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Messaging session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ConnectionState {
    Uninitialized,
    AwaitingPairing { pairing_code: String },
    Ready,
    Disconnected,
    /// Retry budget exhausted; stays here until the process restarts
    Disabled,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Uninitialized => "uninitialized",
            ConnectionState::AwaitingPairing { .. } => "awaiting-pairing",
            ConnectionState::Ready => "ready",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Disabled => "disabled",
        }
    }
}

/// Fixed-delay retry with a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_INIT_ATTEMPTS, RETRY_DELAY)
    }
}

/// What the runtime must do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Start a new establishment attempt after the delay
    ScheduleRetry(Duration),
    /// Budget exhausted, stop retrying
    Disable,
}

/// Read-only view published to the control API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    pub attempts: u32,
    /// Whether an establishment attempt was ever started
    pub initialized: bool,
}

impl ConnectionSnapshot {
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    pub fn pairing_code(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::AwaitingPairing { pairing_code } => Some(pairing_code),
            _ => None,
        }
    }
}

impl Default for ConnectionSnapshot {
    fn default() -> Self {
        Self {
            state: ConnectionState::Uninitialized,
            attempts: 0,
            initialized: false,
        }
    }
}

/// Connection state machine
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: u32,
    initialized: bool,
    /// Whether the current attempt reached `Ready`
    reached_ready: bool,
    policy: RetryPolicy,
}

impl ConnectionMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Uninitialized,
            attempts: 0,
            initialized: false,
            reached_ready: false,
            policy,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn is_disabled(&self) -> bool {
        self.state == ConnectionState::Disabled
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            state: self.state.clone(),
            attempts: self.attempts,
            initialized: self.initialized,
        }
    }

    /// Gate an establishment attempt. Returns false, and disables, once the budget is spent.
    pub fn begin_attempt(&mut self) -> bool {
        if self.is_disabled() {
            return false;
        }
        if self.attempts >= self.policy.max_attempts {
            self.state = ConnectionState::Disabled;
            return false;
        }
        self.initialized = true;
        self.reached_ready = false;
        true
    }

    /// Record a failed establishment attempt
    pub fn fail(&mut self) -> Option<Directive> {
        if self.is_disabled() {
            return None;
        }
        self.attempts += 1;
        self.state = ConnectionState::Uninitialized;
        self.retry_or_disable()
    }

    /// Apply a provider lifecycle event. Message events leave the state untouched.
    pub fn apply(&mut self, event: &ProviderEvent) -> Option<Directive> {
        if self.is_disabled() {
            return None;
        }

        match event {
            ProviderEvent::Qr(code) => {
                self.state = ConnectionState::AwaitingPairing {
                    pairing_code: code.clone(),
                };
                None
            }
            ProviderEvent::Ready => {
                self.state = ConnectionState::Ready;
                self.attempts = 0;
                self.reached_ready = true;
                None
            }
            ProviderEvent::Error(_) => self.fail(),
            ProviderEvent::Disconnected => {
                // dropping before ready spends the attempt
                if !self.reached_ready {
                    self.attempts += 1;
                }
                self.state = ConnectionState::Disconnected;
                self.retry_or_disable()
            }
            ProviderEvent::Message(_) => None,
        }
    }

    fn retry_or_disable(&mut self) -> Option<Directive> {
        if self.attempts < self.policy.max_attempts {
            Some(Directive::ScheduleRetry(self.policy.delay))
        } else {
            self.state = ConnectionState::Disabled;
            Some(Directive::Disable)
        }
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
