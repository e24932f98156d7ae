//! Client-side session token lifecycle
//!
//! The token and its absolute expiry live in the panel's key-value store.
//! Expiry is terminal: there is no refresh flow, an expired session is
//! cleared and the operator has to log in again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::errors::{BotError, StorageError};
use crate::domain::entities::UserProfile;
use crate::domain::traits::{Clock, Store};

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const TOKEN_EXPIRES_AT_KEY: &str = "tokenExpiresAt";
pub const USER_DATA_KEY: &str = "userData";

/// Default interval between expiry checks
pub const EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Session token service
pub struct SessionService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record a token valid for `lifetime_secs` from now. Returns the expiry instant in ms.
    pub async fn issue(&self, token: &str, lifetime_secs: i64) -> Result<i64, BotError> {
        let expires_at = lifetime_secs
            .checked_mul(1000)
            .and_then(|ms| self.clock.now_millis().checked_add(ms))
            .ok_or_else(|| BotError::Parse(format!("Token lifetime out of range: {}s", lifetime_secs)))?;
        let expires_at_str = expires_at.to_string();

        self.store
            .set_many(&[(AUTH_TOKEN_KEY, token), (TOKEN_EXPIRES_AT_KEY, &expires_at_str)])
            .await?;

        tracing::info!("Session issued, expires in {}s", lifetime_secs.max(0));
        Ok(expires_at)
    }

    pub async fn token(&self) -> Result<Option<String>, BotError> {
        Ok(self.store.get(AUTH_TOKEN_KEY).await?)
    }

    /// Stored expiry instant; unparsable values read as absent
    async fn expires_at(&self) -> Result<Option<i64>, StorageError> {
        let raw = self.store.get(TOKEN_EXPIRES_AT_KEY).await?;
        Ok(raw.and_then(|s| s.trim().parse::<i64>().ok()))
    }

    /// True when no expiry is recorded or it has passed. Storage errors count as expired.
    pub async fn is_expired(&self) -> bool {
        match self.expires_at().await {
            Ok(Some(expires_at)) => self.clock.now_millis() > expires_at,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("Failed to read session expiry: {}", e);
                true
            }
        }
    }

    /// Whole seconds left before expiry, zero when expired or absent
    pub async fn remaining_seconds(&self) -> u64 {
        match self.expires_at().await {
            Ok(Some(expires_at)) => {
                let left = expires_at.saturating_sub(self.clock.now_millis()).max(0);
                (left / 1000) as u64
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!("Failed to read session expiry: {}", e);
                0
            }
        }
    }

    /// Remove token, expiry and cached profile in one store operation
    pub async fn clear(&self) -> Result<(), BotError> {
        self.store
            .delete_many(&[AUTH_TOKEN_KEY, TOKEN_EXPIRES_AT_KEY, USER_DATA_KEY])
            .await?;
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        match self.token().await {
            Ok(Some(token)) if !token.is_empty() => !self.is_expired().await,
            _ => false,
        }
    }

    pub async fn store_profile(&self, profile: &UserProfile) -> Result<(), BotError> {
        let json = serde_json::to_string(profile)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(USER_DATA_KEY, &json).await?;
        Ok(())
    }

    pub async fn profile(&self) -> Result<Option<UserProfile>, BotError> {
        let Some(json) = self.store.get(USER_DATA_KEY).await? else {
            return Ok(None);
        };
        let profile = serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(profile))
    }

    /// Clear the session if it has expired. Returns true when a token was dropped.
    pub async fn enforce_expiry(&self) -> Result<bool, BotError> {
        if !self.is_expired().await {
            return Ok(false);
        }

        let had_token = self.token().await?.is_some();
        self.clear().await?;
        if had_token {
            tracing::info!("Session expired, cleared stored credentials");
        }
        Ok(had_token)
    }

    /// Fail with `SessionExpired` unless an unexpired session exists
    pub async fn require(&self) -> Result<String, BotError> {
        self.enforce_expiry().await?;
        match self.token().await? {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(BotError::SessionExpired),
        }
    }
}

/// Periodically checks the stored session and clears it once expired.
///
/// The first check runs immediately. The watcher stops after an expiry was
/// detected or when `shutdown` flips to true.
pub struct ExpiryWatcher {
    session: Arc<SessionService>,
    interval: Duration,
}

impl ExpiryWatcher {
    pub fn new(session: Arc<SessionService>, interval: Duration) -> Self {
        Self { session, interval }
    }

    /// Run until expiry or shutdown; `expired` is set to true on expiry
    pub async fn run(self, expired: watch::Sender<bool>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.session.enforce_expiry().await {
                        Ok(false) => {}
                        Ok(true) => {
                            let _ = expired.send(true);
                            return;
                        }
                        Err(e) => tracing::warn!("Expiry check failed: {}", e),
                    }
                    // Nothing stored at all also means unauthenticated
                    if !self.session.is_authenticated().await {
                        let _ = expired.send(true);
                        return;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::clock::testing::ManualClock;
    use crate::infrastructure::storage::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    fn setup() -> (Arc<ManualClock>, Arc<MemoryStore>, SessionService) {
        let clock = Arc::new(ManualClock::at(T0));
        let store = Arc::new(MemoryStore::new());
        let session = SessionService::new(store.clone(), clock.clone());
        (clock, store, session)
    }

    #[tokio::test]
    async fn absent_expiry_is_expired() {
        let (_, _, session) = setup();
        assert!(session.is_expired().await);
        assert_eq!(session.remaining_seconds().await, 0);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn future_expiry_is_not_expired() {
        let (_, _, session) = setup();
        let expires_at = session.issue("tok", 3600).await.unwrap();

        assert_eq!(expires_at, T0 + 3_600_000);
        assert!(!session.is_expired().await);
        assert_eq!(session.remaining_seconds().await, 3600);
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn out_of_range_lifetime_is_rejected() {
        let (_, store, session) = setup();
        for lifetime in [i64::MAX / 10, i64::MIN / 10, i64::MAX - T0 / 1000] {
            assert!(matches!(session.issue("tok", lifetime).await, Err(BotError::Parse(_))));
        }
        assert!(store.is_empty().await);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn past_expiry_is_expired() {
        let (clock, _, session) = setup();
        session.issue("tok", 10).await.unwrap();

        clock.advance_secs(10);
        assert!(!session.is_expired().await, "expiry instant itself is still valid");
        clock.advance_millis(1);
        assert!(session.is_expired().await);
        assert_eq!(session.remaining_seconds().await, 0);
    }

    #[tokio::test]
    async fn remaining_seconds_floors_and_never_increases() {
        let (clock, _, session) = setup();
        session.issue("tok", 5).await.unwrap();

        let mut last = session.remaining_seconds().await;
        assert_eq!(last, 5);
        for _ in 0..12 {
            clock.advance_millis(700);
            let now = session.remaining_seconds().await;
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0);

        clock.advance_millis(500);
        session.issue("tok", 0).await.unwrap();
        assert_eq!(session.remaining_seconds().await, 0);
    }

    #[tokio::test]
    async fn unparsable_expiry_is_expired() {
        let (_, store, session) = setup();
        store.set(AUTH_TOKEN_KEY, "tok").await.unwrap();
        store.set(TOKEN_EXPIRES_AT_KEY, "tomorrow").await.unwrap();

        assert!(session.is_expired().await);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (_, store, session) = setup();
        session.issue("tok", 3600).await.unwrap();
        session.store_profile(&UserProfile::new("admin").with_name("admin")).await.unwrap();

        session.clear().await.unwrap();

        assert!(session.is_expired().await);
        assert_eq!(session.remaining_seconds().await, 0);
        assert_eq!(session.token().await.unwrap(), None);
        assert_eq!(session.profile().await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn enforce_expiry_reports_dropped_token() {
        let (clock, _, session) = setup();
        session.issue("tok", 60).await.unwrap();

        assert!(!session.enforce_expiry().await.unwrap());
        clock.advance_secs(61);
        assert!(session.enforce_expiry().await.unwrap());
        assert!(!session.enforce_expiry().await.unwrap());
        assert!(matches!(session.require().await, Err(BotError::SessionExpired)));
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_clears_session_after_expiry() {
        let (clock, _, session) = setup();
        let session = Arc::new(session);
        session.issue("tok", 90).await.unwrap();

        let (expired_tx, mut expired_rx) = watch::channel(false);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = ExpiryWatcher::new(session.clone(), EXPIRY_CHECK_INTERVAL);
        let handle = tokio::spawn(watcher.run(expired_tx, shutdown_rx));

        // eager check plus the first interval pass with a valid token
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!*expired_rx.borrow());

        clock.advance_secs(120);
        expired_rx.changed().await.unwrap();
        assert!(*expired_rx.borrow());
        assert_eq!(session.token().await.unwrap(), None);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_reports_missing_session_immediately() {
        let (_, _, session) = setup();
        let (expired_tx, mut expired_rx) = watch::channel(false);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            ExpiryWatcher::new(Arc::new(session), EXPIRY_CHECK_INTERVAL).run(expired_tx, shutdown_rx),
        );
        expired_rx.changed().await.unwrap();
        assert!(*expired_rx.borrow());
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_stops_on_shutdown() {
        let (_, _, session) = setup();
        let session = Arc::new(session);
        session.issue("tok", 3600).await.unwrap();

        let (expired_tx, expired_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(
            ExpiryWatcher::new(session, EXPIRY_CHECK_INTERVAL).run(expired_tx, shutdown_rx),
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(!*expired_rx.borrow());
    }
}
