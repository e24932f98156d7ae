//! Operator panel flows
//!
//! Everything except login needs an unexpired session.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::sync::watch;

use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::parse_discount;
use crate::domain::entities::{phone_from_chat_id, UserProfile};
use crate::domain::traits::{Authenticator, BotControl, BotStatus, CustomerDirectory};
use super::session_service::{ExpiryWatcher, SessionService};

/// Default status poll interval
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{6,15}$").unwrap());

/// Logged-in operator and time left on the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user: Option<UserProfile>,
    pub remaining_secs: u64,
}

/// Why a status watch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Stopped,
    SessionExpired,
}

/// Panel service
pub struct PanelService {
    session: Arc<SessionService>,
    auth: Arc<dyn Authenticator>,
    control: Arc<dyn BotControl>,
    directory: Arc<dyn CustomerDirectory>,
}

impl PanelService {
    pub fn new(
        session: Arc<SessionService>,
        auth: Arc<dyn Authenticator>,
        control: Arc<dyn BotControl>,
        directory: Arc<dyn CustomerDirectory>,
    ) -> Self {
        Self {
            session,
            auth,
            control,
            directory,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionInfo, BotError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CommandError::InvalidArgs("username and password are required".to_string()).into());
        }

        let grant = self.auth.authenticate(username, password).await?;
        self.session.issue(&grant.token, grant.expires_in).await?;

        let user = UserProfile::new(username).with_name(username);
        self.session.store_profile(&user).await?;
        tracing::info!("Logged in as {}", user);

        Ok(SessionInfo {
            user: Some(user),
            remaining_secs: self.session.remaining_seconds().await,
        })
    }

    pub async fn logout(&self) -> Result<(), BotError> {
        self.session.clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Current session, after dropping it if it has expired
    pub async fn session_info(&self) -> Result<Option<SessionInfo>, BotError> {
        self.session.enforce_expiry().await?;
        if !self.session.is_authenticated().await {
            return Ok(None);
        }

        Ok(Some(SessionInfo {
            user: self.session.profile().await?,
            remaining_secs: self.session.remaining_seconds().await,
        }))
    }

    pub async fn status(&self) -> Result<BotStatus, BotError> {
        self.session.require().await?;
        self.control.status().await
    }

    pub async fn send_message(&self, phone: &str, message: &str) -> Result<(), BotError> {
        self.session.require().await?;

        let phone = phone.trim();
        if !PHONE_RE.is_match(phone_from_chat_id(phone)) {
            return Err(CommandError::InvalidArgs(format!("invalid phone number: {}", phone)).into());
        }
        if message.trim().is_empty() {
            return Err(CommandError::InvalidArgs("message is empty".to_string()).into());
        }

        self.control.send_message(phone, message).await?;
        tracing::info!("Message sent to {}", phone);
        Ok(())
    }

    /// Set a customer's discount. The value must be a percentage in `0..=100`.
    pub async fn update_discount(&self, phone: &str, raw_value: &str) -> Result<f64, BotError> {
        self.session.require().await?;

        let phone = phone.trim();
        if phone.is_empty() {
            return Err(CommandError::InvalidArgs("phone is required".to_string()).into());
        }

        let value = parse_discount(raw_value)?;
        if !(0.0..=100.0).contains(&value) {
            return Err(CommandError::InvalidArgs(format!("discount must be between 0 and 100: {}", value)).into());
        }

        if !self.directory.update_discount(phone, value).await? {
            return Err(CommandError::ExecutionFailed(format!("directory rejected discount for {}", phone)).into());
        }

        tracing::info!("Discount updated to {}% for {}", value, phone);
        Ok(value)
    }

    /// Poll the bot status every `poll_interval` and report it to `on_status`.
    ///
    /// The session is re-checked every `expiry_interval`; the watch ends when
    /// it expires or when `shutdown` flips to true.
    pub async fn watch_status<F>(
        &self,
        poll_interval: Duration,
        expiry_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
        mut on_status: F,
    ) -> Result<WatchOutcome, BotError>
    where
        F: FnMut(&BotStatus) + Send,
    {
        self.session.require().await?;

        let (expired_tx, mut expired_rx) = watch::channel(false);
        let (stop_tx, stop_rx) = watch::channel(false);
        let watcher = ExpiryWatcher::new(self.session.clone(), expiry_interval);
        tokio::spawn(watcher.run(expired_tx, stop_rx));

        let mut ticker = tokio::time::interval(poll_interval);
        let outcome = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.control.status().await {
                        Ok(status) => on_status(&status),
                        Err(e) => tracing::warn!("Error checking status: {}", e),
                    }
                }
                changed = expired_rx.changed() => {
                    if changed.is_err() || *expired_rx.borrow() {
                        tracing::info!("Session expired, stopping status watch");
                        break WatchOutcome::SessionExpired;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break WatchOutcome::Stopped;
                    }
                }
            }
        };

        let _ = stop_tx.send(true);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::application::errors::DirectoryError;
    use crate::application::services::session_service::EXPIRY_CHECK_INTERVAL;
    use crate::domain::entities::CustomerProfile;
    use crate::domain::traits::clock::testing::ManualClock;
    use crate::domain::traits::AuthGrant;
    use crate::infrastructure::storage::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    struct FixedAuth;

    #[async_trait]
    impl Authenticator for FixedAuth {
        async fn authenticate(&self, username: &str, password: &str) -> Result<AuthGrant, BotError> {
            if username == "admin" && password == "secret" {
                Ok(AuthGrant { token: "tok".to_string(), expires_in: 60 })
            } else {
                Err(BotError::Auth("Credenciales invalidas".to_string()))
            }
        }
    }

    #[derive(Default)]
    struct FakeControl {
        polls: Mutex<u32>,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl BotControl for FakeControl {
        async fn status(&self) -> Result<BotStatus, BotError> {
            *self.polls.lock().unwrap() += 1;
            Ok(BotStatus { connected: false, qr_code: Some("2@code".to_string()) })
        }

        async fn send_message(&self, phone: &str, message: &str) -> Result<(), BotError> {
            self.sent.lock().unwrap().push((phone.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDirectory {
        updates: Mutex<Vec<(String, f64)>>,
    }

    #[async_trait]
    impl CustomerDirectory for FakeDirectory {
        async fn lookup(&self, _phone: &str) -> Result<Option<CustomerProfile>, DirectoryError> {
            Ok(None)
        }

        async fn update_discount(&self, phone: &str, discount: f64) -> Result<bool, DirectoryError> {
            self.updates.lock().unwrap().push((phone.to_string(), discount));
            Ok(phone != "000000")
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        control: Arc<FakeControl>,
        directory: Arc<FakeDirectory>,
        panel: PanelService,
    }

    fn setup() -> Fixture {
        let clock = Arc::new(ManualClock::at(T0));
        let session = Arc::new(SessionService::new(Arc::new(MemoryStore::new()), clock.clone()));
        let control = Arc::new(FakeControl::default());
        let directory = Arc::new(FakeDirectory::default());
        let panel = PanelService::new(session, Arc::new(FixedAuth), control.clone(), directory.clone());
        Fixture { clock, control, directory, panel }
    }

    #[tokio::test]
    async fn login_issues_session_and_caches_profile() {
        let f = setup();
        let info = f.panel.login("admin", "secret").await.unwrap();

        assert_eq!(info.remaining_secs, 60);
        assert_eq!(info.user, Some(UserProfile::new("admin").with_name("admin")));
        assert_eq!(f.panel.session_info().await.unwrap(), Some(info));
    }

    #[tokio::test]
    async fn login_rejection_leaves_no_session() {
        let f = setup();
        let result = f.panel.login("admin", "wrong").await;

        assert!(matches!(result, Err(BotError::Auth(_))));
        assert_eq!(f.panel.session_info().await.unwrap(), None);
    }

    #[tokio::test]
    async fn actions_require_a_live_session() {
        let f = setup();
        assert!(matches!(f.panel.status().await, Err(BotError::SessionExpired)));

        f.panel.login("admin", "secret").await.unwrap();
        assert!(f.panel.status().await.is_ok());

        f.clock.advance_secs(61);
        assert!(matches!(
            f.panel.send_message("595981234567", "hola").await,
            Err(BotError::SessionExpired)
        ));
        assert_eq!(f.panel.session_info().await.unwrap(), None);
        assert!(f.control.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let f = setup();
        f.panel.login("admin", "secret").await.unwrap();
        f.panel.logout().await.unwrap();
        assert!(matches!(f.panel.status().await, Err(BotError::SessionExpired)));
    }

    #[tokio::test]
    async fn send_message_validates_phone() {
        let f = setup();
        f.panel.login("admin", "secret").await.unwrap();

        assert!(matches!(
            f.panel.send_message("abc", "hola").await,
            Err(BotError::Command(CommandError::InvalidArgs(_)))
        ));
        assert!(matches!(
            f.panel.send_message("595981234567", "  ").await,
            Err(BotError::Command(CommandError::InvalidArgs(_)))
        ));

        f.panel.send_message("595981234567@c.us", "hola").await.unwrap();
        assert_eq!(
            *f.control.sent.lock().unwrap(),
            vec![("595981234567@c.us".to_string(), "hola".to_string())]
        );
    }

    #[tokio::test]
    async fn discount_must_be_a_percentage() {
        let f = setup();
        f.panel.login("admin", "secret").await.unwrap();

        for bad in ["abc", "-1", "100.5"] {
            assert!(matches!(
                f.panel.update_discount("595981234567", bad).await,
                Err(BotError::Command(CommandError::InvalidArgs(_)))
            ));
        }
        assert!(f.directory.updates.lock().unwrap().is_empty());

        assert_eq!(f.panel.update_discount("595981234567", "15").await.unwrap(), 15.0);
        assert!(matches!(
            f.panel.update_discount("000000", "0").await,
            Err(BotError::Command(CommandError::ExecutionFailed(_)))
        ));
        assert_eq!(f.directory.updates.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_polls_until_shutdown() {
        let f = setup();
        f.panel.login("admin", "secret").await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(7_000)).await;
            shutdown_tx.send(true).unwrap();
        });

        let mut seen = Vec::new();
        let outcome = f
            .panel
            .watch_status(STATUS_POLL_INTERVAL, EXPIRY_CHECK_INTERVAL, shutdown_rx, |s| {
                seen.push(s.clone())
            })
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(outcome, WatchOutcome::Stopped);
        // polls at 0s, 3s and 6s
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].qr_code.as_deref(), Some("2@code"));
    }

    #[tokio::test(start_paused = true)]
    async fn watch_ends_when_session_expires() {
        let f = setup();
        f.panel.login("admin", "secret").await.unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let clock = f.clock.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            clock.advance_secs(61);
        });

        let outcome = f
            .panel
            .watch_status(STATUS_POLL_INTERVAL, EXPIRY_CHECK_INTERVAL, shutdown_rx, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome, WatchOutcome::SessionExpired);
        assert_eq!(f.panel.session_info().await.unwrap(), None);
    }
}
