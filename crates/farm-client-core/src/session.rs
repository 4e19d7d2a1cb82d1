//! The session slot and the operations that move it between states.
//!
//! ```text
//! LoggedOut --login--> LoggingIn --ok--> LoggedIn --logout--> LoggedOut
//! LoggedOut --signup-> SigningUp --ok--> LoggedIn
//! ```
//!
//! A failed login or signup goes back to whatever was there before, a partial
//! session is never installed.

use anyhow::Context as _;
use farm_shared::{
    const_config::{
        route::{ROUTE_DASHBOARD, ROUTE_LOGIN},
        storage::{STORAGE_KEY_ACCESS_TOKEN, STORAGE_KEY_REFRESH_TOKEN, STORAGE_KEY_USER},
    },
    errors::NotLoggedInError,
    log_err_as_warn,
    req_args::{LoginReqArgs, ResetPasswordReqArgs, SignupReqArgs},
    token::TokenPair,
    uac::{
        validate_new_password, AuthError, DisplayName, Email, ResetPasswordError, UserId,
        UserInfo,
    },
};
use secrecy::{ExposeSecret as _, SecretString};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::{
    config::{ClientConfig, SimulatedDelays},
    directory::UserDirectory,
    storage::{FileStore, KeyValueStore, MemoryStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggingIn,
    SigningUp,
    LoggedIn(Arc<UserInfo>),
}

/// Single source of truth for who is logged in and what they may do.
///
/// Cheap to clone, all clones share the same session
#[derive(Debug, Clone)]
pub struct AuthContext {
    inner: Arc<Mutex<AuthContextInner>>,
    directory: UserDirectory,
    store: Arc<dyn KeyValueStore>,
    delays: SimulatedDelays,
}

#[derive(Debug, Default)]
struct AuthContextInner {
    user: Option<Arc<UserInfo>>,
    tokens: Option<TokenPair>,
    /// Oldest first, operations may overlap
    in_flight: Vec<Operation>,
    redirect: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Login,
    Signup,
    RequestReset,
    CompleteReset,
}

/// Removes its operation from the in flight list even if the operation's
/// future is dropped
struct InFlightGuard<'a> {
    context: &'a AuthContext,
    operation: Operation,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self.context.lock();
        let found = guard.in_flight.iter().rposition(|x| *x == self.operation);
        if let Some(pos) = found {
            guard.in_flight.remove(pos);
        }
    }
}

impl AuthContext {
    pub fn new(directory: UserDirectory, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Default::default(),
            directory,
            store,
            delays: Default::default(),
        }
    }

    pub fn with_delays(mut self, delays: SimulatedDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Builds the context described by `config` over the demo directory and
    /// reinstates any cached session
    #[tracing::instrument(name = "NEW AUTH-CONTEXT")]
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStore::new(dir.clone())?),
            None => Arc::new(MemoryStore::new()),
        };
        let directory = UserDirectory::with_seed_users().context("failed to seed directory")?;
        let result = Self::new(directory, store).with_delays(config.delays);
        result.restore();
        Ok(result)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuthContextInner> {
        self.inner.lock().expect("auth context mutex poisoned")
    }

    fn begin(&self, operation: Operation) -> InFlightGuard<'_> {
        let mut guard = self.lock();
        if let Some(previous) = guard.in_flight.last() {
            warn!(?previous, ?operation, "operation started while another in flight");
        }
        guard.in_flight.push(operation);
        InFlightGuard {
            context: self,
            operation,
        }
    }

    /// Reinstates the session (and tokens) from the store.
    ///
    /// Stored content that fails to parse is discarded
    #[tracing::instrument(skip(self))]
    pub fn restore(&self) {
        let stored = match self.store.get(STORAGE_KEY_USER) {
            Ok(x) => x,
            Err(err) => {
                warn!(?err, "failed to read stored user");
                return;
            }
        };
        let Some(stored) = stored else {
            return;
        };
        let user = match serde_json::from_str::<UserInfo>(&stored) {
            Ok(user) => user,
            Err(err) => {
                warn!(?err, "discarding malformed stored user");
                log_err_as_warn!(self.store.remove(STORAGE_KEY_USER));
                return;
            }
        };
        info!(id = %user.id, role = %user.role, "session restored");
        let tokens = self.load_tokens();
        let mut guard = self.lock();
        guard.user = Some(Arc::new(user));
        guard.tokens = tokens;
    }

    fn load_tokens(&self) -> Option<TokenPair> {
        let access = self.store.get(STORAGE_KEY_ACCESS_TOKEN).ok().flatten()?;
        let refresh = self.store.get(STORAGE_KEY_REFRESH_TOKEN).ok().flatten()?;
        Some(TokenPair::new(access, refresh))
    }

    #[tracing::instrument(skip(self))]
    pub async fn login(&self, args: LoginReqArgs) -> Result<(), AuthError> {
        let _in_flight = self.begin(Operation::Login);
        tokio::time::sleep(self.delays.login()).await;

        let user = match self.directory.verify(&args.email, args.password).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "login failed");
                return Err(e);
            }
        };
        info!(id = %user.id, role = %user.role, "login successful");
        self.install(user);
        Ok(())
    }

    /// Creates the account with the permissions configured for its role and
    /// logs it in
    #[tracing::instrument(skip(self))]
    pub async fn signup(&self, args: SignupReqArgs) -> Result<(), AuthError> {
        let _in_flight = self.begin(Operation::Signup);
        tokio::time::sleep(self.delays.signup()).await;

        // A taken email is reported as such whatever else is wrong with the
        // input. `register` checks again after hashing
        if self.directory.contains(&args.email) {
            warn!("signup failed, email already registered");
            return Err(AuthError::EmailAlreadyExists);
        }
        let name: DisplayName = args.name.try_into()?;
        let email: Email = args.email.try_into()?;
        validate_new_password(&args.password)?;

        let user = UserInfo {
            id: UserId::new_random(),
            name,
            email,
            role: args.role,
            permissions: args.role.default_permissions(),
        };
        if let Err(e) = self.directory.register(user.clone(), args.password).await {
            warn!(error = %e, "signup failed");
            return Err(e);
        }
        info!(id = %user.id, role = %user.role, "signup successful");
        self.install(user);
        Ok(())
    }

    /// Always succeeds, storage failures are only logged
    #[tracing::instrument(skip(self))]
    pub fn logout(&self) {
        self.clear_session(ROUTE_LOGIN);
        info!("user logged out");
    }

    /// Tears the session down after the backend stopped accepting our tokens
    #[tracing::instrument(skip(self))]
    pub fn expire_session(&self) {
        self.clear_session(ROUTE_LOGIN);
        warn!("session expired");
    }

    #[tracing::instrument(skip(self))]
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetPasswordError> {
        let _in_flight = self.begin(Operation::RequestReset);
        let email: Email = email.try_into()?;
        tokio::time::sleep(self.delays.reset()).await;
        info!(%email, "password reset email sent");
        Ok(())
    }

    /// Any non-empty token is accepted
    #[tracing::instrument(skip(self))]
    pub async fn complete_reset(&self, args: ResetPasswordReqArgs) -> Result<(), ResetPasswordError> {
        let _in_flight = self.begin(Operation::CompleteReset);
        if args.token.expose_secret().trim().is_empty() {
            return Err(ResetPasswordError::MissingToken);
        }
        validate_new_password(&args.new_password)?;
        tokio::time::sleep(self.delays.reset()).await;
        info!("password reset successful");
        Ok(())
    }

    pub fn has_permission(&self, section: &str, action: Option<&str>) -> bool {
        self.user_info()
            .is_some_and(|user| user.has_permission(section, action))
    }

    pub fn can_access_section(&self, section: &str) -> bool {
        self.user_info()
            .is_some_and(|user| user.can_access_section(section))
    }

    pub fn user_info(&self) -> Option<Arc<UserInfo>> {
        self.lock().user.clone()
    }

    pub fn current_user(&self) -> Result<Arc<UserInfo>, NotLoggedInError> {
        self.user_info().ok_or(NotLoggedInError)
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        !self.lock().in_flight.is_empty()
    }

    pub fn state(&self) -> SessionState {
        let guard = self.lock();
        let pending = guard
            .in_flight
            .iter()
            .rev()
            .find(|x| matches!(x, Operation::Login | Operation::Signup))
            .copied();
        match (pending, &guard.user) {
            (Some(Operation::Login), _) => SessionState::LoggingIn,
            (Some(Operation::Signup), _) => SessionState::SigningUp,
            (_, Some(user)) => SessionState::LoggedIn(Arc::clone(user)),
            (_, None) => SessionState::LoggedOut,
        }
    }

    /// The page the UI should move to after the last session change, if any.
    /// Only returned once
    pub fn take_redirect(&self) -> Option<&'static str> {
        self.lock().redirect.take()
    }

    #[tracing::instrument(skip(self))]
    pub fn store_tokens(&self, tokens: TokenPair) {
        log_err_as_warn!(self
            .store
            .set(STORAGE_KEY_ACCESS_TOKEN, tokens.access.expose_secret()));
        log_err_as_warn!(self
            .store
            .set(STORAGE_KEY_REFRESH_TOKEN, tokens.refresh.expose_secret()));
        self.lock().tokens = Some(tokens);
    }

    pub fn access_token(&self) -> Option<SecretString> {
        self.lock().tokens.as_ref().map(|x| x.access.clone())
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.lock().tokens.as_ref().map(|x| x.refresh.clone())
    }

    fn install(&self, user: UserInfo) {
        match serde_json::to_string(&user) {
            Ok(json) => log_err_as_warn!(self.store.set(STORAGE_KEY_USER, &json)),
            Err(err) => warn!(?err, "failed to serialize user for storage"),
        }
        let mut guard = self.lock();
        guard.user = Some(Arc::new(user));
        guard.redirect = Some(ROUTE_DASHBOARD);
    }

    fn clear_session(&self, redirect: &'static str) {
        {
            let mut guard = self.lock();
            guard.user = None;
            guard.tokens = None;
            guard.redirect = Some(redirect);
        }
        for key in [
            STORAGE_KEY_USER,
            STORAGE_KEY_ACCESS_TOKEN,
            STORAGE_KEY_REFRESH_TOKEN,
        ] {
            log_err_as_warn!(self.store.remove(key));
        }
    }
}
