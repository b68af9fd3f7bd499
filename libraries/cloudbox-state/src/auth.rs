//! Auth state module: session identity, login and registration.

use crate::error::Rejection;
use crate::files::FileAction;
use crate::session::Session;
use crate::store::Store;
use cloudbox_client::{AuthResponse, ErrorKind};
use tracing::{info, warn};

/// Authentication slice of the state tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    /// A login or registration is in flight
    pub loading: bool,
    /// Outcome of the last failed attempt; cleared by the next attempt
    pub error: Option<Rejection>,
    /// Set when the server rejected the session; consumers send the user
    /// back to sign-in
    pub session_expired: bool,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    Pending,
    Fulfilled(Session),
    Rejected(Rejection),
    SessionRestored(Session),
    SignedOut,
    SessionExpired,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn reduce(&mut self, action: AuthAction) {
        match action {
            AuthAction::Pending => {
                self.loading = true;
                self.error = None;
            }
            AuthAction::Fulfilled(session) => {
                self.loading = false;
                self.error = None;
                self.session = Some(session);
                self.session_expired = false;
            }
            AuthAction::Rejected(rejection) => {
                self.loading = false;
                self.error = Some(rejection);
            }
            AuthAction::SessionRestored(session) => {
                self.session = Some(session);
                self.session_expired = false;
            }
            AuthAction::SignedOut => {
                *self = AuthState::default();
            }
            AuthAction::SessionExpired => {
                self.session = None;
                self.session_expired = true;
            }
        }
    }
}

impl Store {
    /// Sign in and persist the resulting session.
    ///
    /// Concurrent logins are not deduplicated; whichever settles last owns
    /// the state and the stored session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Rejection> {
        self.dispatch(AuthAction::Pending);
        let result = self.client().auth().login(email, password).await;
        self.settle_auth(result)
    }

    /// Create an account, then behave like [`Store::login`].
    ///
    /// A password shorter than six characters is rejected without a request.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, Rejection> {
        self.dispatch(AuthAction::Pending);
        let result = self.client().auth().register(name, email, password).await;
        self.settle_auth(result)
    }

    fn settle_auth(
        &self,
        result: cloudbox_client::Result<AuthResponse>,
    ) -> Result<Session, Rejection> {
        let session = match result {
            Ok(response) => Session::from(response),
            Err(e) => {
                let rejection = Rejection::from(e);
                self.dispatch(AuthAction::Rejected(rejection.clone()));
                return Err(rejection);
            }
        };

        // Storage and state change together so the last login to settle
        // owns both
        self.commit(|state| match self.storage().store(&session) {
            Ok(()) => {
                state.auth.reduce(AuthAction::Fulfilled(session.clone()));
                Ok(session)
            }
            Err(e) => {
                let rejection = Rejection::new(
                    ErrorKind::Local,
                    format!("Failed to store session: {}", e),
                );
                state.auth.reduce(AuthAction::Rejected(rejection.clone()));
                Err(rejection)
            }
        })
    }

    /// Load a session left in storage by an earlier run.
    pub fn restore_session(&self) -> crate::error::Result<Option<Session>> {
        let session = self.storage().load()?;
        if let Some(session) = &session {
            self.dispatch(AuthAction::SessionRestored(session.clone()));
        }
        Ok(session)
    }

    /// Clear the stored session and reset auth and file state.
    ///
    /// Returns whether a session was stored.
    pub fn sign_out(&self) -> crate::error::Result<bool> {
        let cleared = self.commit(|state| {
            let cleared = self.storage().clear();
            state.auth.reduce(AuthAction::SignedOut);
            state.files.reduce(FileAction::Reset);
            cleared
        })?;

        if cleared {
            info!("Signed out");
        }
        Ok(cleared)
    }

    /// Tear down `session` after the server rejected it.
    ///
    /// Only clears storage if it still holds this session's token, so a stale
    /// response cannot sign out a newer session, and two rejections of the
    /// same token clear it once. Returns whether this call cleared it.
    pub fn expire_session(&self, session: &Session) -> bool {
        let cleared = self.commit(|state| {
            let cleared = self.storage().clear_token(&session.token);
            if matches!(cleared, Ok(true)) {
                state.auth.reduce(AuthAction::SessionExpired);
            }
            cleared
        });

        match cleared {
            Ok(true) => {
                warn!("Session rejected by server; stored token cleared");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "Failed to clear stored session");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection() -> Rejection {
        Rejection::new(ErrorKind::Auth, "Invalid credentials")
    }

    #[test]
    fn test_login_state_machine() {
        let mut state = AuthState::default();

        state.reduce(AuthAction::Pending);
        assert!(state.loading);
        assert!(state.error.is_none());

        state.reduce(AuthAction::Rejected(rejection()));
        assert!(!state.loading);
        assert_eq!(state.error, Some(rejection()));

        // A new attempt clears the previous error
        state.reduce(AuthAction::Pending);
        assert!(state.error.is_none());

        state.reduce(AuthAction::Fulfilled(Session::new("t")));
        assert!(!state.loading);
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_session_expired_then_login() {
        let mut state = AuthState::default();
        state.reduce(AuthAction::Fulfilled(Session::new("t")));

        state.reduce(AuthAction::SessionExpired);
        assert!(!state.is_authenticated());
        assert!(state.session_expired);

        state.reduce(AuthAction::Pending);
        state.reduce(AuthAction::Fulfilled(Session::new("t2")));
        assert!(!state.session_expired);
    }

    #[test]
    fn test_sign_out_resets_everything() {
        let mut state = AuthState::default();
        state.reduce(AuthAction::Rejected(rejection()));
        state.reduce(AuthAction::SessionRestored(Session::new("t")));

        state.reduce(AuthAction::SignedOut);
        assert_eq!(state, AuthState::default());
    }
}
