//! The store: one state tree for auth and files, plus dispatch/subscribe.

use crate::auth::{AuthAction, AuthState};
use crate::error::Rejection;
use crate::files::{FileAction, FileState};
use crate::host::Host;
use crate::session::{Session, SessionStorage};
use cloudbox_client::{ClientError, CloudboxClient};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Combined state of every module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub auth: AuthState,
    pub files: FileState,
}

/// Any action the store understands.
#[derive(Debug, Clone)]
pub enum Action {
    Auth(AuthAction),
    Files(FileAction),
}

impl From<AuthAction> for Action {
    fn from(action: AuthAction) -> Self {
        Action::Auth(action)
    }
}

impl From<FileAction> for Action {
    fn from(action: FileAction) -> Self {
        Action::Files(action)
    }
}

impl AppState {
    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::Auth(action) => self.auth.reduce(action),
            Action::Files(action) => self.files.reduce(action),
        }
    }
}

/// Process-wide state container.
///
/// Cheap to clone; clones share the same state. Every reducer step runs
/// inside [`watch::Sender::send_modify`], so steps never overlap and are
/// applied in the order operations settle.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    client: CloudboxClient,
    storage: Arc<dyn SessionStorage>,
    host: Arc<dyn Host>,
    state: watch::Sender<AppState>,
}

impl Store {
    pub fn new(
        client: CloudboxClient,
        storage: Arc<dyn SessionStorage>,
        host: Arc<dyn Host>,
    ) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            inner: Arc::new(Inner {
                client,
                storage,
                host,
                state,
            }),
        }
    }

    /// Apply an action to the state and notify subscribers.
    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        debug!(action = ?action, "Dispatching");
        self.inner.state.send_modify(|state| state.reduce(action));
    }

    /// Run `step` as one serialized reducer step.
    ///
    /// Used where a storage side effect and the state change it implies
    /// must not interleave with other steps. `step` must not dispatch.
    pub(crate) fn commit<T>(&self, step: impl FnOnce(&mut AppState) -> T) -> T {
        let mut output = None;
        self.inner.state.send_modify(|state| output = Some(step(state)));
        match output {
            Some(output) => output,
            None => unreachable!("send_modify always runs its closure"),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that is marked changed after every dispatch.
    ///
    /// Dropping the receiver is how a consumer unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    pub fn client(&self) -> &CloudboxClient {
        &self.inner.client
    }

    /// The session currently held in storage, if any.
    ///
    /// Storage failures are logged and treated as "no session".
    pub fn session(&self) -> Option<Session> {
        match self.inner.storage.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        }
    }

    pub(crate) fn storage(&self) -> &dyn SessionStorage {
        self.inner.storage.as_ref()
    }

    pub(crate) fn host(&self) -> &dyn Host {
        self.inner.host.as_ref()
    }

    /// Normalize a failed call made with `session`.
    ///
    /// An unauthorized answer also expires the session it was made with.
    pub(crate) fn reject(&self, session: &Session, err: ClientError) -> Rejection {
        let rejection = Rejection::from(err);
        if rejection.is_unauthorized() {
            self.expire_session(session);
        }
        rejection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStorage;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cloudbox_client::ClientConfig;

    struct NoopHost;

    #[async_trait]
    impl Host for NoopHost {
        async fn save_file(&self, _file_name: &str, _contents: Bytes) -> std::io::Result<()> {
            Ok(())
        }

        async fn open_url(&self, _url: &str) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn store() -> Store {
        let client = CloudboxClient::new(ClientConfig::new("http://localhost:9")).unwrap();
        Store::new(
            client,
            Arc::new(MemorySessionStorage::new()),
            Arc::new(NoopHost),
        )
    }

    #[test]
    fn test_dispatch_notifies_subscribers() {
        let store = store();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.dispatch(FileAction::FetchAllPending);

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().files.fetch_status.is_in_flight());
    }

    #[test]
    fn test_clones_share_state() {
        let store = store();
        let other = store.clone();

        other.dispatch(AuthAction::Pending);
        assert!(store.state().auth.loading);
    }

    #[test]
    fn test_dropped_subscribers_do_not_block_dispatch() {
        let store = store();
        drop(store.subscribe());

        store.dispatch(AuthAction::Pending);
        assert!(store.state().auth.loading);
    }
}
