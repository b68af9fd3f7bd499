//! Cloudbox State
//!
//! Client-side state layer for Cloudbox: who is signed in, which files the
//! server holds, and the operations that change either.
//!
//! # Overview
//!
//! - **Store**: one [`AppState`] tree behind a [`tokio::sync::watch`]
//!   channel. Operations dispatch actions; subscribers see every change.
//! - **Auth**: login, registration, session restore and sign-out.
//! - **Files**: fetch, upload, optimistic delete, download and preview.
//! - **Refresh**: [`RefreshTask`] re-fetches the collection on an interval.
//!
//! Every failed operation settles with a [`Rejection`]. An unauthorized
//! answer additionally clears the stored session and sets
//! [`AuthState::session_expired`].
//!
//! # Example
//!
//! ```ignore
//! use cloudbox_client::{ClientConfig, CloudboxClient};
//! use cloudbox_state::{MemorySessionStorage, Store};
//! use std::sync::Arc;
//!
//! let client = CloudboxClient::new(ClientConfig::new("https://files.example.com/api"))?;
//! let store = Store::new(client, Arc::new(MemorySessionStorage::new()), host);
//!
//! let session = store.login("ada@example.com", "secret").await?;
//! let files = store.fetch_all(&session).await?;
//! ```

mod auth;
mod error;
mod files;
mod host;
mod refresh;
mod session;
mod store;

pub use auth::{AuthAction, AuthState};
pub use error::{Rejection, Result, StateError};
pub use files::{
    DeletionPhase, DownloadOutcome, FileAction, FileState, OperationStatus, PendingDeletion,
};
pub use host::Host;
pub use refresh::{ErrorPolicy, RefreshTask, DEFAULT_REFRESH_INTERVAL};
pub use session::{FileSessionStorage, MemorySessionStorage, Session, SessionStorage, SESSION_KEY};
pub use store::{Action, AppState, Store};

pub use cloudbox_client::{ErrorKind, FileRecord, PreviewDescriptor, UploadFile, UserProfile};
