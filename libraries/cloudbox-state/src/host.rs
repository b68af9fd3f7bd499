//! Side effects the store asks its host environment to perform.

use async_trait::async_trait;
use bytes::Bytes;

/// The environment a store runs in.
///
/// Downloads end with [`Host::save_file`]; previews with [`Host::open_url`].
#[async_trait]
pub trait Host: Send + Sync {
    /// Hand a downloaded file to the user.
    async fn save_file(&self, file_name: &str, contents: Bytes) -> std::io::Result<()>;

    /// Show `url` to the user in a new view.
    async fn open_url(&self, url: &str) -> std::io::Result<()>;
}
