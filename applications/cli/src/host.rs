//! Terminal host: downloads land in a directory, previews are printed.

use async_trait::async_trait;
use bytes::Bytes;
use cloudbox_state::Host;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DirectoryHost {
    dir: PathBuf,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target path for `file_name`, keeping only its final component.
    pub fn target(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "..")
            .unwrap_or("download");
        self.dir.join(name)
    }
}

#[async_trait]
impl Host for DirectoryHost {
    async fn save_file(&self, file_name: &str, contents: Bytes) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.target(file_name);
        tokio::fs::write(&path, &contents).await?;

        info!(path = %path.display(), bytes = contents.len(), "File saved");
        Ok(())
    }

    async fn open_url(&self, url: &str) -> std::io::Result<()> {
        println!("Preview: {}", url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_strips_directories() {
        let host = DirectoryHost::new("/downloads");
        assert_eq!(host.target("report.pdf"), PathBuf::from("/downloads/report.pdf"));
        assert_eq!(host.target("../../etc/passwd"), PathBuf::from("/downloads/passwd"));
        assert_eq!(host.target(".."), PathBuf::from("/downloads/download"));
    }

    #[tokio::test]
    async fn test_save_file_writes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path().join("out"));

        host.save_file("notes.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("out/notes.txt")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[tokio::test]
    async fn test_save_file_lands_at_target() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path());

        host.save_file("../escape.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let target = host.target("../escape.txt");
        assert_eq!(target, dir.path().join("escape.txt"));
        assert_eq!(std::fs::read(target).unwrap(), b"x");
    }
}
