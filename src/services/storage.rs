//! Uploaded file storage on the local filesystem, served under `/uploads`

use anyhow::{anyhow, Context, Result};
use std::path::{Component, Path, PathBuf};

pub const PUBLIC_PREFIX: &str = "/uploads";

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under `key` (e.g. `profile-pictures/<uid>.png`), replacing
    /// any existing file, and return its public URL path.
    pub async fn save(&self, key: &str, bytes: &[u8]) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, key))
    }

    /// Save `<dir>/<stem>.<ext>` and delete any `<dir>/<stem>.*` written
    /// earlier under another extension.
    pub async fn replace(&self, dir: &str, stem: &str, ext: &str, bytes: &[u8]) -> Result<String> {
        let kept = format!("{}.{}", stem, ext);
        let url = self.save(&format!("{}/{}", dir, kept), bytes).await?;

        let dir_path = self.resolve(dir)?;
        let mut entries = tokio::fs::read_dir(&dir_path)
            .await
            .with_context(|| format!("Failed to read {}", dir_path.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let stale = name != kept
                && name
                    .strip_prefix(stem)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|other_ext| !other_ext.contains('.'));
            if stale {
                self.remove(&format!("{}/{}", dir, name)).await?;
                tracing::debug!("Removed stale upload {}/{}", dir, name);
            }
        }
        Ok(url)
    }

    /// Delete the file under `key`. Returns `false` if there was none.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(anyhow!("Invalid storage key: {}", key));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());

        let url = storage.save("profile-pictures/u1.png", b"first").await.unwrap();
        assert_eq!(url, "/uploads/profile-pictures/u1.png");
        storage.save("profile-pictures/u1.png", b"second").await.unwrap();

        let written = std::fs::read(dir.path().join("profile-pictures/u1.png")).unwrap();
        assert_eq!(written, b"second");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.save("../evil.png", b"x").await.is_err());
        assert!(storage.save("/etc/passwd", b"x").await.is_err());
        assert!(storage.save("", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_replace_removes_other_extensions() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.save("profile-pictures/u1.png", b"old").await.unwrap();
        storage.save("profile-pictures/u12.png", b"other user").await.unwrap();

        let url = storage
            .replace("profile-pictures", "u1", "jpg", b"new")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/profile-pictures/u1.jpg");

        let pictures = dir.path().join("profile-pictures");
        assert!(!pictures.join("u1.png").exists());
        assert_eq!(std::fs::read(pictures.join("u1.jpg")).unwrap(), b"new");
        assert!(pictures.join("u12.png").exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.save("a/b.png", b"x").await.unwrap();
        assert!(storage.remove("a/b.png").await.unwrap());
        assert!(!storage.remove("a/b.png").await.unwrap());
        assert!(storage.remove("../b.png").await.is_err());
    }
}
