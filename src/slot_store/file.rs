//! A directory tree implementation of the [`SlotStore`][super::SlotStore] trait.
//!
//! Each zone gets a directory under the store root, and each slot a file nested one directory
//! per word, e.g. `data/words.example.com/correct/horse/battery`. A slot file contains the
//! registered IP address as text.
use crate::error::Error;
use crate::slot_store::SlotStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const STAGING_DIR: &str = ".staging";

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A file-backed slot store. Slots are claimed by writing their content to a staging file and
/// hard linking it into place, so a slot file is never seen partially written and never
/// replaced once it exists.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileSlotStore {
    root: PathBuf,
}

impl FileSlotStore {
    /// Open a [`FileSlotStore`] rooted at the given directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathIO`] if the directory can't be created.
    pub async fn try_from_dir(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        let staging = root.join(STAGING_DIR);
        fs::create_dir_all(&staging)
            .await
            .map_err(|err| Error::PathIO(staging, err))?;
        Ok(Self { root })
    }

    fn slot_path(&self, zone: &str, words: &[&str]) -> PathBuf {
        let mut path = self.root.join(zone);
        path.extend(words);
        path
    }

    fn staging_path(&self) -> PathBuf {
        let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(STAGING_DIR)
            .join(format!("{}-{n}", std::process::id()))
    }

    async fn link_into_place(staged: &Path, dest: &Path) -> Result<bool, Error> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        match fs::hard_link(staged, dest).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(Error::PathIO(dest.to_path_buf(), err)),
        }
    }
}

#[async_trait::async_trait]
impl SlotStore for FileSlotStore {
    async fn read_slot(&self, zone: &str, words: &[&str]) -> Result<Option<String>, Error> {
        let path = self.slot_path(zone, words);
        match fs::read(&path).await {
            Ok(raw) => Ok(Some(String::from_utf8_lossy(&raw).into_owned())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::PathIO(path, err)),
        }
    }

    async fn create_slot(&self, zone: &str, words: &[&str], content: &str) -> Result<bool, Error> {
        let dest = self.slot_path(zone, words);
        let staged = self.staging_path();
        fs::write(&staged, content)
            .await
            .map_err(|err| Error::PathIO(staged.clone(), err))?;
        let linked = Self::link_into_place(&staged, &dest).await;
        if let Err(err) = fs::remove_file(&staged).await {
            tracing::warn!("failed to remove staging file {}: {err}", staged.display());
        }
        linked
    }

    async fn remove_slot(&self, zone: &str, words: &[&str]) -> Result<(), Error> {
        let path = self.slot_path(zone, words);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::PathIO(path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slots_are_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSlotStore::try_from_dir(dir.path()).await.unwrap();

        assert_eq!(store.read_slot("w.example", &["a", "b"]).await.unwrap(), None);
        assert!(store
            .create_slot("w.example", &["a", "b"], "2001:db8::1")
            .await
            .unwrap());

        let on_disk = std::fs::read_to_string(dir.path().join("w.example").join("a").join("b"))
            .unwrap();
        assert_eq!(on_disk, "2001:db8::1");

        let staged: Vec<_> = std::fs::read_dir(dir.path().join(STAGING_DIR))
            .unwrap()
            .collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn create_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSlotStore::try_from_dir(dir.path()).await.unwrap();

        assert!(store.create_slot("z", &["a"], "192.0.2.1").await.unwrap());
        assert!(!store.create_slot("z", &["a"], "192.0.2.2").await.unwrap());
        assert_eq!(
            store.read_slot("z", &["a"]).await.unwrap().as_deref(),
            Some("192.0.2.1")
        );
    }

    #[tokio::test]
    async fn concurrent_creates_have_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileSlotStore::try_from_dir(dir.path()).await.unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_slot("z", &["a", "b"], &format!("192.0.2.{i}"))
                        .await
                        .unwrap()
                })
            })
            .collect();
        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn remove_and_reread() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSlotStore::try_from_dir(dir.path()).await.unwrap();

        std::fs::create_dir_all(dir.path().join("z")).unwrap();
        std::fs::write(dir.path().join("z").join("a"), b"\xff\xfe").unwrap();
        assert!(store.read_slot("z", &["a"]).await.unwrap().is_some());

        store.remove_slot("z", &["a"]).await.unwrap();
        store.remove_slot("z", &["a"]).await.unwrap();
        assert_eq!(store.read_slot("z", &["a"]).await.unwrap(), None);
    }
}
