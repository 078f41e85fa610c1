//! Profile store keeping one JSON document per user in a directory.
//!
//! Writes go to a hidden temporary file that is then renamed over the
//! target, so a crash never leaves a half-written profile behind. All file
//! access is confined to the opened directory through `cap-std`.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::{debug, warn};

use crate::domain::ports::{ProfileStore, ProfileStoreError};
use crate::domain::{CitizenState, UserId};

const EXTENSION: &str = ".json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct FileProfileStore {
    dir: Arc<Dir>,
    root: Utf8PathBuf,
}

impl FileProfileStore {
    /// Open (creating if needed) the profile directory at `root`.
    pub fn open(root: &Utf8Path) -> Result<Self, ProfileStoreError> {
        std::fs::create_dir_all(root)
            .map_err(|err| ProfileStoreError::io(format!("create {root}: {err}")))?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|err| ProfileStoreError::io(format!("open {root}: {err}")))?;
        Ok(Self {
            dir: Arc::new(dir),
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, ProfileStoreError>
    where
        F: FnOnce(&Dir) -> Result<T, ProfileStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || work(&dir))
            .await
            .map_err(|err| ProfileStoreError::io(format!("profile i/o task failed: {err}")))?
    }
}

fn file_name(user_id: &UserId) -> String {
    format!("{user_id}{EXTENSION}")
}

fn decode(name: &str, raw: &str) -> Result<CitizenState, ProfileStoreError> {
    serde_json::from_str(raw).map_err(|err| ProfileStoreError::corrupt(name, err.to_string()))
}

fn read_entry(dir: &Dir, name: &str) -> Result<Option<CitizenState>, ProfileStoreError> {
    match dir.read_to_string(name) {
        Ok(raw) => decode(name, &raw).map(Some),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ProfileStoreError::io(format!("read {name}: {err}"))),
    }
}

fn write_atomic(dir: &Dir, name: &str, contents: &[u8]) -> Result<(), ProfileStoreError> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{name}.tmp.{}.{counter}", std::process::id());
    let io_error = |err: std::io::Error| ProfileStoreError::io(format!("write {name}: {err}"));

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let written = dir.open_with(&tmp_name, &options).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(err) = written {
        drop(dir.remove_file(&tmp_name));
        return Err(io_error(err));
    }
    if let Err(err) = dir.rename(&tmp_name, dir, name) {
        drop(dir.remove_file(&tmp_name));
        return Err(io_error(err));
    }
    Ok(())
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<CitizenState>, ProfileStoreError> {
        let name = file_name(user_id);
        self.blocking(move |dir| read_entry(dir, &name)).await
    }

    async fn save(&self, state: &CitizenState) -> Result<(), ProfileStoreError> {
        let name = file_name(state.user.id());
        let contents = serde_json::to_vec_pretty(state)
            .map_err(|err| ProfileStoreError::corrupt(name.as_str(), err.to_string()))?;
        debug!(file = %name, bytes = contents.len(), "saving profile");
        self.blocking(move |dir| write_atomic(dir, &name, &contents))
            .await
    }

    async fn load_all(&self) -> Result<Vec<CitizenState>, ProfileStoreError> {
        self.blocking(|dir| {
            let entries = dir
                .entries()
                .map_err(|err| ProfileStoreError::io(format!("list profiles: {err}")))?;
            let mut states = Vec::new();
            for entry in entries {
                let entry =
                    entry.map_err(|err| ProfileStoreError::io(format!("list profiles: {err}")))?;
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if name.starts_with('.') || !name.ends_with(EXTENSION) {
                    continue;
                }
                match read_entry(dir, &name) {
                    Ok(Some(state)) => states.push(state),
                    Ok(None) => {}
                    Err(err) => warn!(file = %name, error = %err, "skipping unreadable profile"),
                }
            }
            Ok(states)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, User};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    fn store(temp: &TempDir) -> FileProfileStore {
        let root = Utf8Path::from_path(temp.path()).expect("utf-8 temp path");
        FileProfileStore::open(&root.join("profiles")).expect("open store")
    }

    fn state(email: &str) -> CitizenState {
        CitizenState::new(User::new(
            UserId::for_email(email),
            "File User",
            email,
            Role::Citizen,
            None,
        ))
    }

    #[rstest]
    #[tokio::test]
    async fn saved_profiles_survive_reopening(temp: TempDir) {
        let saved = state("file@example.org");
        store(&temp).save(&saved).await.expect("save");

        let loaded = store(&temp)
            .load(saved.user.id())
            .await
            .expect("load")
            .expect("present");

        assert_eq!(loaded, saved);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_profile_loads_as_none(temp: TempDir) {
        let loaded = store(&temp)
            .load(&UserId::for_email("nobody@example.org"))
            .await
            .expect("load");
        assert!(loaded.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn load_all_skips_corrupt_and_temporary_files(temp: TempDir) {
        let store = store(&temp);
        store.save(&state("a@example.org")).await.expect("save a");
        store.save(&state("b@example.org")).await.expect("save b");
        std::fs::write(store.root().join("broken.json"), "{").expect("write corrupt");
        std::fs::write(store.root().join(".pending.json.tmp.1.0"), "{}").expect("write temp");

        let all = store.load_all().await.expect("load all");

        assert_eq!(all.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_profile_is_reported(temp: TempDir) {
        let store = store(&temp);
        let id = UserId::for_email("bad@example.org");
        std::fs::write(store.root().join(file_name(&id)), "not json").expect("write corrupt");

        let err = store.load(&id).await.expect_err("corrupt");

        assert!(matches!(err, ProfileStoreError::Corrupt { .. }));
    }
}
