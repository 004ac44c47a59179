use std::{
    ffi::OsString,
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, error, info, warn};

use super::{activity::ActivityStore, entities::ActivityEntity};

/// Interface for abstracting where the activity store is persisted.
pub trait ActivityRepository {
    /// Reads the persisted store. Missing or unreadable data is not an error, an empty store is
    /// returned instead. Fails only if unreadable data can't be kept out of the way of the next
    /// save.
    fn load(&self) -> impl Future<Output = Result<ActivityStore>>;

    /// Replaces everything persisted with `records`.
    fn save(&self, records: &[ActivityEntity]) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> ActivityRepository for T
where
    T::Target: ActivityRepository,
{
    fn load(&self) -> impl Future<Output = Result<ActivityStore>> {
        self.deref().load()
    }

    fn save(&self, records: &[ActivityEntity]) -> impl Future<Output = Result<()>> {
        self.deref().save(records)
    }
}

/// The main realization of [ActivityRepository]. The store lives in a single JSON file which is
/// rewritten as a whole on every save. Writes go to a temporary file in the same directory that
/// is then renamed over the target, so an interrupted write never leaves a truncated file behind.
pub struct ActivityFile {
    path: PathBuf,
    read_only: bool,
}

impl ActivityFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            read_only: false,
        }
    }

    /// Never touches the file. Unreadable files are left where they are and saving fails.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| anyhow!("{:?} doesn't name a file", self.path))?;
        let mut tmp_name = OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(".tmp");
        Ok(self.path.with_file_name(tmp_name))
    }

    /// First of `<file>.corrupt`, `<file>.corrupt.1`, ... that doesn't exist yet, so an earlier
    /// quarantined file is never replaced.
    fn corrupt_path(&self) -> PathBuf {
        let mut base = self.path.clone().into_os_string();
        base.push(".corrupt");
        let base = PathBuf::from(base);
        let mut candidate = base.clone();
        let mut counter = 0;
        while candidate.exists() {
            counter += 1;
            let mut name = base.clone().into_os_string();
            name.push(format!(".{counter}"));
            candidate = PathBuf::from(name);
        }
        candidate
    }

    async fn read_records(path: &Path) -> Result<Vec<ActivityEntity>, std::io::Error> {
        debug!("Reading activities from {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        if content.trim().is_empty() {
            return Ok(vec![]);
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Moves an unreadable file out of the way, otherwise the next save would overwrite whatever
    /// the user had in it. Read only files are left alone.
    async fn quarantine(&self) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let target = self.corrupt_path();
        tokio::fs::rename(&self.path, &target)
            .await
            .inspect_err(|e| error!("Failed to move unreadable {:?} aside {e:?}", self.path))
            .with_context(|| format!("{:?} can't be read and can't be moved aside", self.path))?;
        warn!("Moved unreadable {:?} to {:?}", self.path, target);
        Ok(())
    }

    fn encode(records: &[ActivityEntity]) -> Result<Vec<u8>> {
        let mut buffer = Vec::<u8>::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        records.serialize(&mut serializer)?;
        buffer.push(b'\n');
        Ok(buffer)
    }
}

impl ActivityRepository for ActivityFile {
    async fn load(&self) -> Result<ActivityStore> {
        match Self::read_records(&self.path).await {
            Ok(records) => {
                let store = ActivityStore::load(records);
                info!("Loaded {} activities from {:?}", store.len(), self.path);
                Ok(store)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{:?} doesn't exist, starting with no activities", self.path);
                Ok(ActivityStore::new())
            }
            Err(e) if matches!(e.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) => {
                warn!("{:?} is malformed, starting with no activities: {e}", self.path);
                self.quarantine().await?;
                Ok(ActivityStore::new())
            }
            Err(e) => {
                warn!("Failed to read {:?}, starting with no activities: {e}", self.path);
                self.quarantine().await?;
                Ok(ActivityStore::new())
            }
        }
    }

    async fn save(&self, records: &[ActivityEntity]) -> Result<()> {
        if self.read_only {
            return Err(anyhow!("{:?} was opened read only", self.path));
        }
        if let Some(parent) = self.path.parent().filter(|v| !v.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {parent:?}"))?;
        }

        let buffer = Self::encode(records)?;
        let tmp_path = self.temp_path()?;

        let mut file = File::create(&tmp_path)
            .await
            .with_context(|| format!("Failed to create {tmp_path:?}"))?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        debug!("Wrote {} bytes into {:?}", buffer.len(), self.path);
        Ok(())
    }
}
