//! CLI command implementations.

mod events;
mod guests;
mod import;
mod show;

pub use events::{events_list, events_set};
pub use guests::{guests_add, guests_arrive, guests_edit, guests_remove};
pub use import::guests_import;
pub use show::{columns, show};

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use guest_roster::{EventConfig, EventKey, GuestKey, GuestPath, MemoryGuestStore, Roster};
use guestlist_config_and_utils::{Config, Paths};
use tracing::debug;

/// The loaded guest database plus the settings it was opened with.
///
/// Commands act through `roster` and call [`Workspace::save`] after a
/// successful write.
pub struct Workspace {
    paths: Paths,
    config: Config,
    store: Arc<MemoryGuestStore>,
    roster: Roster<MemoryGuestStore>,
}

impl Workspace {
    /// Loads the data file, or starts empty when there is none yet.
    pub fn open(paths: Paths, config: Config) -> Result<Self> {
        let store = Arc::new(load_store(&paths.data_file())?);
        let roster = Roster::new(Arc::clone(&store));
        Ok(Self {
            paths,
            config,
            store,
            roster,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &MemoryGuestStore {
        &self.store
    }

    pub fn roster(&self) -> &Roster<MemoryGuestStore> {
        &self.roster
    }

    /// Looks up a configured event.
    pub fn event(&self, key: &str) -> Result<EventConfig> {
        self.store
            .event(&EventKey::from(key))
            .with_context(|| format!("unknown event '{}' (see `guestlist events list`)", key))
    }

    /// Resolves a guest path within a configured event.
    pub fn guest_path(&self, event: &str, guest: &str) -> Result<GuestPath> {
        let event = self.event(event)?;
        Ok(GuestPath::new(event.key, GuestKey::from(guest)))
    }

    /// Writes the database back to the data file.
    pub fn save(&self) -> Result<()> {
        self.paths.ensure_dirs()?;
        save_store(&self.store, &self.paths.data_file())
    }
}

fn load_store(path: &Path) -> Result<MemoryGuestStore> {
    if !path.exists() {
        debug!(path = %path.display(), "no data file, starting empty");
        return Ok(MemoryGuestStore::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid data file {}", path.display()))?;
    Ok(MemoryGuestStore::from_json(&value)?)
}

/// Writes through a sibling temp file so an interrupted save keeps the old data.
fn save_store(store: &MemoryGuestStore, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&store.export_json()?)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    debug!(path = %path.display(), "data file saved");
    Ok(())
}
