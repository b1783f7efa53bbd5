//! Persisted client state: the watch-list and the provider credential.
//!
//! Both live as small files in one data directory (by default
//! `<config dir>/stock_xml`). Persistence is best effort: failures are logged
//! and swallowed, and the in-memory state stays authoritative for the session.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, error};
use stock_common::{Result, StockError, Watchlist};

/// File holding the serialized watch-list.
pub const STOCK_LIST_FILE: &str = "cinegy_stock_list.json";
/// File holding the provider credential.
pub const API_KEY_FILE: &str = "api_key";

/// Directory-backed store for the watch-list and the API key.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    dir: PathBuf,
}

impl WatchlistStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/stock_xml`, or `./stock_xml` when the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stock_xml")
    }

    /// Directory the files live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn list_path(&self) -> PathBuf {
        self.dir.join(STOCK_LIST_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(API_KEY_FILE)
    }

    /// Persist `list`, logging instead of failing.
    pub fn save(&self, list: &Watchlist) {
        match self.try_save(list) {
            Ok(()) => debug!("Saved {} stocks to {}", list.len(), self.list_path().display()),
            Err(e) => error!("Failed to save stock list: {}", e),
        }
    }

    fn try_save(&self, list: &Watchlist) -> Result<()> {
        let json = serde_json::to_string_pretty(list)?;
        self.write(&self.list_path(), &json)
    }

    /// Persisted watch-list; empty when nothing was saved or the file is unreadable.
    pub fn load(&self) -> Watchlist {
        let path = self.list_path();
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                error!("Failed to load stock list from {}: {}", path.display(), e);
                Watchlist::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Watchlist::new(),
            Err(e) => {
                error!("Failed to load stock list from {}: {}", path.display(), e);
                Watchlist::new()
            }
        }
    }

    /// Remove the persisted watch-list.
    pub fn clear(&self) {
        remove_quietly(&self.list_path(), "stock list");
    }

    /// Persist the API key, logging instead of failing.
    pub fn save_api_key(&self, api_key: &str) {
        if let Err(e) = self.write(&self.key_path(), api_key.trim()) {
            error!("Failed to save API key: {}", e);
        }
    }

    /// Stored API key, if any.
    pub fn load_api_key(&self) -> Option<String> {
        match fs::read_to_string(self.key_path()) {
            Ok(key) => Some(key.trim().to_string()).filter(|key| !key.is_empty()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                error!("Failed to load API key: {}", e);
                None
            }
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let persistence = |e: std::io::Error| {
            StockError::Persistence(format!("{}: {}", path.display(), e))
        };
        fs::create_dir_all(&self.dir).map_err(persistence)?;
        fs::write(path, content).map_err(persistence)
    }
}

fn remove_quietly(path: &Path, what: &str) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => error!("Failed to clear {}: {}", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stock_common::{SymbolRecord, WatchlistEntry};

    fn sample() -> Watchlist {
        let mut list = Watchlist::new();
        let mut aapl = WatchlistEntry::new(SymbolRecord::new("AAPL", "Apple Inc"));
        aapl.price = 150.5;
        list.add(aapl);
        list.add(SymbolRecord::new("MSFT", "Microsoft"));
        list
    }

    #[test]
    fn save_then_load_restores_order_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("nested"));

        store.save(&sample());
        let loaded = store.load();
        assert_eq!(loaded, sample());
        assert_eq!(loaded.symbols(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn missing_or_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        assert!(store.load().is_empty());

        fs::write(dir.path().join(STOCK_LIST_FILE), "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn clear_removes_the_list_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        store.save(&sample());
        store.save_api_key("secret");

        store.clear();
        store.clear();
        assert!(store.load().is_empty());
        assert_eq!(store.load_api_key().as_deref(), Some("secret"));
    }

    #[test]
    fn api_key_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        assert_eq!(store.load_api_key(), None);

        store.save_api_key("  secret\n");
        assert_eq!(store.load_api_key().as_deref(), Some("secret"));

        store.save_api_key("   ");
        assert_eq!(store.load_api_key(), None);
    }

    #[test]
    fn save_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let store = WatchlistStore::new(blocker.join("sub"));

        store.save(&sample());
        assert!(store.load().is_empty());
    }
}
