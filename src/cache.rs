// Memo for the parse step, keyed by file identity.
//
// Only the parsed tickets are cached; every report is still computed from
// scratch so a different config or current period never sees stale results.
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::error::Result;
use crate::loader::{self, LoadReport};
use crate::types::Ticket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(FileIdentity {
            path: std::fs::canonicalize(path)?,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
pub struct LoadedFile {
    pub tickets: Vec<Ticket>,
    pub report: LoadReport,
}

struct CacheEntry {
    identity: FileIdentity,
    dropped: Vec<String>,
    loaded: Arc<LoadedFile>,
}

static LAST_LOAD: Lazy<Mutex<Option<CacheEntry>>> = Lazy::new(|| Mutex::new(None));

/// Load `path`, reusing the previous parse if the file and the dropped
/// column list are unchanged.
pub fn load_cached(path: &Path, dropped: &[String]) -> Result<Arc<LoadedFile>> {
    let identity = FileIdentity::of(path)?;
    {
        let guard = LAST_LOAD.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = &*guard {
            if entry.identity == identity && entry.dropped == dropped {
                log::debug!("Reusing parsed tickets for {}", identity.path.display());
                return Ok(Arc::clone(&entry.loaded));
            }
        }
    }

    let (tickets, report) = loader::load_tickets(path, dropped)?;
    let loaded = Arc::new(LoadedFile { tickets, report });
    let mut guard = LAST_LOAD.lock().unwrap_or_else(|e| e.into_inner());
    *guard = Some(CacheEntry {
        identity,
        dropped: dropped.to_vec(),
        loaded: Arc::clone(&loaded),
    });
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use std::io::Write;

    const CSV: &str = "Id,Client,Status,Type,Subject,Priority,Requested,Environment,Product,Updated\n\
                       1,A,Open,Bug,S,Low,2024-02-01,Dev,Portal,\n";

    #[test]
    fn test_same_file_is_reused_and_changed_file_reloaded() {
        let dropped = ReportConfig::default().dropped_columns;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(CSV.as_bytes()).unwrap();
        f.flush().unwrap();

        let first = load_cached(f.path(), &dropped).unwrap();
        let second = load_cached(f.path(), &dropped).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.tickets.len(), 1);

        // Appending changes the length, so the identity no longer matches.
        f.write_all(b"2,B,Open,Bug,S,Low,2024-02-02,Dev,Portal,\n").unwrap();
        f.flush().unwrap();
        let third = load_cached(f.path(), &dropped).unwrap();
        assert_eq!(third.tickets.len(), 2);
    }
}
