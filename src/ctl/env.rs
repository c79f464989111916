use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Environment entries staged for one test run.
///
/// Staging never touches the process environment. [`ScopedEnv::export`]
/// applies the staged entries, remembering what each key held before, and
/// [`ScopedEnv::restore`] puts those values back. Restoring is idempotent and
/// also happens on drop.
#[derive(Debug, Default)]
pub struct ScopedEnv {
    staged: BTreeMap<String, String>,
    saved: BTreeMap<String, Option<OsString>>,
}

/// Run-wide handle shared between the context clones and teardown
pub type SharedEnv = Arc<Mutex<ScopedEnv>>;

impl ScopedEnv {
    pub fn shared() -> SharedEnv {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn stage(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.staged.insert(key.into(), value.into());
    }

    pub fn stage_all(
        &mut self,
        entries: impl IntoIterator<Item = (String, String)>,
    ) {
        self.staged.extend(entries);
    }

    pub fn staged(&self) -> &BTreeMap<String, String> {
        &self.staged
    }

    /// Whether the process environment currently carries staged entries
    pub fn is_exported(&self) -> bool {
        !self.saved.is_empty()
    }

    /// Apply every staged entry to the process environment.
    ///
    /// The value a key held before its first export is kept, so exporting
    /// repeatedly still restores the original environment.
    pub fn export(&mut self) {
        for (key, value) in &self.staged {
            self.saved
                .entry(key.clone())
                .or_insert_with(|| env::var_os(key));
            env::set_var(key, value);
        }
    }

    /// Put back every exported key and drop the staged entries.
    pub fn restore(&mut self) {
        let saved = mem::take(&mut self.saved);
        if !saved.is_empty() {
            debug!("restoring {} environment entries", saved.len());
        }
        for (key, previous) in saved {
            match previous {
                Some(value) => env::set_var(&key, value),
                None => env::remove_var(&key),
            }
        }
        self.staged.clear();
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        self.restore();
    }
}
