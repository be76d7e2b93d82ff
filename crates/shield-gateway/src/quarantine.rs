//! Quarantined payload storage: one file per quarantined request, made
//! read-only immediately after writing so nothing in-process can tamper
//! with it afterward.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;

pub struct QuarantineStore {
    root: PathBuf,
}

impl QuarantineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes `payload` under `<root>/files/<timestamp>_<basename>` and
    /// returns that relative id. `basename` should already be filesystem-safe;
    /// callers typically pass the session id or a request counter.
    pub fn persist(&self, now: i64, basename: &str, payload: &[u8]) -> Result<String> {
        let dir = self.root.join("files");
        fs::create_dir_all(&dir)?;
        let id = format!("{now}_{basename}");
        let path = dir.join(&id);
        fs::write(&path, payload)?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms)?;
        Ok(id)
    }

    pub fn load(&self, id: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join("files").join(id))?)
    }
}
