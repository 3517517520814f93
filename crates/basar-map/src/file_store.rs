//! JSON-file backed polygon store.
//!
//! The whole store is one JSON snapshot (`{"next_id": .., "polygons": [..]}`).
//! Each mutation is applied to a copy of the in-memory state, the copy is
//! written to `<path>.tmp` and renamed over `<path>`, and only then does the
//! copy become the live state. A failed write leaves both the file and the
//! loaded state as they were.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::geometry::Polygon;
use crate::store::{MemoryStore, NewPolygon, PolygonId, PolygonRecord, PolygonStore, StoreError};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: MemoryStore,
}

impl JsonFileStore {
    /// Load the store at `path`. A missing file is an empty store; the file
    /// is created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                MemoryStore::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            MemoryStore::new()
        };
        debug!(path = %path.display(), records = state.len(), "store loaded");
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `change` against a copy of the state and persist it. The live
    /// state is replaced only after the snapshot is on disk.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.state.clone();
        let value = change(&mut next)?;
        self.write_snapshot(&next)?;
        self.state = next;
        Ok(value)
    }

    fn write_snapshot(&self, state: &MemoryStore) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_vec_pretty(state)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), records = state.len(), "store snapshot written");
        Ok(())
    }
}

impl PolygonStore for JsonFileStore {
    fn get_all(&self) -> Result<Vec<PolygonRecord>, StoreError> {
        self.state.get_all()
    }

    fn get_by_id(&self, id: PolygonId) -> Result<PolygonRecord, StoreError> {
        self.state.get_by_id(id)
    }

    fn create(&mut self, polygon: NewPolygon) -> Result<PolygonRecord, StoreError> {
        self.commit(|state| state.create(polygon))
    }

    fn update(&mut self, id: PolygonId, polygon: NewPolygon) -> Result<PolygonRecord, StoreError> {
        self.commit(|state| state.update(id, polygon))
    }

    fn delete(&mut self, id: PolygonId) -> Result<bool, StoreError> {
        if !self.state.exists(id)? {
            return Ok(false);
        }
        self.commit(|state| state.delete(id))
    }

    fn exists(&self, id: PolygonId) -> Result<bool, StoreError> {
        self.state.exists(id)
    }

    fn find_intersecting(&self, query: &Polygon) -> Result<Vec<PolygonRecord>, StoreError> {
        self.state.find_intersecting(query)
    }
}
