//! Polygon storage.
//!
//! [`PolygonStore`] is the port the resolver and the CLI talk to. Records
//! come back in creation order everywhere, because the resolver uses that
//! order as precedence: earlier polygons carve into later submissions.
//!
//! [`MemoryStore`] keeps everything in a `Vec`; the file-backed store in
//! [`crate::file_store`] wraps it and writes a snapshot after each change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::clip::intersects;
use crate::geometry::Polygon;

/// Identifier assigned by the store on create. Never reused.
pub type PolygonId = u64;

/// A stored polygon with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    pub id: PolygonId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub geometry: Polygon,
    pub created_at: DateTime<Utc>,
    /// `None` until the first update.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields supplied by the caller on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPolygon {
    pub name: String,
    pub description: Option<String>,
    pub geometry: Polygon,
}

impl NewPolygon {
    pub fn new(name: impl Into<String>, description: Option<String>, geometry: Polygon) -> Self {
        Self {
            name: name.into(),
            description,
            geometry,
        }
    }
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("no polygon found with id {0}")]
    NotFound(PolygonId),
    /// Reading or writing the backing file failed.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The backing file could not be encoded or decoded.
    #[error("store snapshot error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable keyed storage of polygon records.
///
/// ## Rust Lesson #17: Traits
///
/// A trait is an interface. The resolver is written against `PolygonStore`
/// and works with any implementation: in memory for tests, a JSON file for
/// the CLI. Methods with a body are defaults implementors get for free.
pub trait PolygonStore {
    /// Every record, oldest first.
    fn get_all(&self) -> Result<Vec<PolygonRecord>, StoreError>;

    fn get_by_id(&self, id: PolygonId) -> Result<PolygonRecord, StoreError>;

    /// Insert a record. Assigns the id and `created_at`; `updated_at` stays unset.
    fn create(&mut self, polygon: NewPolygon) -> Result<PolygonRecord, StoreError>;

    /// Replace name, description and geometry. Sets `updated_at`.
    fn update(&mut self, id: PolygonId, polygon: NewPolygon) -> Result<PolygonRecord, StoreError>;

    /// Remove a record. `Ok(false)` when there was nothing to remove.
    fn delete(&mut self, id: PolygonId) -> Result<bool, StoreError>;

    fn exists(&self, id: PolygonId) -> Result<bool, StoreError> {
        match self.get_by_id(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every record whose geometry intersects `query`, oldest first.
    fn find_intersecting(&self, query: &Polygon) -> Result<Vec<PolygonRecord>, StoreError> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|record| intersects(&record.geometry, query))
            .collect())
    }
}

/// In-memory store. Records are kept in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    next_id: PolygonId,
    polygons: Vec<PolygonRecord>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            next_id: 1,
            polygons: Vec::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    fn position(&self, id: PolygonId) -> Result<usize, StoreError> {
        self.polygons
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl PolygonStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<PolygonRecord>, StoreError> {
        Ok(self.polygons.clone())
    }

    fn get_by_id(&self, id: PolygonId) -> Result<PolygonRecord, StoreError> {
        let index = self.position(id)?;
        Ok(self.polygons[index].clone())
    }

    fn create(&mut self, polygon: NewPolygon) -> Result<PolygonRecord, StoreError> {
        let record = PolygonRecord {
            id: self.next_id,
            name: polygon.name,
            description: polygon.description,
            geometry: polygon.geometry,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.next_id += 1;
        info!(id = record.id, name = %record.name, "polygon created");
        self.polygons.push(record.clone());
        Ok(record)
    }

    fn update(&mut self, id: PolygonId, polygon: NewPolygon) -> Result<PolygonRecord, StoreError> {
        let index = self.position(id)?;
        let record = &mut self.polygons[index];
        record.name = polygon.name;
        record.description = polygon.description;
        record.geometry = polygon.geometry;
        record.updated_at = Some(Utc::now());
        info!(id, "polygon updated");
        Ok(record.clone())
    }

    fn delete(&mut self, id: PolygonId) -> Result<bool, StoreError> {
        match self.position(id) {
            Ok(index) => {
                self.polygons.remove(index);
                info!(id, "polygon deleted");
                Ok(true)
            }
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn exists(&self, id: PolygonId) -> Result<bool, StoreError> {
        Ok(self.polygons.iter().any(|r| r.id == id))
    }

    fn find_intersecting(&self, query: &Polygon) -> Result<Vec<PolygonRecord>, StoreError> {
        Ok(self
            .polygons
            .iter()
            .filter(|record| intersects(&record.geometry, query))
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    fn new(name: &str, geometry: Polygon) -> NewPolygon {
        NewPolygon::new(name, None, geometry)
    }

    #[test]
    fn create_assigns_ids_and_timestamps() {
        let mut store = MemoryStore::new();
        let a = store.create(new("a", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        let b = store.create(new("b", rect(2.0, 0.0, 3.0, 1.0))).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(a.updated_at.is_none());
        assert!(b.created_at >= a.created_at);
    }

    #[test]
    fn get_all_is_in_creation_order() {
        let mut store = MemoryStore::new();
        for name in ["first", "second", "third"] {
            store.create(new(name, rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        }
        let names: Vec<String> = store.get_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn get_by_id_reports_missing() {
        let store = MemoryStore::new();
        assert!(matches!(store.get_by_id(7), Err(StoreError::NotFound(7))));
    }

    #[test]
    fn update_replaces_fields_and_stamps() {
        let mut store = MemoryStore::new();
        let rec = store.create(new("old", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        let updated = store
            .update(
                rec.id,
                NewPolygon::new("new", Some("desc".into()), rect(0.0, 0.0, 2.0, 2.0)),
            )
            .unwrap();
        assert_eq!(updated.id, rec.id);
        assert_eq!(updated.name, "new");
        assert_eq!(updated.description.as_deref(), Some("desc"));
        assert_eq!(updated.created_at, rec.created_at);
        assert!(updated.updated_at.unwrap() >= rec.created_at);
        assert_eq!(store.get_by_id(rec.id).unwrap(), updated);
    }

    #[test]
    fn update_of_missing_id_changes_nothing() {
        let mut store = MemoryStore::new();
        store.create(new("a", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        let before = store.get_all().unwrap();
        assert!(matches!(
            store.update(99, new("x", rect(0.0, 0.0, 1.0, 1.0))),
            Err(StoreError::NotFound(99))
        ));
        assert_eq!(store.get_all().unwrap(), before);
    }

    #[test]
    fn delete_reports_whether_something_was_removed() {
        let mut store = MemoryStore::new();
        let rec = store.create(new("a", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        assert!(store.delete(rec.id).unwrap());
        assert!(!store.delete(rec.id).unwrap());
        assert!(!store.exists(rec.id).unwrap());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = MemoryStore::new();
        let a = store.create(new("a", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        store.delete(a.id).unwrap();
        let b = store.create(new("b", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn find_intersecting_filters_and_keeps_order() {
        let mut store = MemoryStore::new();
        let left = store.create(new("left", rect(0.0, 0.0, 1.0, 1.0))).unwrap();
        store.create(new("far", rect(10.0, 10.0, 11.0, 11.0))).unwrap();
        let right = store.create(new("right", rect(1.5, 0.0, 2.5, 1.0))).unwrap();

        let hits = store.find_intersecting(&rect(0.5, 0.0, 2.0, 1.0)).unwrap();
        let ids: Vec<PolygonId> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, [left.id, right.id]);
    }
}
