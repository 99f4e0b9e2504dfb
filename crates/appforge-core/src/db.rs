//! Durable document store for action collections using redb.
//!
//! A single `COLLECTIONS` table maps the collection id (a uuid string) to
//! the JSON-encoded document. Every mutation is one write transaction, so
//! a reader sees either the previous document or the new one, never a
//! partial write. Secondary lookups (by application or page) scan the
//! table and filter in process; collection counts per application are
//! small enough that an index would not pay for itself.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::collection::ActionCollection;
use crate::error::{CollectionError, Result};

// ---------------------------------------------------------------------------
// Table definition
// ---------------------------------------------------------------------------

/// Key: collection id. Value: JSON-encoded ActionCollection.
const COLLECTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("action_collections");

// ---------------------------------------------------------------------------
// CollectionDb
// ---------------------------------------------------------------------------

/// Low-level CRUD over persisted `ActionCollection` documents. Policy
/// checks and view filtering live a layer up, in the store adapter.
pub struct CollectionDb {
    db: Database,
}

impl CollectionDb {
    /// Open or create the redb database at `path`, ensuring the
    /// `COLLECTIONS` table exists before any reads.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|e| CollectionError::Store(e.to_string()))?;
        let wt = db
            .begin_write()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        wt.open_table(COLLECTIONS)
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        wt.commit()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn get(&self, id: &str) -> Result<Option<ActionCollection>> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        let table = rt
            .open_table(COLLECTIONS)
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        let Some(value) = table
            .get(id)
            .map_err(|e| CollectionError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let collection: ActionCollection = serde_json::from_slice(value.value())?;
        Ok(Some(collection))
    }

    /// Full-document replace: the stored document is whatever was passed,
    /// last writer wins. The collection must already carry an id.
    pub fn put(&self, collection: &ActionCollection) -> Result<()> {
        let id = collection
            .id
            .as_deref()
            .ok_or_else(|| CollectionError::Store("document has no id".into()))?;
        let value = serde_json::to_vec(collection)?;
        let wt = self
            .db
            .begin_write()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        {
            let mut table = wt
                .open_table(COLLECTIONS)
                .map_err(|e| CollectionError::Store(e.to_string()))?;
            table
                .insert(id, value.as_slice())
                .map_err(|e| CollectionError::Store(e.to_string()))?;
        }
        wt.commit()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        Ok(())
    }

    /// Physically remove a document. Returns whether anything was deleted.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let wt = self
            .db
            .begin_write()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        let removed;
        {
            let mut table = wt
                .open_table(COLLECTIONS)
                .map_err(|e| CollectionError::Store(e.to_string()))?;
            removed = table
                .remove(id)
                .map_err(|e| CollectionError::Store(e.to_string()))?
                .is_some();
        }
        wt.commit()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        Ok(removed)
    }

    pub fn scan_all(&self) -> Result<Vec<ActionCollection>> {
        let rt = self
            .db
            .begin_read()
            .map_err(|e| CollectionError::Store(e.to_string()))?;
        let table = rt
            .open_table(COLLECTIONS)
            .map_err(|e| CollectionError::Store(e.to_string()))?;

        let mut result = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| CollectionError::Store(e.to_string()))?
        {
            let (_, v) = entry.map_err(|e| CollectionError::Store(e.to_string()))?;
            let collection: ActionCollection = serde_json::from_slice(v.value())?;
            result.push(collection);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionVersion;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, CollectionDb) {
        let dir = TempDir::new().unwrap();
        let db = CollectionDb::open(&dir.path().join("test.redb")).unwrap();
        (dir, db)
    }

    fn collection(id: &str, name: &str) -> ActionCollection {
        let mut c = ActionCollection::new("app1", "p1", CollectionVersion::new(name));
        c.id = Some(id.into());
        c
    }

    #[test]
    fn put_get_remove_round_trip() {
        let (_dir, db) = open_tmp();
        let c = collection("c1", "utils");

        db.put(&c).unwrap();
        assert_eq!(db.get("c1").unwrap().unwrap(), c);
        assert!(db.get("missing").unwrap().is_none());

        assert!(db.remove("c1").unwrap());
        assert!(!db.remove("c1").unwrap());
        assert!(db.get("c1").unwrap().is_none());
    }

    #[test]
    fn put_replaces_whole_document() {
        let (_dir, db) = open_tmp();
        let mut c = collection("c1", "utils");
        db.put(&c).unwrap();

        c.unpublished.action_ids.insert("a1".into());
        c.publish();
        db.put(&c).unwrap();

        let stored = db.get("c1").unwrap().unwrap();
        assert!(stored.published.is_some());
        assert_eq!(db.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn put_without_id_is_rejected() {
        let (_dir, db) = open_tmp();
        let c = ActionCollection::new("app1", "p1", CollectionVersion::new("utils"));
        assert!(matches!(db.put(&c), Err(CollectionError::Store(_))));
    }
}
