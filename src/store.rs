use crate::db;
use anyhow::Context;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;

/// The six named collections a workspace holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Classes,
    Students,
    Subjects,
    Assignments,
    Grades,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Self::Users,
        Self::Classes,
        Self::Students,
        Self::Subjects,
        Self::Assignments,
        Self::Grades,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Users => "grade_app_users",
            Self::Classes => "grade_app_classes",
            Self::Students => "grade_app_students",
            Self::Subjects => "grade_app_subjects",
            Self::Assignments => "grade_app_assignments",
            Self::Grades => "grade_app_grades",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Load-all / store-all access to named collections. A write replaces the
/// whole collection; two writers working from the same snapshot lose each
/// other's changes (last write wins).
pub trait CollectionStore {
    /// `None` when the collection has never been written.
    fn read(&self, collection: Collection) -> anyhow::Result<Option<Vec<Value>>>;
    fn write(&self, collection: Collection, records: &[Value]) -> anyhow::Result<()>;

    /// When the collection was last written, if the backend tracks it.
    fn updated_at(&self, _collection: Collection) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: db::open_db(workspace)?,
        })
    }
}

impl CollectionStore for SqliteStore {
    fn read(&self, collection: Collection) -> anyhow::Result<Option<Vec<Value>>> {
        let Some(payload) = db::collection_get(&self.conn, collection.key())? else {
            return Ok(None);
        };
        let records: Vec<Value> = serde_json::from_str(&payload)
            .with_context(|| format!("collection {} is not a JSON array", collection.key()))?;
        Ok(Some(records))
    }

    fn write(&self, collection: Collection, records: &[Value]) -> anyhow::Result<()> {
        let payload = serde_json::to_string(records)?;
        db::collection_put(&self.conn, collection.key(), &payload)
    }

    fn updated_at(&self, collection: Collection) -> anyhow::Result<Option<String>> {
        db::collection_updated_at(&self.conn, collection.key())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use super::{Collection, CollectionStore};
    use serde_json::Value;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MemoryStore {
        collections: RefCell<HashMap<Collection, Vec<Value>>>,
        pub writes: RefCell<usize>,
    }

    impl CollectionStore for MemoryStore {
        fn read(&self, collection: Collection) -> anyhow::Result<Option<Vec<Value>>> {
            Ok(self.collections.borrow().get(&collection).cloned())
        }

        fn write(&self, collection: Collection, records: &[Value]) -> anyhow::Result<()> {
            *self.writes.borrow_mut() += 1;
            self.collections
                .borrow_mut()
                .insert(collection, records.to_vec());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn collection_keys_round_trip() {
        for c in Collection::ALL {
            assert_eq!(Collection::from_key(c.key()), Some(c));
        }
        assert_eq!(Collection::from_key("grade_app_unknown"), None);
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let workspace = temp_dir("gradebook-store");
        {
            let store = SqliteStore::open(&workspace).expect("open");
            assert!(store.read(Collection::Classes).expect("read").is_none());
            store
                .write(
                    Collection::Classes,
                    &[json!({ "id": "class-1", "name": "M.1/1" })],
                )
                .expect("write");
        }
        let store = SqliteStore::open(&workspace).expect("reopen");
        let classes = store
            .read(Collection::Classes)
            .expect("read")
            .expect("present");
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0]["name"], "M.1/1");
        let _ = std::fs::remove_dir_all(workspace);
    }
}
