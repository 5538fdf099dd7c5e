use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use super::storage::MediaCategory;

#[derive(Clone, Debug)]
pub struct MediaRecord {
    pub id: i64,
    pub category: MediaCategory,
    /// Relative path of the stored original under the media root.
    pub path: String,
    pub is_video: bool,
}

/// In-memory stand-in for the content table. The relational layer is out of
/// scope here; this keeps the id → original-path mapping the transcode and
/// deletion flows need, and is the one piece a real integration replaces
/// with its ORM.
#[derive(Clone, Default)]
pub struct MediaRegistry {
    records: Arc<RwLock<HashMap<i64, MediaRecord>>>,
    next_id: Arc<AtomicI64>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, category: MediaCategory, path: String, is_video: bool) -> MediaRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = MediaRecord { id, category, path, is_video };
        self.records
            .write()
            .expect("registry lock poisoned")
            .insert(id, record.clone());
        record
    }

    pub fn get(&self, id: i64) -> Option<MediaRecord> {
        self.records
            .read()
            .expect("registry lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Removes the record and returns it. The caller does filesystem cleanup
    /// afterwards, so the record is gone before any file is touched.
    pub fn remove(&self, id: i64) -> Option<MediaRecord> {
        self.records
            .write()
            .expect("registry lock poisoned")
            .remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_records_round_trip() {
        let registry = MediaRegistry::new();
        let a = registry.insert(MediaCategory::Posts, "posts/a.mp4".into(), true);
        let b = registry.insert(MediaCategory::Avatars, "avatars/b.jpg".into(), false);
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(registry.get(1).unwrap().path, "posts/a.mp4");
        assert!(registry.remove(1).is_some());
        assert!(registry.get(1).is_none());
        assert!(registry.remove(1).is_none());
    }
}
