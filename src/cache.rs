//! Thread-safe, in-memory dedup store for one scrape session.
//!
//! Records are keyed by `(publisher, identity)` in a single flat map under
//! one lock. Insertion order is kept so reads come back in the order the
//! records were accepted.

use crate::error::CacheError;
use crate::models::ComicBook;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Key = (String, String);

#[derive(Debug, Default)]
struct Entries {
    index: HashMap<Key, usize>,
    records: Vec<ComicBook>,
}

/// Dedup cache keyed by publisher and [`ComicBook::id`].
#[derive(Debug, Default)]
pub struct DedupCache {
    inner: Mutex<Entries>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // A panic while holding the lock cannot leave the map half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a record.
    ///
    /// # Errors
    ///
    /// [`CacheError::Duplicate`] if a record with the same publisher and
    /// identity is already present. Callers treat this as a soft rejection.
    pub fn put(&self, comic: ComicBook) -> Result<(), CacheError> {
        let key = (comic.publisher.clone(), comic.id());
        let mut entries = self.lock();

        if entries.index.contains_key(&key) {
            let (publisher, id) = key;
            return Err(CacheError::Duplicate { publisher, id });
        }

        let position = entries.records.len();
        entries.records.push(comic);
        entries.index.insert(key, position);
        Ok(())
    }

    /// All records, in insertion order.
    ///
    /// # Errors
    ///
    /// [`CacheError::Empty`] when nothing has been stored yet.
    pub fn get_all(&self) -> Result<Vec<ComicBook>, CacheError> {
        let entries = self.lock();
        if entries.records.is_empty() {
            return Err(CacheError::Empty);
        }
        Ok(entries.records.clone())
    }

    pub fn get_by_publisher(&self, publisher: &str) -> Result<Vec<ComicBook>, CacheError> {
        self.filter(publisher, |c| c.publisher == publisher)
    }

    pub fn get_by_title(&self, title: &str) -> Result<Vec<ComicBook>, CacheError> {
        self.filter(title, |c| c.title == title)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter<F>(&self, what: &str, keep: F) -> Result<Vec<ComicBook>, CacheError>
    where
        F: Fn(&ComicBook) -> bool,
    {
        let found: Vec<ComicBook> = self.lock().records.iter().filter(|c| keep(c)).cloned().collect();
        if found.is_empty() {
            return Err(CacheError::NotFound(what.to_string()));
        }
        Ok(found)
    }
}
