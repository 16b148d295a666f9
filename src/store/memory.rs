//! In-memory store.

use super::{Persistence, upsert};
use crate::error::StoreError;
use crate::models::ComicBook;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ComicBook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ComicBook>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn bulk_save(&self, comics: &[ComicBook]) -> Result<(), StoreError> {
        upsert(&mut self.lock(), comics);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ComicBook>, StoreError> {
        Ok(self.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn comic(title: &str, date: Option<NaiveDate>) -> ComicBook {
        ComicBook {
            title: title.into(),
            issue: "1".into(),
            pages: "32".into(),
            price: "$4.99".into(),
            format: None,
            publisher: "image".into(),
            creators: Vec::new(),
            release_date: date,
        }
    }

    #[tokio::test]
    async fn test_bulk_save_is_idempotent() {
        let store = MemoryStore::new();
        let batch = vec![comic("Spawn", NaiveDate::from_ymd_opt(2026, 3, 4)), comic("Saga", None)];

        store.bulk_save(&batch).await.unwrap();
        store.bulk_save(&batch).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get_all().await.unwrap(), batch);
    }

    #[tokio::test]
    async fn test_release_date_is_part_of_the_key() {
        let store = MemoryStore::new();
        store
            .bulk_save(&[
                comic("Spawn", NaiveDate::from_ymd_opt(2026, 3, 4)),
                comic("Spawn", NaiveDate::from_ymd_opt(2026, 4, 1)),
            ])
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }
}
