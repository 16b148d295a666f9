//! Persistence backends.
//!
//! The orchestrator only ever needs two operations from a store: write a
//! batch, and read everything back. Writes are upserts keyed by
//! [`ComicBook::store_key`], so replaying a batch is harmless.
//!
//! # Backends
//!
//! - [`memory`]: process-local, used by tests and dry runs
//! - [`json`]: a single pretty-printed JSON file on disk

pub mod json;
pub mod memory;

use crate::error::StoreError;
use crate::models::ComicBook;
use async_trait::async_trait;
use std::collections::HashMap;

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Storage collaborator of [`SolicitationService`](crate::service::SolicitationService).
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Insert or replace every record of `comics`.
    async fn bulk_save(&self, comics: &[ComicBook]) -> Result<(), StoreError>;

    /// Every stored record, in first-insertion order.
    async fn get_all(&self) -> Result<Vec<ComicBook>, StoreError>;
}

/// Upsert `batch` into `existing`, replacing records with the same store key in place.
fn upsert(existing: &mut Vec<ComicBook>, batch: &[ComicBook]) {
    let mut positions: HashMap<_, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, c)| (c.store_key(), i))
        .collect();

    for comic in batch {
        match positions.get(&comic.store_key()) {
            Some(&i) => existing[i] = comic.clone(),
            None => {
                positions.insert(comic.store_key(), existing.len());
                existing.push(comic.clone());
            }
        }
    }
}
