// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! In-memory object store. */

use {
    super::{ObjectStore, WalkVisit},
    crate::error::Result,
    async_trait::async_trait,
    std::{
        collections::BTreeMap,
        sync::RwLock,
    },
};

/// A thread-safe in-memory [ObjectStore].
///
/// Keys enumerate in lexicographic order, like an object store listing.
/// Intended for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Snapshot of all keys, in order.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .expect("object map lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Snapshot of all keys starting with the prefix.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self
            .objects
            .read()
            .expect("object map lock poisoned")
            .contains_key(path))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .expect("object map lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| {
                crate::error::FaptlyError::Transport(path.to_string(), "no such key".to_string())
            })
    }

    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        self.objects
            .write()
            .expect("object map lock poisoned")
            .insert(path.to_string(), data.to_vec());

        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects
            .write()
            .expect("object map lock poisoned")
            .remove(path);

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        self.objects
            .write()
            .expect("object map lock poisoned")
            .retain(|k, _| !k.starts_with(prefix));

        Ok(())
    }

    async fn walk(&self, prefix: &str, visit: WalkVisit<'_>) -> Result<()> {
        let keys = self.keys_with_prefix(prefix);

        for key in keys {
            visit(&key)?;
        }

        Ok(())
    }
}
