// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Object store abstraction.

The engine performs all I/O through [ObjectStore], a flat blob namespace
keyed by `/`-separated string paths. The production implementation targets
S3-compatible endpoints ([s3::S3Store]); [memory::MemoryStore] backs the
test suite.
*/

use {crate::error::Result, async_trait::async_trait};

pub mod memory;
pub mod s3;

/// Visitor for [ObjectStore::walk]. Returning an error short-circuits the
/// walk and propagates to the caller.
pub type WalkVisit<'a> = &'a mut (dyn FnMut(&str) -> Result<()> + Send);

/// A flat blob namespace.
///
/// This trait is the single I/O boundary of the engine; no other component
/// touches the network.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object exists at the path.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Read the full content of the object at the path.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Write an object at the path, replacing any existing content.
    async fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Remove the object at the path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Remove every object whose key starts with the prefix.
    ///
    /// Individual removal failures are surfaced, not swallowed.
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Enumerate keys under the prefix, recursively, in key order.
    async fn walk(&self, prefix: &str, visit: WalkVisit<'_>) -> Result<()>;
}
