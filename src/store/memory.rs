// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-memory certificate store provider.
//!
//! Stores must be created with [`MemoryStoreProvider::create_store`] or
//! [`MemoryStoreProvider::insert`] before they can be opened, mirroring the
//! system provider which refuses to open stores that do not exist.
//!
//! # Example
//!
//! ```no_run
//! use certpurge::store::{CertificateStore, MemoryStoreProvider, StoreProvider, StoreScope};
//!
//! # fn example(der: Vec<u8>) -> certpurge::Result<()> {
//! let provider = MemoryStoreProvider::new();
//! provider.insert(StoreScope::CurrentUser, "My", der);
//!
//! let store = provider.open(StoreScope::CurrentUser, "My")?;
//! println!("{} certificates", store.certificates()?.len());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{CertificateStore, StoreEntry, StoreProvider, StoreScope};
use crate::error::{CertPurgeError, Result};

type StoreKey = (StoreScope, String);

#[derive(Debug, Default)]
struct State {
    stores: HashMap<StoreKey, Vec<Vec<u8>>>,
    denied: HashSet<StoreKey>,
    opened: usize,
}

/// Store provider keeping certificates in process memory.
///
/// Clones share the same stores, so a test can keep one clone for
/// inspection while another is handed to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreProvider {
    state: Arc<Mutex<State>>,
}

impl MemoryStoreProvider {
    /// Create a provider with no stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store if it does not exist yet.
    pub fn create_store(&self, scope: StoreScope, name: &str) {
        self.lock().stores.entry(key(scope, name)).or_default();
    }

    /// Add a DER certificate to a store, creating the store if needed.
    pub fn insert(&self, scope: StoreScope, name: &str, der: Vec<u8>) {
        self.lock()
            .stores
            .entry(key(scope, name))
            .or_default()
            .push(der);
    }

    /// Make subsequent opens of a store fail with an access error.
    pub fn deny_access(&self, scope: StoreScope, name: &str) {
        self.lock().denied.insert(key(scope, name));
    }

    /// Number of certificates in a store (zero if it does not exist).
    pub fn count(&self, scope: StoreScope, name: &str) -> usize {
        self.lock()
            .stores
            .get(&key(scope, name))
            .map_or(0, Vec::len)
    }

    /// Snapshot of the DER certificates in a store.
    pub fn certificates(&self, scope: StoreScope, name: &str) -> Vec<Vec<u8>> {
        self.lock()
            .stores
            .get(&key(scope, name))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of times any store was opened successfully.
    pub fn open_count(&self) -> usize {
        self.lock().opened
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StoreProvider for MemoryStoreProvider {
    type Store = MemoryStore;

    fn open(&self, scope: StoreScope, name: &str) -> Result<MemoryStore> {
        let mut state = self.lock();
        let store_key = key(scope, name);

        if state.denied.contains(&store_key) {
            return Err(CertPurgeError::store_access(scope, name, "access denied"));
        }
        if !state.stores.contains_key(&store_key) {
            return Err(CertPurgeError::store_access(
                scope,
                name,
                "the store does not exist",
            ));
        }

        state.opened += 1;
        Ok(MemoryStore {
            key: store_key,
            state: Arc::clone(&self.state),
        })
    }
}

/// An open in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    key: StoreKey,
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn with_store<T>(&self, f: impl FnOnce(&mut Vec<Vec<u8>>) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let certs = state.stores.get_mut(&self.key).ok_or_else(|| {
            CertPurgeError::store_access(self.key.0, &self.key.1, "the store was deleted")
        })?;
        Ok(f(certs))
    }
}

impl CertificateStore for MemoryStore {
    fn certificates(&self) -> Result<Vec<StoreEntry>> {
        let ders = self.with_store(|certs| certs.clone())?;
        Ok(StoreEntry::decode_all(ders))
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        let removed = self.with_store(|certs| {
            match certs.iter().position(|der| *der == entry.der_bytes) {
                Some(index) => {
                    certs.remove(index);
                    true
                }
                None => false,
            }
        })?;

        if removed {
            Ok(())
        } else {
            Err(CertPurgeError::removal(
                &entry.record.serial_number,
                "certificate is no longer in the store",
            ))
        }
    }
}

fn key(scope: StoreScope, name: &str) -> StoreKey {
    // System store names are case-insensitive.
    (scope, name.to_ascii_lowercase())
}
