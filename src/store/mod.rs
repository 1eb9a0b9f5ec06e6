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

//! Certificate store abstraction.
//!
//! This module provides a trait-based abstraction over named certificate
//! stores so that removal logic can run against the Windows system stores
//! ([`crate::windows::SystemStoreProvider`]) or an in-memory implementation
//! ([`MemoryStoreProvider`]).
//!
//! # Store Locations
//!
//! - **CurrentUser**: Per-user certificates, no elevation required
//! - **LocalMachine**: System-wide certificates, requires admin privileges for writes
//!
//! Store names are opaque. Any name the platform accepts is passed through;
//! [`WELL_KNOWN_STORES`] only exists for help output.

mod memory;

pub use memory::{MemoryStore, MemoryStoreProvider};

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::cert::CertificateRecord;
use crate::error::{CertPurgeError, Result};

/// Location (hive) of a certificate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreScope {
    /// Current user store - per-user, no elevation required.
    CurrentUser,
    /// Local machine store - system-wide, requires admin for writes.
    LocalMachine,
}

impl StoreScope {
    /// Parse a scope token such as "CurrentUser" or "localmachine".
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("CurrentUser") {
            Some(Self::CurrentUser)
        } else if s.eq_ignore_ascii_case("LocalMachine") {
            Some(Self::LocalMachine)
        } else {
            None
        }
    }

    /// Canonical spelling of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentUser => "CurrentUser",
            Self::LocalMachine => "LocalMachine",
        }
    }
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreScope {
    type Err = CertPurgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            CertPurgeError::usage(format!(
                "invalid store location \"{s}\", expected \"CurrentUser\" or \"LocalMachine\""
            ))
        })
    }
}

/// Well-known system store names and their display names.
pub const WELL_KNOWN_STORES: &[(&str, &str)] = &[
    ("My", "Personal"),
    ("Root", "Trusted Root Certification Authorities"),
    ("Trust", "Enterprise Trust"),
    ("CA", "Intermediate Certification Authorities"),
    ("TrustedPublisher", "Trusted Publishers"),
    ("AuthRoot", "Third-Party Root Certification Authorities"),
    ("TrustedPeople", "Trusted People"),
    ("AddressBook", "Other People"),
];

/// Look up the display name of a well-known store (case-insensitive).
pub fn display_name(store: &str) -> Option<&'static str> {
    WELL_KNOWN_STORES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(store))
        .map(|(_, display)| *display)
}

/// A certificate enumerated from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Decoded identity of the certificate.
    pub record: CertificateRecord,
    /// The raw DER-encoded certificate bytes.
    pub der_bytes: Vec<u8>,
}

impl StoreEntry {
    /// Decode a DER certificate into a store entry.
    pub fn from_der(der_bytes: Vec<u8>) -> Result<Self> {
        let record = CertificateRecord::from_der(&der_bytes)?;
        Ok(Self { record, der_bytes })
    }

    /// Decode every certificate, skipping (and logging) any that fail to parse.
    ///
    /// Undecodable certificates can be neither matched nor reported, so they
    /// are left in the store untouched.
    pub fn decode_all<I>(certificates: I) -> Vec<Self>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        certificates
            .into_iter()
            .filter_map(|der| match Self::from_der(der) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping undecodable certificate: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// An open, writable certificate store.
///
/// Dropping the value closes the store.
pub trait CertificateStore {
    /// Enumerate all certificates currently in the store.
    fn certificates(&self) -> Result<Vec<StoreEntry>>;

    /// Remove a previously enumerated certificate from the store.
    fn remove(&mut self, entry: &StoreEntry) -> Result<()>;
}

/// Opens certificate stores by scope and name.
pub trait StoreProvider {
    /// The store handle type.
    type Store: CertificateStore;

    /// Open a store for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`CertPurgeError::StoreAccess`] if the store does not exist or
    /// access is denied.
    fn open(&self, scope: StoreScope, name: &str) -> Result<Self::Store>;
}
