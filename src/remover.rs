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

//! Batch certificate removal.
//!
//! Each identifier is processed independently against a freshly opened store:
//!
//! 1. Certificates whose simple name equals the identifier (case-insensitive)
//! 2. Only if none matched, certificates whose serial number equals it
//!
//! The two match sets are never merged. An identifier matching nothing is
//! reported and skipped; failing to open the store aborts the batch.
//!
//! # Example
//!
//! ```no_run
//! use certpurge::remover::CertificateRemover;
//! use certpurge::report::StdoutReporter;
//! use certpurge::store::{MemoryStoreProvider, StoreScope};
//!
//! # fn example() -> certpurge::Result<()> {
//! let remover = CertificateRemover::new(MemoryStoreProvider::new());
//! let identifiers = vec!["TEST1".to_string()];
//! let summary =
//!     remover.remove_certificates(StoreScope::CurrentUser, "My", &identifiers, &StdoutReporter)?;
//! println!("removed {}", summary.removed);
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info};

use crate::error::Result;
use crate::report::{Event, Reporter};
use crate::store::{CertificateStore, StoreEntry, StoreProvider, StoreScope, display_name};

/// How an identifier was resolved against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// One or more certificates matched by simple subject name.
    ByName(Vec<StoreEntry>),
    /// No name matched; one or more certificates matched by serial number.
    BySerial(Vec<StoreEntry>),
    /// Nothing matched.
    NotFound,
}

impl Resolution {
    /// The matched entries (empty for [`Resolution::NotFound`]).
    pub fn entries(&self) -> &[StoreEntry] {
        match self {
            Self::ByName(entries) | Self::BySerial(entries) => entries,
            Self::NotFound => &[],
        }
    }
}

/// Resolve an identifier against the certificates of a store.
pub fn resolve(identifier: &str, entries: &[StoreEntry]) -> Resolution {
    let by_name: Vec<StoreEntry> = entries
        .iter()
        .filter(|entry| entry.record.matches_name(identifier))
        .cloned()
        .collect();
    if !by_name.is_empty() {
        return Resolution::ByName(by_name);
    }

    let by_serial: Vec<StoreEntry> = entries
        .iter()
        .filter(|entry| entry.record.matches_serial(identifier))
        .cloned()
        .collect();
    if !by_serial.is_empty() {
        return Resolution::BySerial(by_serial);
    }

    Resolution::NotFound
}

/// Counts for a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    /// Certificates removed (or, in a dry run, that would have been).
    pub removed: usize,
    /// Identifiers that matched nothing.
    pub not_found: usize,
}

/// Removes certificates from the stores of a [`StoreProvider`].
#[derive(Debug, Clone)]
pub struct CertificateRemover<P> {
    provider: P,
    dry_run: bool,
}

impl<P: StoreProvider> CertificateRemover<P> {
    /// Create a remover backed by `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            dry_run: false,
        }
    }

    /// Only report what would be removed.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Get the underlying store provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Remove every certificate matching each identifier, in order.
    ///
    /// # Errors
    ///
    /// Returns an error, without processing the remaining identifiers, if the
    /// store cannot be opened or a matched certificate cannot be removed.
    pub fn remove_certificates(
        &self,
        scope: StoreScope,
        store_name: &str,
        identifiers: &[String],
        reporter: &dyn Reporter,
    ) -> Result<RemovalSummary> {
        let mut summary = RemovalSummary::default();
        debug!(
            store = display_name(store_name).unwrap_or("custom store"),
            "Processing {} identifier(s) against {}\\{}",
            identifiers.len(),
            scope,
            store_name
        );

        for identifier in identifiers {
            let removed = self.remove_identifier(scope, store_name, identifier, reporter)?;
            if removed == 0 {
                summary.not_found += 1;
            } else {
                summary.removed += removed;
            }
        }

        Ok(summary)
    }

    fn remove_identifier(
        &self,
        scope: StoreScope,
        store_name: &str,
        identifier: &str,
        reporter: &dyn Reporter,
    ) -> Result<usize> {
        let mut store = self.provider.open(scope, store_name)?;
        let entries = store.certificates()?;
        debug!(
            "Store {}\\{} holds {} certificate(s)",
            scope,
            store_name,
            entries.len()
        );

        let resolution = resolve(identifier, &entries);
        match &resolution {
            Resolution::ByName(matched) => {
                debug!("'{}' matched {} certificate(s) by name", identifier, matched.len())
            }
            Resolution::BySerial(matched) => {
                debug!("'{}' matched {} certificate(s) by serial", identifier, matched.len())
            }
            Resolution::NotFound => {
                reporter.report(&Event::NotFound {
                    identifier: identifier.to_string(),
                });
                return Ok(0);
            }
        }

        let matched = resolution.entries();
        for entry in matched {
            let record = entry.record.clone();
            let event = if self.dry_run {
                Event::WouldRemove {
                    record,
                    store: store_name.to_string(),
                    scope,
                }
            } else {
                store.remove(entry)?;
                info!(
                    subject = %entry.record.subject,
                    serial = %entry.record.serial_number,
                    "Removed certificate from {}\\{}",
                    scope,
                    store_name
                );
                Event::Removed {
                    record,
                    store: store_name.to_string(),
                    scope,
                }
            };
            reporter.report(&event);
        }

        Ok(matched.len())
    }
}
