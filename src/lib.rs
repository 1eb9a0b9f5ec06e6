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

//! # certpurge
//!
//! Removes certificates from Windows system certificate stores by subject
//! name or serial number.
//!
//! Deleting a certificate from the per-user Root store makes Windows show a
//! modal "Root Certificate Store" security confirmation and blocks the
//! deleting thread until somebody answers it. To keep unattended runs from
//! hanging, a [`DialogWatcher`] runs on a second thread for the duration of
//! the batch and confirms that dialog whenever it appears.
//!
//! ## Features
//!
//! - **Name or serial matching**: an identifier matches certificates by
//!   simple display name (case-insensitive); serial number is the fallback
//! - **Multiple matches**: every certificate sharing a name is removed
//! - **Dialog watcher**: finds the confirmation by title (Russian, then
//!   English), accepts it and blocks user input while running
//! - **Testable seams**: stores and the desktop sit behind traits with
//!   in-memory implementations
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use certpurge::{BatchRequest, Orchestrator, StdoutReporter, StoreScope, WatcherConfig};
//! use certpurge::windows::{SystemStoreProvider, Win32Desktop};
//!
//! # fn main() -> certpurge::Result<()> {
//! let orchestrator = Orchestrator::new(SystemStoreProvider, Arc::new(StdoutReporter))
//!     .with_watcher(Arc::new(Win32Desktop::new()), WatcherConfig::default());
//!
//! let request = BatchRequest::new(StoreScope::CurrentUser, "Root", ["Old Test CA"]);
//! let outcome = orchestrator.run(&request)?;
//! println!("{} removed", outcome.summary.removed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cert;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod remover;
pub mod report;
pub mod store;
pub mod watcher;
pub mod windows;

// Re-export main types at crate root for convenience
pub use cert::CertificateRecord;
pub use config::{Config, ConfigLoader, WatcherConfig};
pub use error::{CertPurgeError, Result};
pub use logging::{LogLevel, LoggingConfig};
pub use orchestrator::{BatchOutcome, BatchRequest, Orchestrator};
pub use remover::{CertificateRemover, RemovalSummary, Resolution};
pub use report::{Event, RecordingReporter, Reporter, StdoutReporter};
pub use store::{
    CertificateStore, MemoryStore, MemoryStoreProvider, StoreEntry, StoreProvider, StoreScope,
};
pub use watcher::{
    DesktopAutomation, DialogWatcher, InputBlockGuard, ShutdownSignal, WatcherHandle,
    WatcherStats,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
