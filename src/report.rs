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

//! Line-oriented progress reporting.
//!
//! Every user-visible outcome (removed certificate, unknown identifier,
//! dismissed dialog, fatal error) is an [`Event`] rendered as exactly one
//! line. Reporters are shared between the removal thread and the dialog
//! watcher thread, hence the `Send + Sync` bound.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use crate::cert::CertificateRecord;
use crate::store::StoreScope;

/// A reportable outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A certificate was removed from a store.
    Removed {
        /// The removed certificate.
        record: CertificateRecord,
        /// Store name as given by the caller.
        store: String,
        /// Store scope.
        scope: StoreScope,
    },

    /// A certificate would have been removed (dry run).
    WouldRemove {
        /// The matched certificate.
        record: CertificateRecord,
        /// Store name as given by the caller.
        store: String,
        /// Store scope.
        scope: StoreScope,
    },

    /// No certificate matched the identifier by name or serial number.
    NotFound {
        /// The identifier as given by the caller.
        identifier: String,
    },

    /// A security confirmation dialog was found and is being confirmed.
    DialogFound {
        /// The window title that matched.
        title: String,
    },

    /// The batch was aborted.
    Fatal {
        /// Error description.
        message: String,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed {
                record,
                store,
                scope,
            } => write!(
                f,
                "Certificate \"{}\" with serial number \"{}\" removed from store \"{}\" at location \"{}\".",
                record.subject, record.serial_number, store, scope
            ),
            Self::WouldRemove {
                record,
                store,
                scope,
            } => write!(
                f,
                "Certificate \"{}\" with serial number \"{}\" would be removed from store \"{}\" at location \"{}\".",
                record.subject, record.serial_number, store, scope
            ),
            Self::NotFound { identifier } => write!(
                f,
                "Certificate with name or serial number \"{identifier}\" not found."
            ),
            Self::DialogFound { title } => write!(
                f,
                "Found security confirmation dialog \"{title}\", confirming..."
            ),
            Self::Fatal { message } => write!(f, "Error removing certificates: {message}"),
        }
    }
}

/// Receives events as they happen.
pub trait Reporter: Send + Sync {
    /// Report a single event.
    fn report(&self, event: &Event);
}

/// Writes each event as a line on standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report(&self, event: &Event) {
        let mut stdout = std::io::stdout().lock();
        // Write errors on a closed stdout are ignored.
        let _ = writeln!(stdout, "{event}");
        let _ = stdout.flush();
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events reported so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// All events rendered as output lines.
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event.clone());
    }
}
