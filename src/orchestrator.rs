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

//! Runs a removal batch alongside the dialog watcher.
//!
//! The orchestrator starts at most one [`DialogWatcher`], runs the
//! [`CertificateRemover`] on the calling thread, then stops and joins the
//! watcher. The join happens on every path: normal completion, a returned
//! error, and unwinding (the [`WatcherHandle`] joins on drop).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::WatcherConfig;
use crate::error::Result;
use crate::remover::{CertificateRemover, RemovalSummary};
use crate::report::{Event, Reporter};
use crate::store::{StoreProvider, StoreScope};
use crate::watcher::{DesktopAutomation, DialogWatcher, WatcherHandle, WatcherStats};

/// A batch of identifiers to remove from one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Store scope.
    pub scope: StoreScope,
    /// Store name.
    pub store: String,
    /// Identifiers, processed in order.
    pub identifiers: Vec<String>,
}

impl BatchRequest {
    /// Create a batch request.
    pub fn new(
        scope: StoreScope,
        store: impl Into<String>,
        identifiers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            scope,
            store: store.into(),
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Removal counts.
    pub summary: RemovalSummary,
    /// Watcher counters, if a watcher ran and exited cleanly.
    pub watcher: Option<WatcherStats>,
}

/// Coordinates the remover and the dialog watcher.
pub struct Orchestrator<P> {
    remover: CertificateRemover<P>,
    reporter: Arc<dyn Reporter>,
    watcher: Option<(Arc<dyn DesktopAutomation>, WatcherConfig)>,
    dry_run: bool,
}

impl<P: StoreProvider> Orchestrator<P> {
    /// Create an orchestrator without a dialog watcher.
    pub fn new(provider: P, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            remover: CertificateRemover::new(provider),
            reporter,
            watcher: None,
            dry_run: false,
        }
    }

    /// Run a dialog watcher next to the removal.
    pub fn with_watcher(
        mut self,
        automation: Arc<dyn DesktopAutomation>,
        config: WatcherConfig,
    ) -> Self {
        self.watcher = Some((automation, config));
        self
    }

    /// Only report what would be removed. No watcher is started.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self.remover = self.remover.with_dry_run(dry_run);
        self
    }

    /// Run the batch.
    ///
    /// # Errors
    ///
    /// Returns the first error that stops the batch: a watcher that could not
    /// be started or a removal error. The watcher is stopped and joined and a
    /// single [`Event::Fatal`] line is reported before returning.
    pub fn run(&self, request: &BatchRequest) -> Result<BatchOutcome> {
        self.run_with(request, DialogWatcher::spawn)
    }

    fn run_with<F>(&self, request: &BatchRequest, spawn: F) -> Result<BatchOutcome>
    where
        F: FnOnce(DialogWatcher) -> Result<WatcherHandle>,
    {
        self.execute(request, spawn).inspect_err(|e| {
            self.reporter.report(&Event::Fatal {
                message: e.to_string(),
            });
        })
    }

    fn execute<F>(&self, request: &BatchRequest, spawn: F) -> Result<BatchOutcome>
    where
        F: FnOnce(DialogWatcher) -> Result<WatcherHandle>,
    {
        let handle = match self.watcher_to_start() {
            Some(watcher) => {
                let handle = spawn(watcher)?;
                debug!("Dialog watcher started");
                Some(handle)
            }
            None => None,
        };

        let result = self.remover.remove_certificates(
            request.scope,
            &request.store,
            &request.identifiers,
            self.reporter.as_ref(),
        );

        let watcher = handle.and_then(|handle| match handle.stop_and_join() {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("{}", e);
                None
            }
        });

        result.map(|summary| BatchOutcome { summary, watcher })
    }

    fn watcher_to_start(&self) -> Option<DialogWatcher> {
        match &self.watcher {
            Some((automation, config)) if config.enabled && !self.dry_run => {
                Some(DialogWatcher::new(
                    Arc::clone(automation),
                    config.clone(),
                    Arc::clone(&self.reporter),
                ))
            }
            _ => None,
        }
    }
}
