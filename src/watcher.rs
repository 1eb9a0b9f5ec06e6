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

//! Security confirmation dialog watcher.
//!
//! Removing a certificate from the per-user Root store makes Windows show a
//! modal "Root Certificate Store" confirmation. The watcher runs on its own
//! thread next to the removal, and on every poll tick:
//!
//! 1. Stops if the [`ShutdownSignal`] has been triggered
//! 2. Looks for the dialog by each configured title, first match wins
//! 3. If found, focuses it, sends Tab (the default button is "No"), waits,
//!    sends Enter and waits again
//! 4. Waits one poll interval, waking early on shutdown
//!
//! User input is blocked for the whole run by an [`InputBlockGuard`], which
//! releases the block when dropped, including while unwinding from a panic.
//! When the block cannot be acquired (the process is not elevated) the
//! watcher logs a warning and keeps dismissing dialogs.
//!
//! Window operations go through the [`DesktopAutomation`] trait so the loop
//! can be driven by a fake desktop in tests.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::WatcherConfig;
use crate::error::{CertPurgeError, Result};
use crate::report::{Event, Reporter};

/// Opaque handle of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Keys sent to the confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Moves focus to the next control.
    Tab,
    /// Activates the focused control.
    Enter,
}

/// Key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    /// Key pressed.
    Down,
    /// Key released.
    Up,
}

/// Desktop capabilities used by the watcher.
pub trait DesktopAutomation: Send + Sync {
    /// Find a top-level window by its exact title.
    fn find_window(&self, title: &str) -> Option<WindowHandle>;

    /// Bring a window to the foreground.
    fn focus(&self, window: WindowHandle) -> Result<()>;

    /// Post a synthetic key event to a window.
    fn post_key(&self, window: WindowHandle, key: Key, direction: KeyDirection) -> Result<()>;

    /// Block or unblock keyboard and mouse input for the whole desktop.
    fn set_input_blocked(&self, blocked: bool) -> Result<()>;
}

/// One-shot stop signal shared between the orchestrator and the watcher.
///
/// Once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal and wake all waiters.
    pub fn trigger(&self) {
        let (lock, condvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }

    /// Check whether the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait up to `timeout` for the signal.
    ///
    /// Returns `true` if the signal was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, condvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut triggered = lock.lock().unwrap_or_else(PoisonError::into_inner);

        while !*triggered {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            triggered = condvar
                .wait_timeout(triggered, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        *triggered
    }
}

/// Holds the global input block and releases it on drop.
pub struct InputBlockGuard<'a> {
    automation: &'a dyn DesktopAutomation,
    held: bool,
}

impl<'a> InputBlockGuard<'a> {
    /// Try to block input. Failure is logged and leaves the guard inactive.
    pub fn acquire(automation: &'a dyn DesktopAutomation) -> Self {
        let held = match automation.set_input_blocked(true) {
            Ok(()) => {
                debug!("User input blocked");
                true
            }
            Err(e) => {
                warn!(
                    "Could not block user input (administrator rights required): {}",
                    e
                );
                false
            }
        };
        Self { automation, held }
    }

    /// A guard that holds nothing.
    pub fn inactive(automation: &'a dyn DesktopAutomation) -> Self {
        Self {
            automation,
            held: false,
        }
    }

    /// Whether input is currently blocked by this guard.
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for InputBlockGuard<'_> {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        match self.automation.set_input_blocked(false) {
            Ok(()) => debug!("User input unblocked"),
            Err(e) => warn!("Failed to unblock user input: {}", e),
        }
    }
}

/// Counters for one watcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherStats {
    /// Poll ticks executed.
    pub ticks: u64,
    /// Dialogs found and confirmed.
    pub dismissed: u64,
    /// Dialog interactions that failed and were retried.
    pub failures: u64,
    /// Whether user input was blocked during the run.
    pub input_blocked: bool,
}

/// Polls for the security confirmation dialog and confirms it.
pub struct DialogWatcher {
    automation: Arc<dyn DesktopAutomation>,
    config: WatcherConfig,
    reporter: Arc<dyn Reporter>,
}

impl DialogWatcher {
    /// Create a watcher.
    pub fn new(
        automation: Arc<dyn DesktopAutomation>,
        config: WatcherConfig,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            automation,
            config,
            reporter,
        }
    }

    /// Run the poll loop on the current thread until `signal` is triggered.
    pub fn run(&self, signal: &ShutdownSignal) -> WatcherStats {
        let automation: &dyn DesktopAutomation = &*self.automation;
        let guard = if self.config.block_input {
            InputBlockGuard::acquire(automation)
        } else {
            InputBlockGuard::inactive(automation)
        };

        let mut stats = WatcherStats {
            input_blocked: guard.is_held(),
            ..WatcherStats::default()
        };

        while !signal.is_triggered() {
            stats.ticks += 1;

            if let Some((window, title)) = self.find_dialog() {
                self.reporter.report(&Event::DialogFound {
                    title: title.to_string(),
                });
                match self.dismiss(window) {
                    Ok(()) => {
                        stats.dismissed += 1;
                        info!("Confirmed dialog \"{}\"", title);
                    }
                    Err(e) => {
                        stats.failures += 1;
                        debug!("Dialog interaction failed, retrying next tick: {}", e);
                    }
                }
            }

            if signal.wait_timeout(self.config.poll_interval()) {
                break;
            }
        }

        drop(guard);
        debug!(
            ticks = stats.ticks,
            dismissed = stats.dismissed,
            "Dialog watcher stopped"
        );
        stats
    }

    /// Start the poll loop on a dedicated thread.
    pub fn spawn(self) -> Result<WatcherHandle> {
        let signal = ShutdownSignal::new();
        let thread_signal = signal.clone();

        let thread = thread::Builder::new()
            .name("dialog-watcher".to_string())
            .spawn(move || self.run(&thread_signal))?;

        Ok(WatcherHandle {
            signal,
            thread: Some(thread),
        })
    }

    fn find_dialog(&self) -> Option<(WindowHandle, &str)> {
        self.config
            .titles
            .iter()
            .filter(|title| !title.is_empty())
            .find_map(|title| {
                self.automation
                    .find_window(title)
                    .map(|window| (window, title.as_str()))
            })
    }

    fn dismiss(&self, window: WindowHandle) -> Result<()> {
        self.automation.focus(window)?;

        self.press(window, Key::Tab)?;
        thread::sleep(self.config.focus_settle());

        self.press(window, Key::Enter)?;
        thread::sleep(self.config.accept_settle());

        Ok(())
    }

    fn press(&self, window: WindowHandle, key: Key) -> Result<()> {
        self.automation.post_key(window, key, KeyDirection::Down)?;
        self.automation.post_key(window, key, KeyDirection::Up)
    }
}

/// Owner of a running watcher thread.
///
/// Dropping the handle stops and joins the thread.
pub struct WatcherHandle {
    signal: ShutdownSignal,
    thread: Option<JoinHandle<WatcherStats>>,
}

impl WatcherHandle {
    /// Ask the watcher to stop without waiting for it.
    pub fn stop(&self) {
        self.signal.trigger();
    }

    /// The signal that stops this watcher.
    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    /// Stop the watcher and wait for its thread to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher thread panicked. Input blocking has
    /// already been released by then.
    pub fn stop_and_join(mut self) -> Result<WatcherStats> {
        self.signal.trigger();
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| CertPurgeError::platform("dialog watcher thread panicked")),
            None => Ok(WatcherStats::default()),
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.signal.trigger();
            let _ = thread.join();
        }
    }
}
