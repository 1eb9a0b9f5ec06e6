//! Integration test utilities and helpers
//!
//! This module provides the shared test infrastructure: fixture certificates
//! generated with rcgen and a scripted fake desktop standing in for the Win32
//! window APIs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use certpurge::watcher::{Key, KeyDirection, WindowHandle};
use certpurge::{CertPurgeError, DesktopAutomation, Result, WatcherConfig};
use rcgen::{CertificateParams, DnType, KeyPair, SerialNumber};

mod orchestrator_test;
mod remover_test;

/// Generate a self-signed DER certificate with the given CN and serial number.
pub fn fixture(common_name: &str, serial: &[u8]) -> Vec<u8> {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.serial_number = Some(SerialNumber::from_slice(serial));
    let key_pair = KeyPair::generate().expect("key generation");
    params
        .self_signed(&key_pair)
        .expect("self-signed certificate")
        .der()
        .to_vec()
}

/// Watcher settings that keep tests fast.
pub fn fast_watcher_config() -> WatcherConfig {
    WatcherConfig {
        poll_interval_ms: 5,
        focus_settle_ms: 1,
        accept_settle_ms: 1,
        ..WatcherConfig::default()
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// A desktop interaction recorded by [`FakeDesktop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Find(String),
    Focus(WindowHandle),
    Key(WindowHandle, Key, KeyDirection),
    Block(bool),
}

#[derive(Default)]
struct DesktopState {
    windows: HashMap<String, WindowHandle>,
    calls: Vec<Call>,
    focus_failures: usize,
    block_fails: bool,
    panic_on_find: bool,
    keep_open: bool,
    blocks: usize,
    unblocks: usize,
}

/// Scripted desktop. Dialogs close when they receive Enter, like the real one.
#[derive(Clone, Default)]
pub struct FakeDesktop {
    state: Arc<Mutex<DesktopState>>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_dialog(&self, title: &str, window: WindowHandle) {
        self.lock().windows.insert(title.to_string(), window);
    }

    pub fn is_visible(&self, title: &str) -> bool {
        self.lock().windows.contains_key(title)
    }

    /// Fail the next `count` focus attempts.
    pub fn fail_focus(&self, count: usize) {
        self.lock().focus_failures = count;
    }

    /// Refuse to block input, as for a non-elevated process.
    pub fn fail_block(&self) {
        self.lock().block_fails = true;
    }

    /// Panic inside the next window lookup.
    pub fn panic_on_find(&self) {
        self.lock().panic_on_find = true;
    }

    /// Ignore Enter so dialogs stay open.
    pub fn keep_dialogs_open(&self) {
        self.lock().keep_open = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Recorded calls other than window lookups and input blocking.
    pub fn interactions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Focus(_) | Call::Key(..)))
            .collect()
    }

    pub fn blocks(&self) -> usize {
        self.lock().blocks
    }

    pub fn unblocks(&self) -> usize {
        self.lock().unblocks
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DesktopAutomation for FakeDesktop {
    fn find_window(&self, title: &str) -> Option<WindowHandle> {
        let mut state = self.lock();
        state.calls.push(Call::Find(title.to_string()));
        if state.panic_on_find {
            state.panic_on_find = false;
            drop(state);
            panic!("injected desktop fault");
        }
        state.windows.get(title).copied()
    }

    fn focus(&self, window: WindowHandle) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Focus(window));
        if state.focus_failures > 0 {
            state.focus_failures -= 1;
            return Err(CertPurgeError::automation("SetForegroundWindow failed"));
        }
        Ok(())
    }

    fn post_key(&self, window: WindowHandle, key: Key, direction: KeyDirection) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Key(window, key, direction));
        if key == Key::Enter && direction == KeyDirection::Up && !state.keep_open {
            state.windows.retain(|_, handle| *handle != window);
        }
        Ok(())
    }

    fn set_input_blocked(&self, blocked: bool) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::Block(blocked));
        if blocked {
            if state.block_fails {
                return Err(CertPurgeError::platform("BlockInput: access denied"));
            }
            state.blocks += 1;
        } else {
            state.unblocks += 1;
        }
        Ok(())
    }
}
