//! Removal batches run next to the dialog watcher.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use certpurge::config::FALLBACK_DIALOG_TITLE;
use certpurge::watcher::WindowHandle;
use certpurge::{
    BatchRequest, CertPurgeError, CertificateStore, Event, MemoryStore, MemoryStoreProvider,
    Orchestrator, RecordingReporter, Result, StoreEntry, StoreProvider, StoreScope, WatcherConfig,
};

use super::{FakeDesktop, fast_watcher_config, fixture, wait_until};

/// Store provider whose removals raise the confirmation dialog and block
/// until it is answered.
struct PromptingProvider {
    inner: MemoryStoreProvider,
    desktop: FakeDesktop,
}

struct PromptingStore {
    inner: MemoryStore,
    desktop: FakeDesktop,
}

impl StoreProvider for PromptingProvider {
    type Store = PromptingStore;

    fn open(&self, scope: StoreScope, name: &str) -> Result<PromptingStore> {
        Ok(PromptingStore {
            inner: self.inner.open(scope, name)?,
            desktop: self.desktop.clone(),
        })
    }
}

impl CertificateStore for PromptingStore {
    fn certificates(&self) -> Result<Vec<StoreEntry>> {
        self.inner.certificates()
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        self.desktop.show_dialog(FALLBACK_DIALOG_TITLE, WindowHandle(0x1234));
        let answered = wait_until(Duration::from_secs(5), || {
            !self.desktop.is_visible(FALLBACK_DIALOG_TITLE)
        });
        if !answered {
            return Err(CertPurgeError::removal(
                &entry.record.serial_number,
                "confirmation dialog was not answered",
            ));
        }
        self.inner.remove(entry)
    }
}

/// Store provider whose stores panic while listing certificates.
struct FaultyProvider;

struct FaultyStore;

impl StoreProvider for FaultyProvider {
    type Store = FaultyStore;

    fn open(&self, _scope: StoreScope, _name: &str) -> Result<FaultyStore> {
        Ok(FaultyStore)
    }
}

impl CertificateStore for FaultyStore {
    fn certificates(&self) -> Result<Vec<StoreEntry>> {
        panic!("store enumeration failed");
    }

    fn remove(&mut self, _entry: &StoreEntry) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_root_removal_confirmed_by_watcher() {
    let memory = MemoryStoreProvider::new();
    memory.insert(StoreScope::CurrentUser, "Root", fixture("Old Test CA", &[0x01]));
    memory.insert(StoreScope::CurrentUser, "Root", fixture("Old Test CA", &[0x02]));
    memory.insert(StoreScope::CurrentUser, "Root", fixture("Keep CA", &[0x03]));

    let desktop = FakeDesktop::new();
    let reporter = Arc::new(RecordingReporter::new());
    let provider = PromptingProvider {
        inner: memory.clone(),
        desktop: desktop.clone(),
    };
    let orchestrator = Orchestrator::new(provider, reporter.clone())
        .with_watcher(Arc::new(desktop.clone()), fast_watcher_config());

    let outcome = orchestrator
        .run(&BatchRequest::new(StoreScope::CurrentUser, "Root", ["Old Test CA"]))
        .unwrap();

    assert_eq!(outcome.summary.removed, 2);
    assert_eq!(outcome.watcher.map(|stats| stats.dismissed), Some(2));
    assert_eq!(memory.count(StoreScope::CurrentUser, "Root"), 1);

    let events = reporter.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], Event::DialogFound { .. }));
    assert!(matches!(events[1], Event::Removed { .. }));
    assert!(matches!(events[2], Event::DialogFound { .. }));
    assert!(matches!(events[3], Event::Removed { .. }));

    assert_eq!(desktop.blocks(), 1);
    assert_eq!(desktop.unblocks(), 1);
}

#[test]
fn test_store_error_still_stops_watcher() {
    let desktop = FakeDesktop::new();
    let reporter = Arc::new(RecordingReporter::new());
    let orchestrator = Orchestrator::new(MemoryStoreProvider::new(), reporter.clone())
        .with_watcher(Arc::new(desktop.clone()), fast_watcher_config());

    let result = orchestrator.run(&BatchRequest::new(StoreScope::LocalMachine, "Nope", ["TEST1"]));

    assert!(matches!(result, Err(CertPurgeError::StoreAccess { .. })));
    assert_eq!(desktop.blocks(), 1);
    assert_eq!(desktop.unblocks(), 1);

    let lines = reporter.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Error removing certificates: Cannot open certificate store"));
}

#[test]
fn test_panicking_store_still_stops_watcher() {
    let desktop = FakeDesktop::new();
    let reporter = Arc::new(RecordingReporter::new());
    let orchestrator = Orchestrator::new(FaultyProvider, reporter.clone())
        .with_watcher(Arc::new(desktop.clone()), fast_watcher_config());
    let request = BatchRequest::new(StoreScope::CurrentUser, "Root", ["TEST1"]);

    let result = panic::catch_unwind(AssertUnwindSafe(|| orchestrator.run(&request)));

    assert!(result.is_err());
    assert_eq!(desktop.blocks(), 1);
    assert_eq!(desktop.unblocks(), 1);

    let calls_after_unwind = desktop.calls().len();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(desktop.calls().len(), calls_after_unwind);
}

#[test]
fn test_dry_run_starts_no_watcher() {
    let memory = MemoryStoreProvider::new();
    memory.insert(StoreScope::CurrentUser, "My", fixture("TEST1", &[0x01]));

    let desktop = FakeDesktop::new();
    let reporter = Arc::new(RecordingReporter::new());
    let orchestrator = Orchestrator::new(memory.clone(), reporter.clone())
        .with_watcher(Arc::new(desktop.clone()), fast_watcher_config())
        .dry_run(true);

    let outcome = orchestrator
        .run(&BatchRequest::new(StoreScope::CurrentUser, "My", ["TEST1"]))
        .unwrap();

    assert_eq!(outcome.summary.removed, 1);
    assert!(outcome.watcher.is_none());
    assert!(desktop.calls().is_empty());
    assert_eq!(memory.count(StoreScope::CurrentUser, "My"), 1);
    assert!(matches!(reporter.events()[0], Event::WouldRemove { .. }));
}

#[test]
fn test_disabled_watcher_not_started() {
    let memory = MemoryStoreProvider::new();
    memory.create_store(StoreScope::CurrentUser, "My");

    let desktop = FakeDesktop::new();
    let config = WatcherConfig {
        enabled: false,
        ..fast_watcher_config()
    };
    let orchestrator = Orchestrator::new(memory, Arc::new(RecordingReporter::new()))
        .with_watcher(Arc::new(desktop.clone()), config);

    let outcome = orchestrator
        .run(&BatchRequest::new(StoreScope::CurrentUser, "My", ["TEST1"]))
        .unwrap();

    assert_eq!(outcome.summary.not_found, 1);
    assert!(outcome.watcher.is_none());
    assert!(desktop.calls().is_empty());
}
