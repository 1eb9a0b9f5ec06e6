//! Certificate removal against in-memory stores.

use certpurge::{
    CertPurgeError, CertificateRecord, CertificateRemover, Event, MemoryStoreProvider,
    RecordingReporter, StoreScope,
};

use super::fixture;

fn identifiers(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn test_remove_single_by_name() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::CurrentUser, "My", fixture("TEST1", &[0x11, 0x22]));
    provider.insert(StoreScope::CurrentUser, "My", fixture("KEEP", &[0x33]));

    let reporter = RecordingReporter::new();
    let remover = CertificateRemover::new(provider.clone());
    let summary = remover
        .remove_certificates(
            StoreScope::CurrentUser,
            "My",
            &identifiers(&["TEST1"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.not_found, 0);
    assert_eq!(provider.count(StoreScope::CurrentUser, "My"), 1);
    assert_eq!(
        reporter.lines(),
        vec![
            "Certificate \"CN=TEST1\" with serial number \"1122\" removed from store \"My\" at location \"CurrentUser\"."
        ]
    );
}

#[test]
fn test_remove_by_serial_number() {
    let provider = MemoryStoreProvider::new();
    provider.insert(
        StoreScope::CurrentUser,
        "Root",
        fixture("Legacy Root", &[0x3A, 0x1F, 0x00, 0xC2]),
    );

    let reporter = RecordingReporter::new();
    let summary = CertificateRemover::new(provider.clone())
        .remove_certificates(
            StoreScope::CurrentUser,
            "Root",
            &identifiers(&["3a:1f:00:c2"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(provider.count(StoreScope::CurrentUser, "Root"), 0);
    match &reporter.events()[0] {
        Event::Removed { record, store, .. } => {
            assert_eq!(record.simple_name, "Legacy Root");
            assert_eq!(record.serial_number, "3A1F00C2");
            assert_eq!(store, "Root");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn test_every_certificate_sharing_a_name_is_removed() {
    let provider = MemoryStoreProvider::new();
    for serial in [0x01u8, 0x02, 0x03] {
        provider.insert(StoreScope::LocalMachine, "CA", fixture("Shared", &[serial]));
    }
    provider.insert(StoreScope::LocalMachine, "CA", fixture("Other", &[0x04]));

    let reporter = RecordingReporter::new();
    let summary = CertificateRemover::new(provider.clone())
        .remove_certificates(
            StoreScope::LocalMachine,
            "CA",
            &identifiers(&["shared"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.removed, 3);
    assert_eq!(reporter.events().len(), 3);

    let remaining = provider.certificates(StoreScope::LocalMachine, "CA");
    assert_eq!(remaining.len(), 1);
    let record = CertificateRecord::from_der(&remaining[0]).unwrap();
    assert_eq!(record.simple_name, "Other");
}

#[test]
fn test_name_match_wins_over_serial_match() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::CurrentUser, "My", fixture("0A0B", &[0x01]));
    provider.insert(StoreScope::CurrentUser, "My", fixture("Serial Holder", &[0x0A, 0x0B]));

    let reporter = RecordingReporter::new();
    CertificateRemover::new(provider.clone())
        .remove_certificates(
            StoreScope::CurrentUser,
            "My",
            &identifiers(&["0A0B"]),
            &reporter,
        )
        .unwrap();

    let remaining = provider.certificates(StoreScope::CurrentUser, "My");
    assert_eq!(remaining.len(), 1);
    let record = CertificateRecord::from_der(&remaining[0]).unwrap();
    assert_eq!(record.simple_name, "Serial Holder");
}

#[test]
fn test_unknown_identifier_leaves_store_unchanged() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::CurrentUser, "My", fixture("TEST1", &[0x01]));

    let reporter = RecordingReporter::new();
    let summary = CertificateRemover::new(provider.clone())
        .remove_certificates(
            StoreScope::CurrentUser,
            "My",
            &identifiers(&["UNKNOWN"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.not_found, 1);
    assert_eq!(provider.count(StoreScope::CurrentUser, "My"), 1);
    assert_eq!(
        reporter.lines(),
        vec!["Certificate with name or serial number \"UNKNOWN\" not found."]
    );
}

#[test]
fn test_unknown_serial_in_machine_root() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::LocalMachine, "Root", fixture("Machine Root", &[0x5A, 0x01]));

    let reporter = RecordingReporter::new();
    let summary = CertificateRemover::new(provider.clone())
        .remove_certificates(
            StoreScope::LocalMachine,
            "Root",
            &identifiers(&["3b6300d6d6523e8d96738b3587303438cbf94936"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.removed, 0);
    assert_eq!(summary.not_found, 1);
    assert_eq!(provider.count(StoreScope::LocalMachine, "Root"), 1);
    assert_eq!(reporter.events().len(), 1);
}

#[test]
fn test_identifiers_processed_in_order() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::CurrentUser, "TrustedPeople", fixture("TEST2", &[0x02]));

    let reporter = RecordingReporter::new();
    let summary = CertificateRemover::new(provider.clone())
        .remove_certificates(
            StoreScope::CurrentUser,
            "TrustedPeople",
            &identifiers(&["TEST2", "UNKNOWN"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.not_found, 1);

    let events = reporter.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Removed { scope: StoreScope::CurrentUser, .. }));
    assert_eq!(
        events[1],
        Event::NotFound {
            identifier: "UNKNOWN".to_string()
        }
    );
    assert_eq!(provider.open_count(), 2);
}

#[test]
fn test_store_access_failure_aborts_batch() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::LocalMachine, "Root", fixture("TEST1", &[0x01]));
    provider.deny_access(StoreScope::LocalMachine, "Root");

    let reporter = RecordingReporter::new();
    let result = CertificateRemover::new(provider.clone()).remove_certificates(
        StoreScope::LocalMachine,
        "Root",
        &identifiers(&["TEST1", "TEST2"]),
        &reporter,
    );

    assert!(matches!(result, Err(CertPurgeError::StoreAccess { .. })));
    assert!(reporter.events().is_empty());
    assert_eq!(provider.count(StoreScope::LocalMachine, "Root"), 1);
}

#[test]
fn test_dry_run_reports_without_removing() {
    let provider = MemoryStoreProvider::new();
    provider.insert(StoreScope::CurrentUser, "My", fixture("TEST1", &[0x01]));

    let reporter = RecordingReporter::new();
    let summary = CertificateRemover::new(provider.clone())
        .with_dry_run(true)
        .remove_certificates(
            StoreScope::CurrentUser,
            "My",
            &identifiers(&["TEST1"]),
            &reporter,
        )
        .unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(provider.count(StoreScope::CurrentUser, "My"), 1);
    assert!(reporter.lines()[0].contains("would be removed from store \"My\""));
}
