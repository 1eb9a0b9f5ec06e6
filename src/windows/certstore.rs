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

//! Windows system certificate stores.
//!
//! [`SystemStoreProvider`] opens named system stores (`My`, `Root`,
//! `TrustedPeople`, ...) in the CurrentUser or LocalMachine location through
//! CryptoAPI. Stores are opened with `CERT_STORE_OPEN_EXISTING_FLAG`, so a
//! misspelled store name fails instead of silently creating a new store.
//!
//! Deleting from `CurrentUser\Root` makes Windows show a security
//! confirmation dialog and blocks the deleting thread until it is answered.
//! Run a [`DialogWatcher`](crate::watcher::DialogWatcher) alongside.

use crate::error::Result;
use crate::store::{CertificateStore, StoreEntry, StoreProvider, StoreScope};

#[cfg(windows)]
use crate::error::CertPurgeError;
#[cfg(windows)]
use windows::Win32::Security::Cryptography::{
    CERT_CONTEXT, CERT_OPEN_STORE_FLAGS, CERT_QUERY_ENCODING_TYPE, CERT_STORE_OPEN_EXISTING_FLAG,
    CERT_STORE_PROV_SYSTEM_W, CERT_SYSTEM_STORE_CURRENT_USER, CERT_SYSTEM_STORE_LOCAL_MACHINE,
    CertCloseStore, CertDeleteCertificateFromStore, CertDuplicateCertificateContext,
    CertEnumCertificatesInStore, CertFreeCertificateContext, CertOpenStore, HCERTSTORE,
};

/// Opens system certificate stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStoreProvider;

impl StoreProvider for SystemStoreProvider {
    type Store = SystemStore;

    fn open(&self, scope: StoreScope, name: &str) -> Result<SystemStore> {
        SystemStore::open(scope, name)
    }
}

/// An open system certificate store.
pub struct SystemStore {
    /// The store location.
    scope: StoreScope,
    /// The store name (e.g., "My", "Root").
    name: String,
    /// The Windows store handle.
    #[cfg(windows)]
    handle: HCERTSTORE,
}

impl SystemStore {
    /// Open an existing system store.
    ///
    /// # Errors
    ///
    /// Returns [`CertPurgeError::StoreAccess`](crate::CertPurgeError::StoreAccess)
    /// if the store does not exist or access is denied, and a platform error
    /// when not running on Windows.
    pub fn open(scope: StoreScope, name: &str) -> Result<Self> {
        #[cfg(windows)]
        {
            use std::ffi::OsStr;
            use std::os::windows::ffi::OsStrExt;

            let wide_name: Vec<u16> = OsStr::new(name)
                .encode_wide()
                .chain(std::iter::once(0))
                .collect();

            let handle = unsafe {
                CertOpenStore(
                    CERT_STORE_PROV_SYSTEM_W,
                    CERT_QUERY_ENCODING_TYPE(0),
                    None,
                    CERT_OPEN_STORE_FLAGS(scope_flags(scope) | CERT_STORE_OPEN_EXISTING_FLAG.0),
                    Some(wide_name.as_ptr() as *const _),
                )
            };

            match handle {
                Ok(h) if !h.is_invalid() => Ok(Self {
                    scope,
                    name: name.to_string(),
                    handle: h,
                }),
                Ok(_) => Err(CertPurgeError::store_access(
                    scope,
                    name,
                    super::last_error_message("CertOpenStore"),
                )),
                Err(e) => Err(CertPurgeError::store_access(scope, name, open_failure(&e))),
            }
        }

        #[cfg(not(windows))]
        {
            let _ = (scope, name);
            Err(super::unsupported("Opening a system certificate store"))
        }
    }

    /// Get the store location.
    pub fn scope(&self) -> StoreScope {
        self.scope
    }

    /// Get the store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// DER encodings of every certificate currently in the store.
    #[cfg(windows)]
    fn encoded_certificates(&self) -> Vec<Vec<u8>> {
        let mut encoded = Vec::new();
        let mut context: *const CERT_CONTEXT = std::ptr::null();

        loop {
            context = unsafe { CertEnumCertificatesInStore(self.handle, Some(context)) };
            if context.is_null() {
                break;
            }
            encoded.push(unsafe { context_bytes(context) });
        }

        encoded
    }
}

impl CertificateStore for SystemStore {
    fn certificates(&self) -> Result<Vec<StoreEntry>> {
        #[cfg(windows)]
        {
            let encoded = self.encoded_certificates();
            Ok(StoreEntry::decode_all(encoded))
        }

        #[cfg(not(windows))]
        {
            Err(super::unsupported("Listing certificates"))
        }
    }

    fn remove(&mut self, entry: &StoreEntry) -> Result<()> {
        #[cfg(windows)]
        {
            let mut context: *const CERT_CONTEXT = std::ptr::null();

            loop {
                context = unsafe { CertEnumCertificatesInStore(self.handle, Some(context)) };
                if context.is_null() {
                    return Err(CertPurgeError::removal(
                        &entry.record.serial_number,
                        format!("no longer present in {}\\{}", self.scope, self.name),
                    ));
                }

                if unsafe { context_bytes(context) } == entry.der_bytes {
                    // The enumeration context is released by the next
                    // enumeration call, deletion needs its own reference.
                    let owned = unsafe { CertDuplicateCertificateContext(Some(context)) };
                    unsafe {
                        let _ = CertFreeCertificateContext(Some(context));
                    }

                    // Frees `owned` whether or not the deletion succeeds.
                    return unsafe { CertDeleteCertificateFromStore(owned) }.map_err(|e| {
                        CertPurgeError::removal(
                            &entry.record.serial_number,
                            format!("Windows error 0x{:08X}", e.code().0),
                        )
                    });
                }
            }
        }

        #[cfg(not(windows))]
        {
            let _ = entry;
            Err(super::unsupported("Removing a certificate"))
        }
    }
}

impl Drop for SystemStore {
    fn drop(&mut self) {
        #[cfg(windows)]
        {
            unsafe {
                let _ = CertCloseStore(self.handle, 0);
            }
        }
    }
}

#[cfg(windows)]
fn scope_flags(scope: StoreScope) -> u32 {
    match scope {
        StoreScope::CurrentUser => CERT_SYSTEM_STORE_CURRENT_USER,
        StoreScope::LocalMachine => CERT_SYSTEM_STORE_LOCAL_MACHINE,
    }
}

#[cfg(windows)]
fn open_failure(error: &windows::core::Error) -> String {
    const E_ACCESS_DENIED: i32 = 0x8007_0005_u32 as i32;
    const E_FILE_NOT_FOUND: i32 = 0x8007_0002_u32 as i32;

    match error.code().0 {
        E_ACCESS_DENIED => "access denied".to_string(),
        E_FILE_NOT_FOUND => "the store does not exist".to_string(),
        code => format!("Windows error 0x{:08X}", code),
    }
}

/// Copy the encoded certificate out of a context.
///
/// # Safety
///
/// `context` must be a valid, non-null certificate context.
#[cfg(windows)]
unsafe fn context_bytes(context: *const CERT_CONTEXT) -> Vec<u8> {
    unsafe {
        let ctx = &*context;
        std::slice::from_raw_parts(ctx.pbCertEncoded, ctx.cbCertEncoded as usize).to_vec()
    }
}
