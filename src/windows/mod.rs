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

//! Windows platform integration.
//!
//! This module provides the Win32 implementations of the crate's platform
//! traits:
//!
//! - **Certificate Store**: [`SystemStoreProvider`] opens the system stores
//!   (CurrentUser\My, LocalMachine\Root, etc.) through CryptoAPI
//! - **Desktop Automation**: [`Win32Desktop`] finds windows by title, brings
//!   them to the foreground, posts key messages and blocks user input
//!
//! On other targets the same types exist but every operation fails with a
//! platform error, so the crate still builds and its platform-independent
//! parts can be tested anywhere.
//!
//! # Security Considerations
//!
//! - Writes to LocalMachine stores require elevated (administrator) privileges
//! - `BlockInput` only succeeds in an elevated process

pub mod certstore;
pub mod desktop;

pub use certstore::{SystemStore, SystemStoreProvider};
pub use desktop::Win32Desktop;

use crate::error::CertPurgeError;

/// Check if this code is running on a Windows system.
#[inline]
pub fn is_windows() -> bool {
    cfg!(windows)
}

/// Check if the current process has administrator privileges.
///
/// Blocking user input and writing to LocalMachine stores need elevation.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use std::mem::MaybeUninit;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }

        let mut elevation = MaybeUninit::<TOKEN_ELEVATION>::uninit();
        let mut size = 0u32;

        let result = GetTokenInformation(
            token,
            TokenElevation,
            Some(elevation.as_mut_ptr() as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut size,
        );
        let _ = CloseHandle(token);

        if result.is_ok() {
            elevation.assume_init().TokenIsElevated != 0
        } else {
            false
        }
    }
}

/// Check if the current process has administrator privileges.
#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    false
}

/// Describe the calling thread's last Win32 error.
pub(crate) fn last_error_message(operation: &str) -> String {
    #[cfg(windows)]
    {
        use windows::Win32::Foundation::GetLastError;
        let code = unsafe { GetLastError() };
        format!("{}: Windows error 0x{:08X}", operation, code.0)
    }
    #[cfg(not(windows))]
    {
        format!("{}: not running on Windows", operation)
    }
}

/// Error returned by every operation on non-Windows targets.
#[cfg(not(windows))]
pub(crate) fn unsupported(operation: &str) -> CertPurgeError {
    CertPurgeError::platform(format!("{operation} requires Windows"))
}

/// Convert a `windows` crate error into a platform error.
#[cfg(windows)]
pub(crate) fn win32_error(operation: &str, error: windows::core::Error) -> CertPurgeError {
    CertPurgeError::platform(format!(
        "{}: Windows error 0x{:08X}",
        operation,
        error.code().0
    ))
}
