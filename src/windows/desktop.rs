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

//! Win32 desktop automation.
//!
//! Windows are located with `FindWindowW` by exact caption, keys are
//! delivered with `PostMessageW` (`WM_KEYDOWN`/`WM_KEYUP`) and input is
//! blocked with `BlockInput`, which only succeeds in an elevated process.

use crate::error::Result;
use crate::watcher::{DesktopAutomation, Key, KeyDirection, WindowHandle};

#[cfg(windows)]
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::Input::KeyboardAndMouse::{BlockInput, VK_RETURN, VK_TAB};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowW, PostMessageW, SetForegroundWindow, WM_KEYDOWN, WM_KEYUP,
};
#[cfg(windows)]
use windows::core::PCWSTR;

/// The interactive desktop of the current session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Desktop;

impl Win32Desktop {
    /// Create a desktop handle.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut _)
}

#[cfg(windows)]
impl DesktopAutomation for Win32Desktop {
    fn find_window(&self, title: &str) -> Option<WindowHandle> {
        let wide_title: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();

        match unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide_title.as_ptr())) } {
            Ok(window) if !window.is_invalid() => Some(WindowHandle(window.0 as isize)),
            _ => None,
        }
    }

    fn focus(&self, window: WindowHandle) -> Result<()> {
        if unsafe { SetForegroundWindow(hwnd(window)) }.as_bool() {
            Ok(())
        } else {
            Err(crate::CertPurgeError::automation(format!(
                "SetForegroundWindow failed for window 0x{:X}",
                window.0
            )))
        }
    }

    fn post_key(&self, window: WindowHandle, key: Key, direction: KeyDirection) -> Result<()> {
        let virtual_key = match key {
            Key::Tab => VK_TAB,
            Key::Enter => VK_RETURN,
        };
        let message = match direction {
            KeyDirection::Down => WM_KEYDOWN,
            KeyDirection::Up => WM_KEYUP,
        };

        unsafe {
            PostMessageW(
                hwnd(window),
                message,
                WPARAM(virtual_key.0 as usize),
                LPARAM(0),
            )
        }
        .map_err(|e| {
            crate::CertPurgeError::automation(format!(
                "PostMessageW failed: Windows error 0x{:08X}",
                e.code().0
            ))
        })
    }

    fn set_input_blocked(&self, blocked: bool) -> Result<()> {
        unsafe { BlockInput(BOOL::from(blocked)) }
            .map_err(|e| super::win32_error("BlockInput", e))
    }
}

#[cfg(not(windows))]
impl DesktopAutomation for Win32Desktop {
    fn find_window(&self, _title: &str) -> Option<WindowHandle> {
        None
    }

    fn focus(&self, _window: WindowHandle) -> Result<()> {
        Err(super::unsupported("Focusing a window"))
    }

    fn post_key(&self, _window: WindowHandle, _key: Key, _direction: KeyDirection) -> Result<()> {
        Err(super::unsupported("Posting key messages"))
    }

    fn set_input_blocked(&self, _blocked: bool) -> Result<()> {
        Err(super::unsupported("Blocking user input"))
    }
}
