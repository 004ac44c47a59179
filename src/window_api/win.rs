use anyhow::Result;
use tracing::{debug, instrument};
use windows::Win32::{
    Foundation::HWND,
    UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW},
};

use super::{derive_label, WindowObserver};

#[instrument]
pub fn get_active() -> Result<Option<String>> {
    let window = unsafe { GetForegroundWindow() };

    if window.is_invalid() {
        debug!("No foreground window");
        return Ok(None);
    }

    let mut text: [u16; 4096] = [0; 4096];
    let title = unsafe { get_window_title(window, &mut text) };

    Ok(derive_label(&title))
}

unsafe fn get_window_title(window_handle: HWND, text: &mut [u16]) -> String {
    let len = unsafe { GetWindowTextW(window_handle, text) };
    String::from_utf16_lossy(&text[..len.max(0) as usize])
}

pub struct WindowsWindowObserver {}

impl WindowsWindowObserver {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsWindowObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowObserver for WindowsWindowObserver {
    fn get_active(&mut self) -> Result<Option<String>> {
        get_active()
    }
}
