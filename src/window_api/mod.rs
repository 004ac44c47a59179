//! Contains logic for finding out which window the user is focused on in different environments.
//! [GenericWindowObserver] is the main artifact of this module that abstracts the operations.
//!
//! Every variant reports a label derived from the raw window title through [derive_label], so
//! the tracker sees the same names no matter how the title was obtained.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;
#[cfg(unix)]
pub mod xprop;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;

/// Separates parts of a window title, for example 'Inbox - Mail - Chromium'.
pub const TITLE_SEPARATOR: &str = " - ";

const CHROMIUM_MARKER: &str = "Chromium";

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait WindowObserver {
    /// Returns the label of the focused window. `Ok(None)` means there is no observation right
    /// now (no focused window, or it has no name). Errors are reserved for failures of the
    /// observer itself.
    fn get_active(&mut self) -> Result<Option<String>>;
}

/// Turns a raw window title into an activity label.
///
/// The last `" - "` separated segment names the application. Titles of Chromium windows are
/// turned into a path instead: the page title in front is dropped and the remaining segments are
/// listed from the outermost, so 'Doc1 - MySite - Chromium' becomes 'Chromium/MySite'.
pub fn derive_label(raw_title: &str) -> Option<String> {
    let raw_title = raw_title.trim();
    if raw_title.is_empty() {
        return None;
    }

    let mut segments = raw_title.split(TITLE_SEPARATOR).collect::<Vec<_>>();
    let application = segments.pop()?.trim();
    if application.is_empty() {
        return None;
    }

    if !application.contains(CHROMIUM_MARKER) {
        return Some(application.to_string());
    }

    if segments.len() > 1 {
        segments.remove(0);
    }

    let path = std::iter::once(CHROMIUM_MARKER)
        .chain(segments.into_iter().rev())
        .collect::<Vec<_>>();
    Some(path.join("/"))
}

/// Serves as a cross-compatible WindowObserver implementation.
pub struct GenericWindowObserver {
    inner: Box<dyn WindowObserver>,
}

impl GenericWindowObserver {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowObserver;
                Ok(Self {
                    inner: Box::new(WindowsWindowObserver::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowObserver;
                Ok(Self {
                    inner: Box::new(LinuxWindowObserver::new()?),
                })
            }
            else if #[cfg(unix)] {
                use xprop::XpropWindowObserver;
                Ok(Self {
                    inner: Box::new(XpropWindowObserver::default()),
                })
            }
            else {
                Err(anyhow::anyhow!("No window observer is available for this platform"))
            }
        }
    }
}

impl WindowObserver for GenericWindowObserver {
    fn get_active(&mut self) -> Result<Option<String>> {
        self.inner.get_active()
    }
}
