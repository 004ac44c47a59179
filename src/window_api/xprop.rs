use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use super::{derive_label, WindowObserver};

/// Queries the focused window through the `xprop` utility. Works on any X11 session without
/// linking against X libraries, at the cost of spawning two processes per query.
pub struct XpropWindowObserver {
    xprop_bin: String,
}

impl XpropWindowObserver {
    pub fn new(xprop_bin: impl Into<String>) -> Self {
        Self {
            xprop_bin: xprop_bin.into(),
        }
    }

    /// Returns stdout of a successful run, `None` if xprop reported a failure.
    fn run(&self, args: &[&str]) -> Result<Option<String>> {
        let output = Command::new(&self.xprop_bin)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {}", self.xprop_bin))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "{} {args:?} exited with {}: {}",
                self.xprop_bin,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl Default for XpropWindowObserver {
    fn default() -> Self {
        Self::new("xprop")
    }
}

impl WindowObserver for XpropWindowObserver {
    #[instrument(skip(self))]
    fn get_active(&mut self) -> Result<Option<String>> {
        let Some(root) = self.run(&["-root", "_NET_ACTIVE_WINDOW"])? else {
            return Ok(None);
        };
        let Some(window_id) = parse_active_window_id(&root) else {
            debug!("No active window in {root:?}");
            return Ok(None);
        };

        let Some(window) = self.run(&["-id", window_id, "WM_NAME"])? else {
            return Ok(None);
        };
        let Some(raw_title) = parse_window_name(&window) else {
            debug!("No window name in {window:?}");
            return Ok(None);
        };

        Ok(derive_label(&raw_title))
    }
}

/// Extracts the id from output like `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007`.
fn parse_active_window_id(stdout: &str) -> Option<&str> {
    let line = stdout
        .lines()
        .find(|line| line.starts_with("_NET_ACTIVE_WINDOW"))?;
    let id = line.split_whitespace().last()?;
    let is_word = id.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_word || id == "0x0" {
        return None;
    }
    Some(id)
}

/// Extracts the title from output like `WM_NAME(UTF8_STRING) = "Title"`.
fn parse_window_name(stdout: &str) -> Option<String> {
    let line = stdout.lines().next()?;
    let rest = line.strip_prefix("WM_NAME(")?;
    let (kind, value) = rest.split_once(") = ")?;
    if kind.is_empty() || !kind.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let value = value.trim_matches('"');
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::window_api::WindowObserver;

    use super::{parse_active_window_id, parse_window_name, XpropWindowObserver};

    #[test]
    fn test_parse_active_window_id() {
        assert_eq!(
            parse_active_window_id("_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007\n"),
            Some("0x3a00007")
        );
        assert_eq!(
            parse_active_window_id("_NET_ACTIVE_WINDOW(WINDOW): window id # 0x0\n"),
            None
        );
        assert_eq!(
            parse_active_window_id("_NET_ACTIVE_WINDOW:  not found.\n"),
            None
        );
        assert_eq!(parse_active_window_id(""), None);
    }

    #[test]
    fn test_parse_window_name() {
        assert_eq!(
            parse_window_name("WM_NAME(UTF8_STRING) = \"Doc1 - MySite - Chromium\"\n").as_deref(),
            Some("Doc1 - MySite - Chromium")
        );
        assert_eq!(
            parse_window_name("WM_NAME(STRING) = \"MyEditor\"").as_deref(),
            Some("MyEditor")
        );
        assert_eq!(parse_window_name("WM_NAME:  not found.\n"), None);
        assert_eq!(parse_window_name("WM_NAME(STRING) = \"\"\n"), None);
    }

    #[test]
    fn test_missing_binary_is_an_error() -> Result<()> {
        let mut observer = XpropWindowObserver::new("/nonexistent/xprop-binary");
        assert!(observer.get_active().is_err());
        Ok(())
    }
}
