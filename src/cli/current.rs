use anyhow::Result;

use crate::window_api::{GenericWindowObserver, WindowObserver};

const UNKNOWN_WINDOW: &str = "<unknown>";

/// Queries the focused window once and prints its label.
pub fn print_current() -> Result<()> {
    let mut observer = GenericWindowObserver::new()?;
    println!("{}", describe_current(&mut observer)?);
    Ok(())
}

fn describe_current(observer: &mut impl WindowObserver) -> Result<String> {
    Ok(observer
        .get_active()?
        .unwrap_or_else(|| UNKNOWN_WINDOW.to_string()))
}
