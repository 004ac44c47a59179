use anyhow::{anyhow, Result};
use tracing::{instrument, warn};
use xcb::{
    x::{self, Atom, GetProperty, GetPropertyReply, GrabServer, InternAtom, UngrabServer, Window, ATOM_ANY},
    Connection, Xid,
};

use super::{derive_label, WindowObserver};

fn intern_atom(conn: &Connection, name: &[u8]) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name,
    }))?;
    Ok(reply.atom())
}

/// Reads a property of `window`. Protocol errors, for example a window that closed in the
/// meantime, are reported as a missing property.
fn get_property(
    conn: &Connection,
    window: Window,
    property: Atom,
    long_length: u32,
) -> Result<Option<GetPropertyReply>> {
    let cookie = conn.send_request(&GetProperty {
        delete: false,
        window,
        property,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length,
    });
    match conn.wait_for_reply(cookie) {
        Ok(reply) => Ok(Some(reply)),
        Err(xcb::Error::Protocol(e)) => {
            warn!("Failed to read window property {e:?}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn get_active_window(conn: &Connection, root: Window, active_window_atom: Atom) -> Result<Option<Window>> {
    let Some(reply) = get_property(conn, root, active_window_atom, 1)? else {
        return Ok(None);
    };
    Ok(reply
        .value::<Window>()
        .first()
        .copied()
        .filter(|window| window.resource_id() != 0))
}

fn get_name(conn: &Connection, window: Window, name_atom: Atom) -> Result<Option<String>> {
    let Some(reply) = get_property(conn, window, name_atom, 1024)? else {
        return Ok(None);
    };
    let value = reply.value::<u8>();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(value).into_owned()))
}

/// Talks to the X server directly through xcb.
pub struct LinuxWindowObserver {
    connection: Connection,
    preferred_screen: usize,
    active_window_atom: Atom,
    window_name_atom: Atom,
}

impl LinuxWindowObserver {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = intern_atom(&connection, b"_NET_ACTIVE_WINDOW")?;
        let window_name_atom = intern_atom(&connection, b"_NET_WM_NAME")?;
        Ok(Self {
            connection,
            preferred_screen: preferred_screen.max(0) as usize,
            active_window_atom,
            window_name_atom,
        })
    }

    #[instrument(skip(self))]
    fn get_active_inner(&self) -> Result<Option<String>> {
        let setup = self.connection.get_setup();

        // Currently the application only supports 1 x11 screen.
        let root = setup
            .roots()
            .nth(self.preferred_screen)
            .ok_or_else(|| anyhow!("X server has no screen {}", self.preferred_screen))?
            .root();

        let Some(active_window) =
            get_active_window(&self.connection, root, self.active_window_atom)?
        else {
            return Ok(None);
        };

        let window_name = match get_name(&self.connection, active_window, self.window_name_atom)? {
            Some(name) => Some(name),
            None => get_name(&self.connection, active_window, x::ATOM_WM_NAME)?,
        };

        Ok(window_name.as_deref().and_then(derive_label))
    }
}

impl WindowObserver for LinuxWindowObserver {
    #[instrument(skip(self))]
    fn get_active(&mut self) -> Result<Option<String>> {
        let _ = self.connection.send_request(&GrabServer {});

        let result = self.get_active_inner();
        let _ = self.connection.send_request(&UngrabServer {});
        result
    }
}
