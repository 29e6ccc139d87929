//! Window manager collaborator interfaces.

use std::rc::Rc;

use crate::client::{Client, ClientList, WindowId};

/// Source of managed clients.
pub trait ClientProvider {
    /// All currently managed clients, in stacking order.
    fn clients(&self) -> Vec<Rc<Client>>;

    /// Map a window handle to its client.
    fn client(&self, window: WindowId) -> Option<Rc<Client>>;

    /// Client below the specified pointer position.
    fn client_at(&self, _x: i32, _y: i32) -> Option<Rc<Client>> {
        None
    }
}

/// Window manager services used while running actions.
pub trait Host: ClientProvider {
    /// Acquire an exclusive keyboard grab.
    fn grab_keyboard(&mut self) -> bool;

    /// Release the keyboard grab.
    fn ungrab_keyboard(&mut self);

    /// Current pointer position.
    fn pointer_position(&self) -> (i32, i32);
}

/// Host without any display server connection.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub clients: ClientList,
    pub pointer: (i32, i32),

    /// Deny all keyboard grabs.
    pub deny_grabs: bool,

    grabbed: bool,
}

impl HeadlessHost {
    pub fn new(clients: ClientList) -> Self {
        Self { clients, ..Default::default() }
    }

    /// Check if the keyboard is currently grabbed.
    pub fn keyboard_grabbed(&self) -> bool {
        self.grabbed
    }
}

impl ClientProvider for HeadlessHost {
    fn clients(&self) -> Vec<Rc<Client>> {
        self.clients.clients()
    }

    fn client(&self, window: WindowId) -> Option<Rc<Client>> {
        self.clients.find(window)
    }
}

impl Host for HeadlessHost {
    fn grab_keyboard(&mut self) -> bool {
        if self.deny_grabs || self.grabbed {
            return false;
        }

        self.grabbed = true;
        true
    }

    fn ungrab_keyboard(&mut self) {
        self.grabbed = false;
    }

    fn pointer_position(&self) -> (i32, i32) {
        self.pointer
    }
}
