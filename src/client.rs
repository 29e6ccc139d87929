//! Managed window clients.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::host::ClientProvider;

/// Window handle identifying a client.
pub type WindowId = u32;

/// Managed window.
///
/// Only the window handle is used for identity, all other state is owned by
/// the window manager and only observed by actions and filters.
#[derive(Debug)]
pub struct Client {
    window: WindowId,
    state: RefCell<ClientState>,
}

impl Client {
    pub fn new(window: WindowId, state: ClientState) -> Self {
        Self { window, state: RefCell::new(state) }
    }

    /// Window handle of this client.
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Current window state.
    pub fn state(&self) -> Ref<'_, ClientState> {
        self.state.borrow()
    }

    /// Mutable window state.
    pub fn state_mut(&self) -> RefMut<'_, ClientState> {
        self.state.borrow_mut()
    }
}

/// Window manager state of a client.
#[derive(Deserialize, Serialize, Default, Clone, PartialEq, Eq, Debug)]
#[serde(default)]
pub struct ClientState {
    pub title: String,
    pub class: String,
    pub desktop: u32,
    pub urgent: bool,
    pub focused: bool,
    pub iconic: bool,

    /// Close was requested for this window.
    pub closed: bool,
}

/// Serialized client description.
#[derive(Deserialize, Serialize, Debug)]
pub struct ClientSpec {
    pub window: WindowId,
    #[serde(flatten)]
    pub state: ClientState,
}

/// All clients known to the window manager.
///
/// The list holds the only strong reference to each client, so unmanaging a
/// client drops it from every outstanding [`crate::client_set::ClientSet`].
#[derive(Debug, Default)]
pub struct ClientList {
    clients: Vec<Rc<Client>>,
}

impl ClientList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load clients from a JSON array of [`ClientSpec`]s.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let specs: Vec<ClientSpec> = serde_json::from_str(json)?;

        let mut list = Self::new();
        for spec in specs {
            list.manage(spec.window, spec.state);
        }

        Ok(list)
    }

    /// Start managing a new window.
    ///
    /// If the window is already managed, its existing client is returned.
    pub fn manage(&mut self, window: WindowId, state: ClientState) -> Rc<Client> {
        if let Some(client) = self.find(window) {
            return client;
        }

        let client = Rc::new(Client::new(window, state));
        self.clients.push(client.clone());
        client
    }

    /// Stop managing a window.
    pub fn unmanage(&mut self, window: WindowId) -> Option<Rc<Client>> {
        let index = self.clients.iter().position(|client| client.window() == window)?;
        Some(self.clients.remove(index))
    }

    /// Get a client by its window handle.
    pub fn find(&self, window: WindowId) -> Option<Rc<Client>> {
        self.clients.iter().find(|client| client.window() == window).cloned()
    }

    /// Snapshot of all client states.
    pub fn specs(&self) -> Vec<ClientSpec> {
        self.clients
            .iter()
            .map(|client| ClientSpec { window: client.window(), state: client.state().clone() })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl ClientProvider for ClientList {
    fn clients(&self) -> Vec<Rc<Client>> {
        self.clients.clone()
    }

    fn client(&self, window: WindowId) -> Option<Rc<Client>> {
        self.find(window)
    }
}
