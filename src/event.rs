//! Events triggering action lists.

use std::rc::Rc;
use std::str::FromStr;

use crate::client::Client;

/// Keyboard and pointer modifier bitmask.
pub type ModifierState = u32;

pub const MOD_SHIFT: ModifierState = 1 << 0;
pub const MOD_LOCK: ModifierState = 1 << 1;
pub const MOD_CONTROL: ModifierState = 1 << 2;
pub const MOD_ALT: ModifierState = 1 << 3;
pub const MOD_SUPER: ModifierState = 1 << 6;

/// Keycode of the escape key.
pub const KEY_ESCAPE: u32 = 9;

/// User interaction which caused an action list to run.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum UserAction {
    /// Not caused by the user, like startup or a client rule.
    #[default]
    None,
    KeyboardPress,
    MousePress,
    MouseRelease,
    MouseClick,
    MouseDoubleClick,
    MouseMotion,
    MenuSelection,
}

/// Part of the screen an event happened on.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum FrameContext {
    #[default]
    None,
    Desktop,
    Root,
    Client,
    Titlebar,
    Frame,
    Handle,
    Icon,
    AllDesktops,
    Shade,
    Iconify,
    Maximize,
    Close,
    MoveResize,
    Dock,
    Menu,
}

impl FromStr for FrameContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "desktop" => Ok(Self::Desktop),
            "root" => Ok(Self::Root),
            "client" => Ok(Self::Client),
            "titlebar" => Ok(Self::Titlebar),
            "frame" => Ok(Self::Frame),
            "handle" => Ok(Self::Handle),
            "icon" => Ok(Self::Icon),
            "alldesktops" => Ok(Self::AllDesktops),
            "shade" => Ok(Self::Shade),
            "iconify" => Ok(Self::Iconify),
            "maximize" => Ok(Self::Maximize),
            "close" => Ok(Self::Close),
            "moveresize" => Ok(Self::MoveResize),
            "dock" => Ok(Self::Dock),
            "menu" => Ok(Self::Menu),
            _ => Err(format!(
                "Got {s:?}, expected one of none, desktop, root, client, titlebar, frame, \
                 handle, icon, alldesktops, shade, iconify, maximize, close, moveresize, dock, \
                 or menu"
            )),
        }
    }
}

/// Event an action list is run for.
///
/// Pointer coordinates are optional and will be filled in with the current
/// pointer position when missing.
#[derive(Default, Clone, Debug)]
pub struct Trigger {
    pub uact: UserAction,
    pub state: ModifierState,
    pub position: Option<(i32, i32)>,
    pub button: u32,
    pub context: FrameContext,
    pub client: Option<Rc<Client>>,
}

impl Trigger {
    pub fn new(uact: UserAction) -> Self {
        Self { uact, ..Default::default() }
    }
}

/// Event description shared by all actions of a single list run.
#[derive(Clone, Debug)]
pub struct ActionData {
    pub uact: UserAction,
    pub state: ModifierState,
    pub x: i32,
    pub y: i32,
    pub button: u32,
    pub context: FrameContext,

    /// Client the event was targeted at.
    pub client: Option<Rc<Client>>,

    /// Client below the pointer at the time of the event.
    pub pointer_client: Option<Rc<Client>>,
}

/// Kind of a raw input event.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InputKind {
    KeyPress,
    KeyRelease,
    ButtonPress,
    ButtonRelease,
    Motion,
}

/// Raw input event delivered to interactive actions.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct InputEvent {
    pub kind: InputKind,

    /// Keycode or pointer button.
    pub detail: u32,

    /// Modifiers held after this event was processed.
    pub state: ModifierState,
}

impl InputEvent {
    pub fn new(kind: InputKind, detail: u32, state: ModifierState) -> Self {
        Self { kind, detail, state }
    }
}

/// Interactive action response to an input event.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct InputOutcome {
    /// Keep the interactive session running.
    pub resume: bool,

    /// Event was handled and should not be processed any further.
    pub consumed: bool,
}

impl InputOutcome {
    pub fn resume(consumed: bool) -> Self {
        Self { resume: true, consumed }
    }

    pub fn stop(consumed: bool) -> Self {
        Self { resume: false, consumed }
    }
}
