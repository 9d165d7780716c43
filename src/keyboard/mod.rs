//! Matrix keyboard scanning.
//!
//! Rows are excited one at a time, round-robin, each for one scan-timer
//! period. A column interrupt while a row is excited identifies the key
//! at (row, column). Press and release are both debounced; while a key is
//! held the scan stays parked on its row.
//!
//! `PRESSED_WAIT -> PRESSED` waits on the debounce timer alone: a press
//! released inside the window would otherwise never leave `PRESSED_WAIT`.
//! The key is only resolved if it is still asserted when the timer
//! expires, so a glitch reaches `PRESSED` holding the null key.
//!
//! ```text
//!                          row timeout: next row
//!                             ┌──────┐
//!                             ▼      │
//!  ┌──────────────► RELEASED_WAIT_ROW ┘
//!  │ debounce,                │ key pressed
//!  │ resume scan              ▼
//! RELEASED_WAIT          PRESSED_WAIT
//!  ▲                          │ debounce: resolve key
//!  │ key released             ▼
//!  └───────────────────── PRESSED
//! ```

pub mod layout;

pub use layout::{KeyboardLayout, STANDARD_KEYBOARD};

use crate::error::Error;
use crate::fsm::{Fsm, FsmState, Transition};
use crate::port::KeyboardPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyboardState {
    ReleasedWaitRow,
    PressedWait,
    Pressed,
    ReleasedWait,
}

impl FsmState for KeyboardState {
    fn name(&self) -> &'static str {
        match self {
            KeyboardState::ReleasedWaitRow => "KEYBOARD_RELEASED_WAIT_ROW",
            KeyboardState::PressedWait => "KEYBOARD_PRESSED_WAIT",
            KeyboardState::Pressed => "KEYBOARD_PRESSED",
            KeyboardState::ReleasedWait => "KEYBOARD_RELEASED_WAIT",
        }
    }
}

/// Data seen by the keyboard guards and actions.
pub struct KeyboardContext<P> {
    port: P,
    id: u32,
    layout: &'static KeyboardLayout,
    debounce_time_ms: u32,
    excited_row: Option<u8>,
    key_value: char,
    pressed_row: u8,
    pressed_col: u8,
    press_start_ms: u32,
    release_start_ms: u32,
}

fn key_pressed<P: KeyboardPort>(ctx: &KeyboardContext<P>) -> bool {
    ctx.excited_row.is_some() && ctx.port.read_key_pressed(ctx.id)
}

fn key_released<P: KeyboardPort>(ctx: &KeyboardContext<P>) -> bool {
    !ctx.port.read_key_pressed(ctx.id)
}

fn row_timeout<P: KeyboardPort>(ctx: &KeyboardContext<P>) -> bool {
    ctx.port.read_row_timeout(ctx.id)
}

fn press_debounced<P: KeyboardPort>(ctx: &KeyboardContext<P>) -> bool {
    ctx.port.elapsed_since(ctx.press_start_ms) >= ctx.debounce_time_ms
}

fn release_debounced<P: KeyboardPort>(ctx: &KeyboardContext<P>) -> bool {
    ctx.port.elapsed_since(ctx.release_start_ms) >= ctx.debounce_time_ms
}

fn store_press<P: KeyboardPort>(ctx: &mut KeyboardContext<P>) {
    ctx.press_start_ms = ctx.port.millis();
    // Guarded by `key_pressed`, so a row is excited.
    ctx.pressed_row = ctx.excited_row.unwrap_or(0);
    ctx.pressed_col = ctx.port.get_triggered_column(ctx.id);
}

fn next_row<P: KeyboardPort>(ctx: &mut KeyboardContext<P>) {
    let row = match ctx.excited_row {
        Some(row) if row + 1 < ctx.layout.num_rows => row + 1,
        _ => 0,
    };
    ctx.excited_row = Some(row);
    ctx.port.excite_row(ctx.id, row);
}

fn resolve_key<P: KeyboardPort>(ctx: &mut KeyboardContext<P>) {
    if !ctx.port.read_key_pressed(ctx.id) {
        return;
    }
    match ctx.layout.key(ctx.pressed_row, ctx.pressed_col) {
        Some(key) => {
            ctx.key_value = key;
            debug!(
                "keyboard {}: key {} at ({}, {})",
                ctx.id, key, ctx.pressed_row, ctx.pressed_col
            );
        }
        None => warn!(
            "keyboard {}: column {} outside the layout",
            ctx.id, ctx.pressed_col
        ),
    }
}

fn store_release<P: KeyboardPort>(ctx: &mut KeyboardContext<P>) {
    ctx.release_start_ms = ctx.port.millis();
}

fn resume_scan<P: KeyboardPort>(ctx: &mut KeyboardContext<P>) {
    if let Some(row) = ctx.excited_row {
        ctx.port.excite_row(ctx.id, row);
    }
}

const NUM_TRANSITIONS: usize = 5;

fn transitions<P: KeyboardPort>() -> [Transition<KeyboardState, KeyboardContext<P>>; NUM_TRANSITIONS]
{
    use KeyboardState::*;
    [
        // A press wins over a timeout that raced it: the row stays put.
        Transition::new(ReleasedWaitRow, key_pressed::<P>, PressedWait, Some(store_press::<P>)),
        Transition::new(ReleasedWaitRow, row_timeout::<P>, ReleasedWaitRow, Some(next_row::<P>)),
        Transition::new(PressedWait, press_debounced::<P>, Pressed, Some(resolve_key::<P>)),
        Transition::new(Pressed, key_released::<P>, ReleasedWait, Some(store_release::<P>)),
        Transition::new(ReleasedWait, release_debounced::<P>, ReleasedWaitRow, Some(resume_scan::<P>)),
    ]
}

/// Debounced matrix keyboard bound to one port id.
pub struct KeyboardFsm<P> {
    fsm: Fsm<KeyboardState, KeyboardContext<P>, NUM_TRANSITIONS>,
    ctx: KeyboardContext<P>,
}

impl<P: KeyboardPort> KeyboardFsm<P> {
    /// Fails if `layout` is inconsistent or `port` has no keyboard `id`.
    /// Scanning does not start until [`KeyboardFsm::start_scan`].
    pub fn new(
        debounce_time_ms: u32,
        id: u32,
        layout: &'static KeyboardLayout,
        port: P,
    ) -> Result<Self, Error> {
        layout.validate()?;
        port.check_keyboard(id)?;
        let fsm = Fsm::new(KeyboardState::ReleasedWaitRow, transitions::<P>())?;
        Ok(Self {
            fsm,
            ctx: KeyboardContext {
                port,
                id,
                layout,
                debounce_time_ms,
                excited_row: None,
                key_value: layout.null_key,
                pressed_row: 0,
                pressed_col: 0,
                press_start_ms: 0,
                release_start_ms: 0,
            },
        })
    }

    pub fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.ctx)
    }

    /// Excite the first row and arm the scan timer.
    pub fn start_scan(&mut self) {
        self.ctx.excited_row = Some(0);
        self.ctx.port.excite_row(self.ctx.id, 0);
        info!("keyboard {}: scan started", self.ctx.id);
    }

    /// Release every row and drop any press in progress. A resolved key
    /// that was not consumed yet is kept.
    pub fn stop_scan(&mut self) {
        self.ctx.excited_row = None;
        self.ctx.port.stop_scan(self.ctx.id);
        self.fsm.set_state(KeyboardState::ReleasedWaitRow);
        info!("keyboard {}: scan stopped", self.ctx.id);
    }

    pub fn get_state(&self) -> KeyboardState {
        self.fsm.get_state()
    }

    pub fn set_state(&mut self, state: KeyboardState) {
        self.fsm.set_state(state);
    }

    pub fn inner_fsm(&self) -> &Fsm<KeyboardState, KeyboardContext<P>, NUM_TRANSITIONS> {
        &self.fsm
    }

    /// Last resolved key, or the layout's null key.
    pub fn get_key_value(&self) -> char {
        self.ctx.key_value
    }

    pub fn reset_key_value(&mut self) {
        self.ctx.key_value = self.ctx.layout.null_key;
    }

    pub fn get_excited_row(&self) -> Option<u8> {
        self.ctx.excited_row
    }

    pub fn get_debounce_time_ms(&self) -> u32 {
        self.ctx.debounce_time_ms
    }

    pub fn layout(&self) -> &'static KeyboardLayout {
        self.ctx.layout
    }

    /// `true` while a key is being debounced or a resolved key waits to be
    /// consumed.
    pub fn check_activity(&self) -> bool {
        self.get_state() != KeyboardState::ReleasedWaitRow
            || self.ctx.key_value != self.ctx.layout.null_key
    }
}
