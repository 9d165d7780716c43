//! Push button debounce.
//!
//! ```text
//!            pressed                 debounce elapsed
//!  RELEASED ─────────► PRESSED_WAIT ─────────────────► PRESSED
//!     ▲                                                  │
//!     │ debounce elapsed                       released  │
//!     └──────────────── RELEASED_WAIT ◄──────────────────┘
//! ```
//!
//! The press duration is measured from the start of the press debounce to
//! the start of the release debounce, so bounces inside either window do
//! not shift it. It stays available until the consumer calls
//! [`ButtonFsm::reset_duration`].

use crate::error::Error;
use crate::fsm::{Fsm, FsmState, Transition};
use crate::port::ButtonPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Released,
    PressedWait,
    Pressed,
    ReleasedWait,
}

impl FsmState for ButtonState {
    fn name(&self) -> &'static str {
        match self {
            ButtonState::Released => "BUTTON_RELEASED",
            ButtonState::PressedWait => "BUTTON_PRESSED_WAIT",
            ButtonState::Pressed => "BUTTON_PRESSED",
            ButtonState::ReleasedWait => "BUTTON_RELEASED_WAIT",
        }
    }
}

/// Data seen by the button guards and actions.
pub struct ButtonContext<P> {
    port: P,
    id: u32,
    debounce_time_ms: u32,
    press_start_ms: u32,
    release_start_ms: u32,
    duration_ms: u32,
}

fn is_pressed<P: ButtonPort>(ctx: &ButtonContext<P>) -> bool {
    ctx.port.read_pressed(ctx.id)
}

fn is_released<P: ButtonPort>(ctx: &ButtonContext<P>) -> bool {
    !ctx.port.read_pressed(ctx.id)
}

fn press_debounced<P: ButtonPort>(ctx: &ButtonContext<P>) -> bool {
    ctx.port.elapsed_since(ctx.press_start_ms) >= ctx.debounce_time_ms
}

fn release_debounced<P: ButtonPort>(ctx: &ButtonContext<P>) -> bool {
    ctx.port.elapsed_since(ctx.release_start_ms) >= ctx.debounce_time_ms
}

fn store_press_start<P: ButtonPort>(ctx: &mut ButtonContext<P>) {
    ctx.press_start_ms = ctx.port.millis();
}

fn store_release_start<P: ButtonPort>(ctx: &mut ButtonContext<P>) {
    ctx.release_start_ms = ctx.port.millis();
}

fn store_duration<P: ButtonPort>(ctx: &mut ButtonContext<P>) {
    ctx.duration_ms = ctx.release_start_ms.wrapping_sub(ctx.press_start_ms);
    ctx.port.clear_pressed(ctx.id);
    debug!("button {}: pressed for {} ms", ctx.id, ctx.duration_ms);
}

const NUM_TRANSITIONS: usize = 4;

fn transitions<P: ButtonPort>() -> [Transition<ButtonState, ButtonContext<P>>; NUM_TRANSITIONS] {
    use ButtonState::*;
    [
        Transition::new(Released, is_pressed::<P>, PressedWait, Some(store_press_start::<P>)),
        Transition::new(PressedWait, press_debounced::<P>, Pressed, None),
        Transition::new(Pressed, is_released::<P>, ReleasedWait, Some(store_release_start::<P>)),
        Transition::new(ReleasedWait, release_debounced::<P>, Released, Some(store_duration::<P>)),
    ]
}

/// Debounced push button bound to one port id.
pub struct ButtonFsm<P> {
    fsm: Fsm<ButtonState, ButtonContext<P>, NUM_TRANSITIONS>,
    ctx: ButtonContext<P>,
}

impl<P: ButtonPort> ButtonFsm<P> {
    /// Fails with [`Error::UnknownDeviceId`] if `port` has no button `id`.
    pub fn new(debounce_time_ms: u32, id: u32, port: P) -> Result<Self, Error> {
        port.check_button(id)?;
        let fsm = Fsm::new(ButtonState::Released, transitions::<P>())?;
        Ok(Self {
            fsm,
            ctx: ButtonContext {
                port,
                id,
                debounce_time_ms,
                press_start_ms: 0,
                release_start_ms: 0,
                duration_ms: 0,
            },
        })
    }

    pub fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.ctx)
    }

    pub fn get_state(&self) -> ButtonState {
        self.fsm.get_state()
    }

    pub fn set_state(&mut self, state: ButtonState) {
        self.fsm.set_state(state);
    }

    pub fn inner_fsm(&self) -> &Fsm<ButtonState, ButtonContext<P>, NUM_TRANSITIONS> {
        &self.fsm
    }

    /// Duration of the last completed press in ms, 0 if none is pending.
    pub fn get_duration(&self) -> u32 {
        self.ctx.duration_ms
    }

    pub fn reset_duration(&mut self) {
        self.ctx.duration_ms = 0;
    }

    pub fn get_debounce_time_ms(&self) -> u32 {
        self.ctx.debounce_time_ms
    }

    /// `true` while a press or release is in progress.
    pub fn check_activity(&self) -> bool {
        self.get_state() != ButtonState::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::registry::{ButtonLine, MockClock, PortRegistry};

    const DEBOUNCE_MS: u32 = 150;

    fn button<'a>(
        clock: &'a MockClock,
        lines: &'a [ButtonLine],
    ) -> ButtonFsm<PortRegistry<'a, MockClock>> {
        let port = PortRegistry::new(clock).with_buttons(lines);
        ButtonFsm::new(DEBOUNCE_MS, 0, port).unwrap()
    }

    #[test]
    fn starts_released_and_idle() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        assert_eq!(btn.get_state(), ButtonState::Released);
        assert!(!btn.check_activity());
        assert!(!btn.fire());
        assert_eq!(btn.get_duration(), 0);
        assert_eq!(btn.get_debounce_time_ms(), DEBOUNCE_MS);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let port = PortRegistry::new(&clock).with_buttons(&lines);
        assert_eq!(
            ButtonFsm::new(DEBOUNCE_MS, 4, port).err(),
            Some(Error::UnknownDeviceId(4))
        );
    }

    #[test]
    fn full_press_reports_duration() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        clock.set(1_000);
        lines[0].on_edge(true);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::PressedWait);
        assert!(btn.check_activity());

        clock.advance(DEBOUNCE_MS - 1);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::PressedWait);

        clock.advance(1);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::Pressed);

        clock.set(1_700);
        lines[0].on_edge(false);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::ReleasedWait);

        clock.advance(DEBOUNCE_MS);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::Released);
        assert_eq!(btn.get_duration(), 700);
        assert!(!btn.check_activity());
    }

    #[test]
    fn duration_read_is_idempotent_until_reset() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        lines[0].on_edge(true);
        btn.fire();
        clock.advance(DEBOUNCE_MS);
        btn.fire();
        clock.advance(100);
        lines[0].on_edge(false);
        btn.fire();
        clock.advance(DEBOUNCE_MS);
        btn.fire();

        assert_eq!(btn.get_duration(), DEBOUNCE_MS + 100);
        assert_eq!(btn.get_duration(), DEBOUNCE_MS + 100);
        btn.fire();
        assert_eq!(btn.get_duration(), DEBOUNCE_MS + 100);

        btn.reset_duration();
        assert_eq!(btn.get_duration(), 0);
    }

    #[test]
    fn bounce_inside_press_window_is_ignored() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        lines[0].on_edge(true);
        btn.fire();
        // Contact chatter during the debounce window.
        clock.advance(20);
        lines[0].on_edge(false);
        btn.fire();
        clock.advance(20);
        lines[0].on_edge(true);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::PressedWait);

        clock.advance(DEBOUNCE_MS);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::Pressed);
    }

    #[test]
    fn release_clears_the_latched_edge() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        lines[0].on_edge(true);
        btn.fire();
        clock.advance(DEBOUNCE_MS);
        btn.fire();
        lines[0].on_edge(false);
        btn.fire();
        // A bounce re-latches the line while the release is debounced.
        lines[0].on_edge(true);
        clock.advance(DEBOUNCE_MS);
        btn.fire();

        assert_eq!(btn.get_state(), ButtonState::Released);
        assert!(!lines[0].is_pressed());
        assert!(!btn.fire());
    }

    #[test]
    fn debounce_survives_clock_wrap() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        clock.set(u32::MAX - 50);
        lines[0].on_edge(true);
        btn.fire();
        clock.advance(DEBOUNCE_MS);
        btn.fire();
        assert_eq!(btn.get_state(), ButtonState::Pressed);

        clock.advance(250);
        lines[0].on_edge(false);
        btn.fire();
        clock.advance(DEBOUNCE_MS);
        btn.fire();
        assert_eq!(btn.get_duration(), DEBOUNCE_MS + 250);
    }

    #[test]
    fn set_state_forces_state() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let mut btn = button(&clock, &lines);

        btn.set_state(ButtonState::Pressed);
        assert_eq!(btn.get_state(), ButtonState::Pressed);
        assert!(btn.check_activity());
    }

    #[test]
    fn every_state_has_exactly_one_exit() {
        let clock = MockClock::new();
        let lines = [ButtonLine::new()];
        let btn = button(&clock, &lines);
        let fsm = btn.inner_fsm();

        let exits = [
            (ButtonState::Released, ButtonState::PressedWait),
            (ButtonState::PressedWait, ButtonState::Pressed),
            (ButtonState::Pressed, ButtonState::ReleasedWait),
            (ButtonState::ReleasedWait, ButtonState::Released),
        ];
        for (origin, destination) in exits {
            let mut out = fsm.transitions_from(origin);
            assert_eq!(out.next().map(|t| t.destination), Some(destination));
            assert!(out.next().is_none(), "{} has extra exits", origin.name());
        }
        assert_eq!(fsm.transitions().len(), exits.len());
    }
}
